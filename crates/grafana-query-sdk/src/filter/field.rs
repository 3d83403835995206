//! Filterable field configuration.
//!
//! A data source describes each field its query editor can filter on with a
//! [`FieldDescriptor`]. Descriptors are usually generated from an enum with
//! `#[derive(QueryFields)]`, then enriched at runtime with lookup options fetched
//! from the backend (workspaces, users, ...).
use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::OperationName;

/// The type of the values held by a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DataType {
    /// Text.
    #[default]
    String,
    /// Numbers.
    Number,
    /// Timestamps.
    DateTime,
    /// A property bag, filtered with the key-value operations.
    Object,
}

/// One selectable value for a field: a human label and the raw token sent to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    /// The label shown to users.
    pub label: String,
    /// The value written into filter expressions.
    pub value: String,
}

impl LookupOption {
    /// Create a new option.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The selectable values for a field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    /// The options, unique by value.
    pub options: Vec<LookupOption>,
    /// Whether only the listed options may be used.
    pub readonly: bool,
}

impl Lookup {
    /// Create a lookup. Options with a duplicate value are dropped, keeping the first.
    pub fn new(options: impl IntoIterator<Item = LookupOption>, readonly: bool) -> Self {
        Self {
            options: options.into_iter().unique_by(|o| o.value.clone()).collect(),
            readonly,
        }
    }

    /// Append options, ignoring any whose value is already present.
    pub fn merge(&mut self, options: impl IntoIterator<Item = LookupOption>) {
        let merged = std::mem::take(&mut self.options)
            .into_iter()
            .chain(options)
            .unique_by(|o| o.value.clone())
            .collect();
        self.options = merged;
    }
}

/// Describes a field that can appear in a filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// The backend name of the field, substituted for `{0}`.
    pub data_field: String,
    /// The label shown to users.
    pub label: String,
    /// The type of the field's values.
    pub data_type: DataType,
    /// The operations the field accepts, in display order.
    pub supported_operations: Vec<OperationName>,
    /// Selectable values, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Lookup>,
}

impl FieldDescriptor {
    /// Create a descriptor which supports no operations.
    pub fn new(data_field: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self {
            data_field: data_field.into(),
            label: label.into(),
            data_type,
            supported_operations: Vec::new(),
            lookup: None,
        }
    }

    /// Set the supported operations. Duplicates are dropped, keeping the first.
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = OperationName>) -> Self {
        self.supported_operations = operations.into_iter().unique().collect();
        self
    }

    /// Set the lookup.
    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Whether this field accepts `operation`.
    pub fn supports(&self, operation: OperationName) -> bool {
        self.supported_operations.contains(&operation)
    }

    /// Merge runtime options into this field's lookup, creating it if needed.
    pub fn merge_lookup_options(&mut self, options: impl IntoIterator<Item = LookupOption>) {
        self.lookup.get_or_insert_with(Lookup::default).merge(options);
    }
}

/// Lookup options by data field, used to translate between labels and raw values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lookups(HashMap<String, Vec<LookupOption>>);

impl Lookups {
    /// No lookups: every value is used verbatim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the lookup options of every field that has some.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a FieldDescriptor>) -> Self {
        Self(
            fields
                .into_iter()
                .filter_map(|f| {
                    f.lookup
                        .as_ref()
                        .map(|l| (f.data_field.clone(), l.options.clone()))
                })
                .collect(),
        )
    }

    /// Set the options for a data field.
    pub fn insert(&mut self, data_field: impl Into<String>, options: Vec<LookupOption>) {
        self.0.insert(data_field.into(), options);
    }

    /// The raw value for a label of `data_field`, if one is configured.
    pub fn value_for_label(&self, data_field: &str, label: &str) -> Option<&str> {
        self.0
            .get(data_field)?
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.value.as_str())
    }

    /// The label for a raw value of `data_field`, if one is configured.
    pub fn label_for_value(&self, data_field: &str, value: &str) -> Option<&str> {
        self.0
            .get(data_field)?
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

/// A static set of filterable fields.
///
/// Usually implemented with `#[derive(QueryFields)]` on a unit-only enum, one
/// variant per field.
pub trait QueryFields {
    /// Describe every field.
    fn descriptors() -> Vec<FieldDescriptor>;

    /// The backend name of this field.
    fn data_field(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lookup_dedups_by_value() {
        let mut lookup = Lookup::new(
            [LookupOption::new("Default", "1"), LookupOption::new("Dup", "1")],
            false,
        );
        lookup.merge([LookupOption::new("Lab", "2"), LookupOption::new("Again", "1")]);
        assert_eq!(
            lookup.options,
            vec![LookupOption::new("Default", "1"), LookupOption::new("Lab", "2")]
        );
    }

    #[test]
    fn operations_keep_first_occurrence() {
        let field = FieldDescriptor::new("partNumber", "Part number", DataType::String).with_operations([
            OperationName::Equals,
            OperationName::Contains,
            OperationName::Equals,
        ]);
        assert_eq!(
            field.supported_operations,
            vec![OperationName::Equals, OperationName::Contains]
        );
        assert!(field.supports(OperationName::Contains));
        assert!(!field.supports(OperationName::IsBlank));
    }

    #[test]
    fn lookups_translate_both_ways() {
        let mut field = FieldDescriptor::new("workspace", "Workspace", DataType::String);
        field.merge_lookup_options([LookupOption::new("Default", "ws-1")]);
        let lookups = Lookups::from_fields([&field]);
        assert_eq!(lookups.value_for_label("workspace", "Default"), Some("ws-1"));
        assert_eq!(lookups.label_for_value("workspace", "ws-1"), Some("Default"));
        assert_eq!(lookups.value_for_label("workspace", "Other"), None);
        assert_eq!(lookups.value_for_label("name", "Default"), None);
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let field = FieldDescriptor::new("updatedAt", "Updated", DataType::DateTime)
            .with_operations([OperationName::DateTimeIsAfter]);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "dataField": "updatedAt",
                "label": "Updated",
                "dataType": "datetime",
                "supportedOperations": ["DateTimeIsAfter"],
            })
        );
    }
}
