//! Recover the field and value an expression was built from.
//!
//! The reader receives a single clause along with the tokens captured when the
//! clause was matched: `bindings[0]` is the data field, and `bindings[1]` and
//! `bindings[2]` are the raw texts substituted for `{1}` and `{2}`. Malformed
//! input yields a result with an empty value; reading never fails.
use std::sync::LazyLock;

use regex::Regex;

use super::{
    normalize_numeric_value,
    template::{unescape, QUOTED_CONTENT},
    FilterValue, KeyValue, KeyValuePair, Lookups, OperationKind, OperationName, ReadResult,
};

static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("\"{QUOTED_CONTENT}\"")).expect("valid regex"));

fn binding<B: AsRef<str>>(bindings: &[B], index: usize) -> Option<&str> {
    bindings.get(index).map(AsRef::as_ref)
}

fn field<B: AsRef<str>>(bindings: &[B]) -> &str {
    binding(bindings, 0).unwrap_or_default()
}

fn quoted_literals(expression: &str) -> impl Iterator<Item = String> + '_ {
    QUOTED_LITERAL
        .captures_iter(expression)
        .map(|caps| unescape(&caps[1]))
}

/// Read `expression`, built with `operation`, back into its field and value.
///
/// ```
/// use grafana_query_sdk::filter::{read, FilterValue, Lookups};
///
/// let result = read("startswith", r#"name.StartsWith("ab")"#, &["name", "ab"], &Lookups::new());
/// assert_eq!(result.field_name, "name");
/// assert_eq!(result.value, FilterValue::from("ab"));
///
/// let unknown = read("bogus-op", "whatever", &["name"], &Lookups::new());
/// assert_eq!(unknown.field_name, "name");
/// assert!(unknown.value.is_empty());
/// ```
pub fn read<B: AsRef<str>>(operation: &str, expression: &str, bindings: &[B], lookups: &Lookups) -> ReadResult {
    match operation.parse::<OperationName>() {
        Ok(operation) => read_operation(operation, expression, bindings, lookups),
        Err(_) => ReadResult::empty(field(bindings)),
    }
}

/// Read an expression built with a known operation.
pub fn read_operation<B: AsRef<str>>(
    operation: OperationName,
    expression: &str,
    bindings: &[B],
    lookups: &Lookups,
) -> ReadResult {
    match operation.operation().kind {
        OperationKind::Scalar | OperationKind::List => expression_reader_callback(bindings, lookups),
        OperationKind::Blank | OperationKind::DateTime | OperationKind::DateTimeBlank => {
            date_time_expression_reader_callback(expression, bindings)
        }
        OperationKind::KeyValueString => string_key_value_expression_reader_callback(expression, bindings),
        OperationKind::KeyValueNumeric => numeric_key_value_expression_reader_callback(expression, bindings),
    }
}

/// Read a scalar or list clause from its bindings, mapping lookup values back to labels.
pub fn expression_reader_callback<B: AsRef<str>>(bindings: &[B], lookups: &Lookups) -> ReadResult {
    let field_name = field(bindings);
    let value = binding(bindings, 1).map(unescape).unwrap_or_default();
    let value = match lookups.label_for_value(field_name, &value) {
        Some(label) => label.to_string(),
        None => value,
    };
    ReadResult::new(field_name, value)
}

/// Read a date-time clause: the value is the first quoted literal, if any.
pub fn date_time_expression_reader_callback<B: AsRef<str>>(expression: &str, bindings: &[B]) -> ReadResult {
    let value = quoted_literals(expression).next().unwrap_or_default();
    ReadResult::new(field(bindings), value)
}

/// Read a string key-value clause: the key and value are the first two quoted literals.
///
/// ```
/// use grafana_query_sdk::filter::{string_key_value_expression_reader_callback, FilterValue, KeyValuePair};
///
/// let result = string_key_value_expression_reader_callback(r#""k" : "v""#, &["field"]);
/// assert_eq!(result.field_name, "field");
/// assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new("k", "v")));
/// ```
pub fn string_key_value_expression_reader_callback<B: AsRef<str>>(expression: &str, bindings: &[B]) -> ReadResult {
    let mut literals = quoted_literals(expression);
    let pair = match (literals.next(), literals.next()) {
        (Some(key), Some(value)) => KeyValuePair::new(key, value),
        _ => KeyValuePair::new("", ""),
    };
    ReadResult::new(field(bindings), pair)
}

/// Read a numeric key-value clause from its bindings `[field, key, value]`.
///
/// The value is converted to a number when it holds one.
pub fn numeric_key_value_expression_reader_callback<B: AsRef<str>>(_expression: &str, bindings: &[B]) -> ReadResult {
    let key = binding(bindings, 1).map(unescape).unwrap_or_default();
    let raw = binding(bindings, 2).unwrap_or_default();
    let pair = KeyValuePair {
        key,
        value: normalize_numeric_value(KeyValue::from(raw)),
    };
    ReadResult::new(field(bindings), FilterValue::KeyValue(pair))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::filter::LookupOption;

    #[test]
    fn numeric_key_value_reads_number() {
        let result = numeric_key_value_expression_reader_callback("", &["dataField", "testKey", "123"]);
        assert_eq!(result.field_name, "dataField");
        assert_eq!(
            result.value,
            FilterValue::KeyValue(KeyValuePair::new("testKey", 123.0))
        );
    }

    #[test]
    fn numeric_key_value_keeps_variables() {
        let result = numeric_key_value_expression_reader_callback("", &["p", "k", "$limit"]);
        assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new("k", "$limit")));
    }

    #[test]
    fn string_key_value_needs_two_literals() {
        let result = string_key_value_expression_reader_callback(r#""only""#, &["field"]);
        assert_eq!(result.field_name, "field");
        assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new("", "")));
    }

    #[test]
    fn string_key_value_unescapes() {
        let result =
            string_key_value_expression_reader_callback(r#"p["a\"b"] = "c\\d""#, &["p"]);
        assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new(r#"a"b"#, r"c\d")));
    }

    #[test]
    fn date_time_without_literal_is_empty() {
        let result = date_time_expression_reader_callback(r#"updatedAt == null || updatedAt == """#, &["updatedAt"]);
        assert_eq!(result, ReadResult::new("updatedAt", ""));
        let none = date_time_expression_reader_callback("garbage", &["updatedAt"]);
        assert_eq!(none, ReadResult::new("updatedAt", ""));
    }

    #[test]
    fn scalar_maps_values_to_labels() {
        let mut lookups = Lookups::new();
        lookups.insert("workspace", vec![LookupOption::new("Default", "ws-1")]);
        let result = expression_reader_callback(&["workspace", "ws-1"], &lookups);
        assert_eq!(result, ReadResult::new("workspace", "Default"));
    }

    #[test]
    fn missing_bindings_are_well_formed() {
        let empty: [&str; 0] = [];
        assert_eq!(read("=", "", &empty, &Lookups::new()), ReadResult::new("", ""));
        assert_eq!(
            read("KeyValueIsLessThan", "", &["p"], &Lookups::new()),
            ReadResult::new("p", KeyValuePair::new("", ""))
        );
    }
}
