//! The catalog of operations understood by the backend filter language.
use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use super::error::FilterError;

/// How an operation's value is rendered into and recovered from its template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationKind {
    /// A single quoted value compared against a scalar field.
    Scalar,
    /// A test for an empty string field. Takes no value.
    Blank,
    /// A single quoted value tested for membership in a list field.
    List,
    /// A quoted timestamp compared against a date-time field.
    DateTime,
    /// A test for an empty date-time field. Takes no value.
    DateTimeBlank,
    /// A key-value comparison on a property bag, with a quoted string value.
    KeyValueString,
    /// A key-value comparison on a property bag, with an unquoted numeric value.
    KeyValueNumeric,
}

impl OperationKind {
    /// Whether operations of this kind take a [`KeyValuePair`][super::KeyValuePair].
    pub fn is_key_value(self) -> bool {
        matches!(self, Self::KeyValueString | Self::KeyValueNumeric)
    }
}

/// The canonical identifier of an [`Operation`].
///
/// Identifiers are (de)serialized, parsed and displayed as their canonical name,
/// e.g. `"="` or `"KeyValueMatch"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
#[non_exhaustive]
pub enum OperationName {
    /// `=`
    Equals,
    /// `!=`
    DoesNotEqual,
    /// `startswith`
    StartsWith,
    /// `endswith`
    EndsWith,
    /// `contains`
    Contains,
    /// `notcontains`
    DoesNotContain,
    /// `isblank`
    IsBlank,
    /// `isnotblank`
    IsNotBlank,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqualTo,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqualTo,
    /// `listequals`
    ListEquals,
    /// `listnotequals`
    ListDoesNotEqual,
    /// `listcontains`
    ListContains,
    /// `listnotcontains`
    ListDoesNotContain,
    /// `DateTimeIsBlank`
    DateTimeIsBlank,
    /// `DateTimeIsNotBlank`
    DateTimeIsNotBlank,
    /// `DateTimeIsAfter`
    DateTimeIsAfter,
    /// `DateTimeIsBefore`
    DateTimeIsBefore,
    /// `KeyValueMatch`
    KeyValueMatch,
    /// `KeyValueDoesNotMatch`
    KeyValueDoesNotMatch,
    /// `KeyValueContains`
    KeyValueContains,
    /// `KeyValueDoesNotContains`
    KeyValueDoesNotContains,
    /// `KeyValueIsGreaterThan`
    KeyValueIsGreaterThan,
    /// `KeyValueIsGreaterThanOrEqual`
    KeyValueIsGreaterThanOrEqual,
    /// `KeyValueIsLessThan`
    KeyValueIsLessThan,
    /// `KeyValueIsLessThanOrEqual`
    KeyValueIsLessThanOrEqual,
    /// `KeyValueIsNumericalEqual`
    KeyValueIsNumericalEqual,
    /// `KeyValueIsNumericalNotEqual`
    KeyValueIsNumericalNotEqual,
}

impl OperationName {
    /// Every operation, in registry order.
    pub const ALL: [OperationName; 30] = [
        Self::Equals,
        Self::DoesNotEqual,
        Self::StartsWith,
        Self::EndsWith,
        Self::Contains,
        Self::DoesNotContain,
        Self::IsBlank,
        Self::IsNotBlank,
        Self::GreaterThan,
        Self::GreaterThanOrEqualTo,
        Self::LessThan,
        Self::LessThanOrEqualTo,
        Self::ListEquals,
        Self::ListDoesNotEqual,
        Self::ListContains,
        Self::ListDoesNotContain,
        Self::DateTimeIsBlank,
        Self::DateTimeIsNotBlank,
        Self::DateTimeIsAfter,
        Self::DateTimeIsBefore,
        Self::KeyValueMatch,
        Self::KeyValueDoesNotMatch,
        Self::KeyValueContains,
        Self::KeyValueDoesNotContains,
        Self::KeyValueIsGreaterThan,
        Self::KeyValueIsGreaterThanOrEqual,
        Self::KeyValueIsLessThan,
        Self::KeyValueIsLessThanOrEqual,
        Self::KeyValueIsNumericalEqual,
        Self::KeyValueIsNumericalNotEqual,
    ];

    /// The canonical name of this operation.
    pub fn as_str(self) -> &'static str {
        self.operation().name
    }

    /// The registry entry for this operation.
    pub fn operation(self) -> &'static Operation {
        &OPERATIONS[self as usize]
    }

    /// Whether this operation is a negative test.
    ///
    /// Multiple values for a negated operation must all hold, so they are joined
    /// with `&&`; multiple values for other operations are joined with `||`.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Self::DoesNotEqual
                | Self::DoesNotContain
                | Self::ListDoesNotEqual
                | Self::ListDoesNotContain
                | Self::KeyValueDoesNotMatch
                | Self::KeyValueDoesNotContains
                | Self::KeyValueIsNumericalNotEqual
        )
    }
}

impl FromStr for OperationName {
    type Err = FilterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| FilterError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter operation: its canonical name, display label and expression template.
///
/// Templates use positional placeholders: `{0}` is the data field, `{1}` the value
/// (or the key, for key-value operations) and `{2}` the key-value value.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Operation {
    id: OperationName,
    /// The canonical name.
    pub name: &'static str,
    /// A human readable label.
    pub label: &'static str,
    /// The expression template.
    pub expression_template: &'static str,
    /// Whether the visual editor should hide the value input.
    pub hide_value: bool,
    /// How values are rendered into the template.
    pub kind: OperationKind,
}

impl Operation {
    const fn new(
        id: OperationName,
        name: &'static str,
        label: &'static str,
        expression_template: &'static str,
        kind: OperationKind,
    ) -> Self {
        Self {
            id,
            name,
            label,
            expression_template,
            hide_value: matches!(kind, OperationKind::Blank | OperationKind::DateTimeBlank),
            kind,
        }
    }

    /// Look up an operation by its canonical name.
    pub fn find(name: &str) -> Option<&'static Self> {
        name.parse::<OperationName>().ok().map(OperationName::operation)
    }

    /// Every operation, in registry order.
    pub fn all() -> impl Iterator<Item = &'static Self> {
        OPERATIONS.iter()
    }

    /// The typed identifier of this operation.
    pub fn id(&self) -> OperationName {
        self.id
    }
}

use OperationKind::*;

/// Registry entries, indexed by `OperationName` discriminant.
static OPERATIONS: [Operation; 30] = [
    Operation::new(
        OperationName::Equals,
        "=",
        "Equals",
        r#"{0} = "{1}""#,
        Scalar,
    ),
    Operation::new(
        OperationName::DoesNotEqual,
        "!=",
        "Does not equal",
        r#"{0} != "{1}""#,
        Scalar,
    ),
    Operation::new(
        OperationName::StartsWith,
        "startswith",
        "Starts with",
        r#"{0}.StartsWith("{1}")"#,
        Scalar,
    ),
    Operation::new(
        OperationName::EndsWith,
        "endswith",
        "Ends with",
        r#"{0}.EndsWith("{1}")"#,
        Scalar,
    ),
    Operation::new(
        OperationName::Contains,
        "contains",
        "Contains",
        r#"{0}.Contains("{1}")"#,
        Scalar,
    ),
    Operation::new(
        OperationName::DoesNotContain,
        "notcontains",
        "Does not contain",
        r#"!({0}.Contains("{1}"))"#,
        Scalar,
    ),
    Operation::new(
        OperationName::IsBlank,
        "isblank",
        "Is blank",
        "string.IsNullOrEmpty({0})",
        Blank,
    ),
    Operation::new(
        OperationName::IsNotBlank,
        "isnotblank",
        "Is not blank",
        "!string.IsNullOrEmpty({0})",
        Blank,
    ),
    Operation::new(
        OperationName::GreaterThan,
        ">",
        "Greater than",
        r#"{0} > "{1}""#,
        Scalar,
    ),
    Operation::new(
        OperationName::GreaterThanOrEqualTo,
        ">=",
        "Greater than or equal to",
        r#"{0} >= "{1}""#,
        Scalar,
    ),
    Operation::new(
        OperationName::LessThan,
        "<",
        "Less than",
        r#"{0} < "{1}""#,
        Scalar,
    ),
    Operation::new(
        OperationName::LessThanOrEqualTo,
        "<=",
        "Less than or equal to",
        r#"{0} <= "{1}""#,
        Scalar,
    ),
    Operation::new(
        OperationName::ListEquals,
        "listequals",
        "Equals",
        r#"{0}.Contains("{1}")"#,
        List,
    ),
    Operation::new(
        OperationName::ListDoesNotEqual,
        "listnotequals",
        "Does not equal",
        r#"!({0}.Contains("{1}"))"#,
        List,
    ),
    Operation::new(
        OperationName::ListContains,
        "listcontains",
        "Contains",
        r#"{0}.Any(it.Contains("{1}"))"#,
        List,
    ),
    Operation::new(
        OperationName::ListDoesNotContain,
        "listnotcontains",
        "Does not contain",
        r#"!({0}.Any(it.Contains("{1}")))"#,
        List,
    ),
    Operation::new(
        OperationName::DateTimeIsBlank,
        "DateTimeIsBlank",
        "Is blank",
        r#"{0} == null || {0} == """#,
        DateTimeBlank,
    ),
    Operation::new(
        OperationName::DateTimeIsNotBlank,
        "DateTimeIsNotBlank",
        "Is not blank",
        r#"{0} != null && {0} != """#,
        DateTimeBlank,
    ),
    Operation::new(
        OperationName::DateTimeIsAfter,
        "DateTimeIsAfter",
        "Is after",
        r#"{0} > "{1}""#,
        DateTime,
    ),
    Operation::new(
        OperationName::DateTimeIsBefore,
        "DateTimeIsBefore",
        "Is before",
        r#"{0} < "{1}""#,
        DateTime,
    ),
    Operation::new(
        OperationName::KeyValueMatch,
        "KeyValueMatch",
        "matches",
        r#"{0}["{1}"] = "{2}""#,
        KeyValueString,
    ),
    Operation::new(
        OperationName::KeyValueDoesNotMatch,
        "KeyValueDoesNotMatch",
        "does not match",
        r#"{0}["{1}"] != "{2}""#,
        KeyValueString,
    ),
    Operation::new(
        OperationName::KeyValueContains,
        "KeyValueContains",
        "contains",
        r#"{0}["{1}"].Contains("{2}")"#,
        KeyValueString,
    ),
    Operation::new(
        OperationName::KeyValueDoesNotContains,
        "KeyValueDoesNotContains",
        "does not contain",
        r#"!({0}["{1}"].Contains("{2}"))"#,
        KeyValueString,
    ),
    Operation::new(
        OperationName::KeyValueIsGreaterThan,
        "KeyValueIsGreaterThan",
        "is greater than",
        r#"SafeConvert.ToDecimal({0}["{1}"]) > {2}"#,
        KeyValueNumeric,
    ),
    Operation::new(
        OperationName::KeyValueIsGreaterThanOrEqual,
        "KeyValueIsGreaterThanOrEqual",
        "is greater than or equal to",
        r#"SafeConvert.ToDecimal({0}["{1}"]) >= {2}"#,
        KeyValueNumeric,
    ),
    Operation::new(
        OperationName::KeyValueIsLessThan,
        "KeyValueIsLessThan",
        "is less than",
        r#"SafeConvert.ToDecimal({0}["{1}"]) < {2}"#,
        KeyValueNumeric,
    ),
    Operation::new(
        OperationName::KeyValueIsLessThanOrEqual,
        "KeyValueIsLessThanOrEqual",
        "is less than or equal to",
        r#"SafeConvert.ToDecimal({0}["{1}"]) <= {2}"#,
        KeyValueNumeric,
    ),
    Operation::new(
        OperationName::KeyValueIsNumericalEqual,
        "KeyValueIsNumericalEqual",
        "equals",
        r#"SafeConvert.ToDecimal({0}["{1}"]) = {2}"#,
        KeyValueNumeric,
    ),
    Operation::new(
        OperationName::KeyValueIsNumericalNotEqual,
        "KeyValueIsNumericalNotEqual",
        "does not equal",
        r#"SafeConvert.ToDecimal({0}["{1}"]) != {2}"#,
        KeyValueNumeric,
    ),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn registry_is_indexed_by_discriminant() {
        for (index, name) in OperationName::ALL.into_iter().enumerate() {
            assert_eq!(name as usize, index);
            assert_eq!(name.operation().id(), name);
        }
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = Operation::all().map(|op| op.name).collect();
        assert_eq!(names.len(), OperationName::ALL.len());
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("KeyValueMatch".parse::<OperationName>().unwrap(), OperationName::KeyValueMatch);
        assert_eq!(">=".parse::<OperationName>().unwrap(), OperationName::GreaterThanOrEqualTo);
        assert_eq!(OperationName::DoesNotContain.to_string(), "notcontains");
        assert!(matches!(
            "bogus-op".parse::<OperationName>(),
            Err(FilterError::UnknownOperation(s)) if s == "bogus-op"
        ));
    }

    #[test]
    fn serde_uses_canonical_name() {
        let json = serde_json::to_string(&OperationName::DateTimeIsBlank).unwrap();
        assert_eq!(json, r#""DateTimeIsBlank""#);
        let name: OperationName = serde_json::from_str(r#""listcontains""#).unwrap();
        assert_eq!(name, OperationName::ListContains);
    }

    #[test]
    fn blank_operations_hide_value() {
        let hidden: Vec<_> = Operation::all()
            .filter(|op| op.hide_value)
            .map(|op| op.name)
            .collect();
        assert_eq!(
            hidden,
            vec!["isblank", "isnotblank", "DateTimeIsBlank", "DateTimeIsNotBlank"]
        );
    }

    #[test]
    fn find_unknown_operation() {
        assert!(Operation::find("bogus-op").is_none());
        assert_eq!(Operation::find("=").map(|op| op.label), Some("Equals"));
    }
}
