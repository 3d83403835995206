use std::fmt;

use serde::{Deserialize, Serialize};

/// The value side of a key-value filter: either free text or a number.
///
/// Text that parses as a finite number is normalized to [`KeyValue::Number`]
/// by [`normalize_numeric_value`]; blank text stays a string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// A numeric value.
    Number(f64),
    /// A textual value.
    String(String),
}

impl KeyValue {
    /// Return the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(_) => None,
        }
    }
}

impl Default for KeyValue {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for KeyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for KeyValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

/// Convert textual values which hold a finite number into [`KeyValue::Number`].
///
/// Numbers are returned unchanged, so applying this twice gives the same result
/// as applying it once.
///
/// ```
/// use grafana_query_sdk::filter::{normalize_numeric_value, KeyValue};
///
/// assert_eq!(normalize_numeric_value(" 42 ".into()), KeyValue::Number(42.0));
/// assert_eq!(normalize_numeric_value("NaN".into()), KeyValue::from("NaN"));
/// assert_eq!(normalize_numeric_value("".into()), KeyValue::from(""));
/// ```
pub fn normalize_numeric_value(value: KeyValue) -> KeyValue {
    match value {
        KeyValue::String(s) => match parse_finite(&s) {
            Some(n) => KeyValue::Number(n),
            None => KeyValue::String(s),
        },
        number => number,
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A filter on one entry of a property-bag field, e.g. `properties["env"] = "prod"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    /// The property name.
    pub key: String,
    /// The property value.
    pub value: KeyValue,
}

impl KeyValuePair {
    /// Create a new pair.
    pub fn new(key: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Return this pair with its value passed through [`normalize_numeric_value`].
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            key: self.key,
            value: normalize_numeric_value(self.value),
        }
    }
}

/// The value of a single filter condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Several values; rendered as one clause per value.
    List(Vec<String>),
    /// A key/value pair, used by the key-value operations.
    KeyValue(KeyValuePair),
    /// A single value. The empty string stands for "no value".
    Text(String),
}

impl FilterValue {
    /// The empty value.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Whether this value carries nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(values) => values.is_empty(),
            Self::KeyValue(pair) => pair.key.is_empty() && pair.value == KeyValue::default(),
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<KeyValuePair> for FilterValue {
    fn from(pair: KeyValuePair) -> Self {
        Self::KeyValue(pair)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// The field and value recovered from an expression by the reader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadResult {
    /// The data field the expression applies to.
    pub field_name: String,
    /// The value the expression was built from.
    pub value: FilterValue,
}

impl ReadResult {
    pub(crate) fn new(field_name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
        }
    }

    pub(crate) fn empty(field_name: impl Into<String>) -> Self {
        Self::new(field_name, FilterValue::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["12", "-0.5", " 7 ", "1e3", "abc", "", "  ", "inf", "NaN", "$threshold"] {
            let once = normalize_numeric_value(raw.into());
            let twice = normalize_numeric_value(once.clone());
            assert_eq!(once, twice, "normalizing {raw:?}");
        }
    }

    #[test]
    fn infinite_values_stay_strings() {
        assert_eq!(normalize_numeric_value("1e400".into()), KeyValue::from("1e400"));
        assert_eq!(normalize_numeric_value("-inf".into()), KeyValue::from("-inf"));
    }

    #[test]
    fn numbers_display_without_trailing_zeroes() {
        assert_eq!(KeyValue::Number(123.0).to_string(), "123");
        assert_eq!(KeyValue::Number(1.5).to_string(), "1.5");
    }

    #[test]
    fn filter_value_deserializes_untagged() {
        let text: FilterValue = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(text, FilterValue::from("abc"));
        let list: FilterValue = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(list, FilterValue::List(vec!["a".into(), "b".into()]));
        let pair: FilterValue = serde_json::from_str(r#"{"key": "k", "value": 3}"#).unwrap();
        assert_eq!(pair, FilterValue::KeyValue(KeyValuePair::new("k", 3.0)));
    }
}
