//! Editor-facing helpers for key-value filters.
//!
//! A key-value condition is edited with two text inputs, one for the key and one
//! for the value, and displayed as `key : value`.
use serde::{Deserialize, Serialize};

use super::{KeyValue, KeyValuePair};

/// The contents of the key and value inputs of a key-value editor.
///
/// `None` means the input is absent, which is treated the same as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorInputs {
    /// The key input.
    pub key: Option<String>,
    /// The value input.
    pub value: Option<String>,
}

/// Seed editor inputs from the current pair, if any.
pub fn editor_template(pair: Option<&KeyValuePair>) -> EditorInputs {
    match pair {
        Some(pair) => EditorInputs {
            key: Some(pair.key.clone()),
            value: Some(pair.value.to_string()),
        },
        None => EditorInputs::default(),
    }
}

/// Read a pair from the editor inputs.
///
/// With `numeric`, a value that holds a number is stored as one.
///
/// ```
/// use grafana_query_sdk::filter::{editor_value, EditorInputs, KeyValue};
///
/// let inputs = EditorInputs { key: Some("volts".into()), value: Some("4.5".into()) };
/// assert_eq!(editor_value(&inputs, true).value, KeyValue::Number(4.5));
/// assert_eq!(editor_value(&inputs, false).value, KeyValue::from("4.5"));
/// ```
pub fn editor_value(inputs: &EditorInputs, numeric: bool) -> KeyValuePair {
    let pair = KeyValuePair {
        key: inputs.key.clone().unwrap_or_default(),
        value: KeyValue::String(inputs.value.clone().unwrap_or_default()),
    };
    if numeric {
        pair.normalized()
    } else {
        pair
    }
}

/// Render a pair for display as `key : value`.
///
/// Without a pair the editor inputs are rendered instead; with neither, the
/// result is `" : "`.
pub fn value_template(pair: Option<&KeyValuePair>, inputs: Option<&EditorInputs>) -> String {
    match (pair, inputs) {
        (Some(pair), _) => format!("{} : {}", pair.key, pair.value),
        (None, Some(inputs)) => format!(
            "{} : {}",
            inputs.key.as_deref().unwrap_or_default(),
            inputs.value.as_deref().unwrap_or_default()
        ),
        (None, None) => " : ".to_string(),
    }
}
