//! Build filter expressions from a field, an operation and a value.
//!
//! Building never fails: an unknown operation, or a value of the wrong shape for
//! the operation, produces an empty expression so that a half-filled editor row
//! simply contributes nothing to the filter.
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    normalize_numeric_value,
    template::{escape, render},
    FilterValue, KeyValue, KeyValuePair, Lookups, OperationKind, OperationName,
};

/// Build the expression for `data_field` `operation` `value`.
///
/// Returns the empty string if `operation` is not a known operation name.
///
/// ```
/// use grafana_query_sdk::filter::{build, FilterValue, Lookups};
///
/// let lookups = Lookups::new();
/// assert_eq!(build("partNumber", "=", &"A-1".into(), &lookups), r#"partNumber = "A-1""#);
/// assert_eq!(
///     build("partNumber", "!=", &FilterValue::List(vec!["A".into(), "B".into()]), &lookups),
///     r#"(partNumber != "A" && partNumber != "B")"#,
/// );
/// assert_eq!(build("partNumber", "bogus-op", &"A-1".into(), &lookups), "");
/// ```
pub fn build(data_field: &str, operation: &str, value: &FilterValue, lookups: &Lookups) -> String {
    match operation.parse::<OperationName>() {
        Ok(operation) => build_operation(data_field, operation, value, lookups),
        Err(_) => String::new(),
    }
}

/// Build the expression for a known operation.
pub fn build_operation(
    data_field: &str,
    operation: OperationName,
    value: &FilterValue,
    lookups: &Lookups,
) -> String {
    let op = operation.operation();
    let template = op.expression_template;
    match op.kind {
        OperationKind::Blank | OperationKind::DateTimeBlank => render(template, &[data_field]),
        OperationKind::KeyValueString | OperationKind::KeyValueNumeric => match value {
            FilterValue::KeyValue(pair) => render_key_value(data_field, op.kind, template, pair),
            _ => String::new(),
        },
        OperationKind::Scalar | OperationKind::List | OperationKind::DateTime => {
            let values = match value {
                FilterValue::Text(text) => expand_multi_value(text),
                FilterValue::List(values) if !values.is_empty() => {
                    values.iter().map(String::as_str).collect()
                }
                _ => return String::new(),
            };
            let clauses: Vec<String> = values
                .into_iter()
                .map(|v| {
                    let resolved = lookups.value_for_label(data_field, v).unwrap_or(v);
                    render(template, &[data_field, &escape(resolved)])
                })
                .collect();
            if clauses.len() == 1 {
                clauses.into_iter().next().unwrap_or_default()
            } else {
                let separator = if operation.is_negated() { " && " } else { " || " };
                format!("({})", clauses.join(separator))
            }
        }
    }
}

/// A bare dashboard variable reference such as `$threshold` or `${threshold}`.
static TEMPLATE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{?[\w.:]+\}?$").expect("valid regex"));

/// Render a key-value clause.
///
/// Numeric operations accept only numbers and dashboard variable references,
/// inserted unquoted. Anything else builds nothing.
fn render_key_value(data_field: &str, kind: OperationKind, template: &str, pair: &KeyValuePair) -> String {
    let value = if kind == OperationKind::KeyValueNumeric {
        match normalize_numeric_value(pair.value.clone()) {
            KeyValue::Number(n) => n.to_string(),
            KeyValue::String(text) if TEMPLATE_VARIABLE.is_match(&text) => text,
            KeyValue::String(_) => return String::new(),
        }
    } else {
        escape(&pair.value.to_string())
    };
    render(template, &[data_field, &escape(&pair.key), &value])
}

/// Split a Grafana multi-value variable expansion such as `{a,b,c}`.
fn expand_multi_value(text: &str) -> Vec<&str> {
    match text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        Some(inner) if inner.contains(',') => inner.split(',').collect(),
        _ => vec![text],
    }
}

/// Build a scalar, list or date-time expression from a single textual value.
pub fn expression_builder_callback(data_field: &str, operation: &str, value: &str, lookups: &Lookups) -> String {
    build(data_field, operation, &FilterValue::from(value), lookups)
}

/// Build a date-time expression. Blank tests ignore `value`.
///
/// ```
/// use grafana_query_sdk::filter::date_time_expression_builder_callback;
///
/// assert_eq!(
///     date_time_expression_builder_callback("testField", "DateTimeIsBlank", None),
///     r#"testField == null || testField == """#,
/// );
/// ```
pub fn date_time_expression_builder_callback(data_field: &str, operation: &str, value: Option<&str>) -> String {
    build(
        data_field,
        operation,
        &FilterValue::from(value.unwrap_or_default()),
        &Lookups::new(),
    )
}

/// Build a key-value expression.
pub fn key_value_expression_builder_callback(data_field: &str, operation: &str, pair: &KeyValuePair) -> String {
    build(data_field, operation, &FilterValue::KeyValue(pair.clone()), &Lookups::new())
}

/// A membership filter whose values are sent as request substitutions.
///
/// The filter takes the form `new[] {@0, @1}.Contains(field)`, with `@n`
/// referring to `substitutions[n]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterizedFilter {
    /// The filter expression.
    pub filter: String,
    /// The values referenced by the expression.
    pub substitutions: Vec<String>,
}

static PARAMETERIZED_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^new\[\]\s*\{([^}]*)\}\.Contains\(([\w.]+)\)$").expect("valid regex")
});

impl ParameterizedFilter {
    /// Recover the field and values from [`filter`][Self::filter].
    ///
    /// Returns `None` if the filter is not of the expected form or refers to a
    /// substitution that does not exist.
    pub fn read(&self) -> Option<(String, Vec<String>)> {
        let caps = PARAMETERIZED_IN.captures(self.filter.trim())?;
        let values = caps[1]
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                let index: usize = p.strip_prefix('@')?.parse().ok()?;
                self.substitutions.get(index).cloned()
            })
            .collect::<Option<Vec<_>>>()?;
        Some((caps[2].to_string(), values))
    }
}

/// Build a `new[] {@0, @1}.Contains(field)` filter for `values`.
///
/// No values produces an empty filter.
pub fn build_parameterized_in<I, S>(data_field: &str, values: I) -> ParameterizedFilter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let substitutions: Vec<String> = values.into_iter().map(Into::into).collect();
    if substitutions.is_empty() {
        return ParameterizedFilter::default();
    }
    let params = (0..substitutions.len()).map(|i| format!("@{i}")).join(", ");
    ParameterizedFilter {
        filter: format!("new[] {{{params}}}.Contains({data_field})"),
        substitutions,
    }
}
