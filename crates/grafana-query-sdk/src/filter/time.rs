use chrono::{DateTime, SecondsFormat, Utc};

use super::{build_operation, FilterValue, Lookups, OperationName};

/// Format a timestamp the way the backend expects it in date-time filters.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Restrict `data_field` to the open interval between `from` and `to`.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use grafana_query_sdk::filter::time_range_filter;
///
/// let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let to = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
/// assert_eq!(
///     time_range_filter("updatedAt", from, to),
///     r#"(updatedAt > "2024-01-01T00:00:00.000Z" && updatedAt < "2024-01-02T00:00:00.000Z")"#,
/// );
/// ```
pub fn time_range_filter(data_field: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let lookups = Lookups::new();
    let after = build_operation(
        data_field,
        OperationName::DateTimeIsAfter,
        &FilterValue::from(format_timestamp(from)),
        &lookups,
    );
    let before = build_operation(
        data_field,
        OperationName::DateTimeIsBefore,
        &FilterValue::from(format_timestamp(to)),
        &lookups,
    );
    format!("({after} && {before})")
}
