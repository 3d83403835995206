/*! Structured logging for data source backends.

Everything in this crate logs through [`tracing`]: each page request of a
batch query is logged at `debug`, and lookup cache failures at `warn` or
`error` depending on the cache's [`ErrorPolicy`][crate::cache::ErrorPolicy].

[`layer`] builds a JSON formatting layer writing to stderr, where the Grafana
plugin host collects plugin logs. Most backends can simply call
[`init_subscriber`] once at startup.
*/
use std::io;

use time::{format_description::FormatItem, macros::format_description};
use tracing_subscriber::{
    fmt::{
        format::{Format, Json, JsonFields},
        time::UtcTime,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

const TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]+00:00");

/// The directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Create a `tracing` [`Layer`][tracing_subscriber::Layer] writing events as JSON lines to stderr.
///
/// # Example
///
/// ```rust
/// use grafana_query_sdk::logging;
/// use tracing_subscriber::{prelude::*, EnvFilter};
///
/// tracing_subscriber::registry()
///     .with(logging::layer())
///     .with(EnvFilter::new("debug"))
///     .init();
/// ```
pub fn layer<S>(
) -> tracing_subscriber::fmt::Layer<S, JsonFields, Format<Json, UtcTime<&'static [FormatItem<'static>]>>, fn() -> io::Stderr>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(UtcTime::new(TIME_FORMAT))
        .with_writer(io::stderr as fn() -> io::Stderr)
}

/// The filter read from `RUST_LOG`, falling back to [`DEFAULT_DIRECTIVE`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install [`layer`] with [`env_filter`] as the global subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn try_init_subscriber() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(layer())
        .with(env_filter())
        .try_init()
}

/// Install [`layer`] with [`env_filter`] as the global subscriber, ignoring
/// any subscriber installed earlier.
pub fn init_subscriber() {
    if let Err(e) = try_init_subscriber() {
        tracing::debug!(error = %e, "Subscriber already installed");
    }
}
