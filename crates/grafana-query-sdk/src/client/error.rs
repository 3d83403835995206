use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::batch::BatchError;

/// The source of an error.
///
/// This is used to indicate whether the error occurred in the plugin or in the
/// service it queries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorSource {
    /// The error occurred in the plugin.
    #[default]
    Plugin,
    /// The error occurred in the queried service.
    Downstream,
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin => f.write_str("plugin"),
            Self::Downstream => f.write_str("downstream"),
        }
    }
}

/// Errors that can occur when querying a backend service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The service responded with a non-success status.
    #[error("Request to {path} failed with status {status}: {body}")]
    Http {
        /// The requested path.
        path: String,
        /// The response status.
        status: StatusCode,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The request could not be sent, or the response could not be received.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A request or response body did not have the expected shape.
    #[error("Unexpected JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The query was cancelled.
    #[error("Query cancelled")]
    Cancelled,
}

impl ClientError {
    /// Wrap a transport-level error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }

    /// The HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the plugin or the queried service is responsible for this error.
    pub fn error_source(&self) -> ErrorSource {
        match self {
            Self::Http { .. } | Self::Transport(_) | Self::Decode(_) => ErrorSource::Downstream,
            Self::InvalidRequest(_) | Self::Cancelled => ErrorSource::Plugin,
        }
    }
}

impl From<BatchError<ClientError>> for ClientError {
    fn from(other: BatchError<ClientError>) -> Self {
        match other {
            BatchError::Fetch(err) => err,
            BatchError::Cancelled => Self::Cancelled,
            BatchError::InvalidConfig(msg) => Self::InvalidRequest(msg.to_string()),
        }
    }
}
