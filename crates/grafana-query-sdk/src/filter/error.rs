//! Error types returned by the filter translation layer.
use thiserror::Error;

use super::OperationName;

/// Errors that can occur when working with individual filter conditions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterError {
    /// The operation name is not in the registry.
    #[error("Unknown filter operation: {0}")]
    UnknownOperation(String),

    /// The operation exists but the field does not accept it.
    #[error("Operation {operation} is not supported by field {field}")]
    UnsupportedOperation {
        /// The data field of the condition.
        field: String,
        /// The rejected operation.
        operation: OperationName,
    },

    /// The condition refers to a field that is not configured.
    #[error("Unknown filter field: {0}")]
    UnknownField(String),
}

/// Errors that can occur when parsing a whole filter string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Text at `offset` did not match any clause or grouping.
    #[error("Unexpected token at offset {offset}: {found:?}")]
    UnexpectedToken {
        /// Byte offset into the filter string.
        offset: usize,
        /// The remaining text from `offset`, truncated for display.
        found: String,
    },

    /// A `(` opened at `offset` was never closed.
    #[error("Unclosed group opened at offset {offset}")]
    UnclosedGroup {
        /// Byte offset of the opening parenthesis.
        offset: usize,
    },

    /// A clause containing `||` was joined with `&&` without parentheses.
    #[error("Clause at offset {offset} contains `||` and must be parenthesized next to `&&`")]
    UngroupedAlternative {
        /// Byte offset of the clause.
        offset: usize,
    },
}
