//! Error types for value parsing in hwscope-types.

use thiserror::Error;

/// Errors that can occur when parsing hwscope values from text.
///
/// This error type is platform-agnostic and carries no hardware-layer
/// failures (those belong in hwscope-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Color string is not in `#RRGGBB` form.
    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// Interval label is not one of the supported choices.
    #[error("Unknown interval '{value}' (expected one of: {expected})")]
    UnknownInterval {
        /// The label that failed to parse.
        value: String,
        /// Comma-separated list of accepted labels.
        expected: String,
    },
}

/// Result type alias using hwscope-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
