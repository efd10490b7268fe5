//! Error types for convexity classification.

use thiserror::Error;

/// Errors that abort a classification run.
///
/// Per-face and per-edge problems (a singular surface, a boundary edge, a
/// degenerate loop) are never errors: the affected edge is skipped and the
/// run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvexityError {
    /// The solid handle does not resolve to a usable solid.
    #[error("invalid solid: {0}")]
    InvalidSolid(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {field} = {value} (must be positive and finite)")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The caller's cancellation flag was raised.
    #[error("classification cancelled")]
    Cancelled,
}

/// Result type for convexity operations.
pub type Result<T> = std::result::Result<T, ConvexityError>;
