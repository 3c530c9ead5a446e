//! Error taxonomy for predicate execution.
//!
//! Mirrors the reference engine's analyzer error shape: a `thiserror`-derived
//! enum with one variant per failure mode, a `code()` tag for structured
//! logging/clients, and a display wrapper that prefixes the code.

use std::fmt;

use thiserror::Error;

/// Errors surfaced by [`crate::executor::Executor::execute`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// A leaf referenced a field the schema doesn't know, or declared a
    /// scalar type that doesn't match the field's schema type.
    #[error("field '{field}' is unknown or its type does not match the schema")]
    SchemaMismatch {
        /// The offending field name.
        field: String,
    },
    /// A `Range` leaf's condition list didn't match one of the enumerated
    /// shapes (one condition, or a lower bound followed by an upper bound).
    #[error("field '{field}' has an unsupported range condition shape ({count} condition(s))")]
    UnsupportedOperator {
        /// The offending field name.
        field: String,
        /// Number of conditions supplied.
        count: usize,
    },
    /// The cooperative cancellation flag was observed set between chunks.
    #[error("execution cancelled")]
    Cancelled,
    /// An internal invariant was violated (e.g. a binary node's children
    /// produced different chunk counts). This should never occur given the
    /// append-only / monotonic-barrier discipline in the execution model;
    /// treat it as fatal.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
    /// An ambient-layer setup call (logging, profiling) was misused, e.g. an
    /// invalid filter directive or a double `init_logging` call.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExecError {
    /// Stable, machine-readable tag for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            ExecError::SchemaMismatch { .. } => "SchemaMismatch",
            ExecError::UnsupportedOperator { .. } => "UnsupportedOperator",
            ExecError::Cancelled => "Cancelled",
            ExecError::InvariantViolation(_) => "InvariantViolation",
            ExecError::Config(_) => "Config",
        }
    }

    /// Wraps this error so its `Display` impl is prefixed with `[code]`.
    pub fn with_code(&self) -> ExecErrorWithCode<'_> {
        ExecErrorWithCode(self)
    }
}

/// Convenience wrapper that formats [`ExecError`] with its stable code.
pub struct ExecErrorWithCode<'a>(pub &'a ExecError);

impl fmt::Display for ExecErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExecError>;
