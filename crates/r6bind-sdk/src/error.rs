//! Error types for the foreign-runtime ABI

use crate::value::Handle;

/// Result type for ABI calls
pub type AbiResult<T> = Result<T, ForeignError>;

/// Errors reported by the foreign runtime
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForeignError {
    /// The target has no attribute with this name
    #[error("Foreign lookup failed: no attribute '{name}'")]
    Lookup {
        /// Attribute name that was requested
        name: String,
    },

    /// The handle does not reference a live foreign value
    #[error("Invalid foreign handle {0:?}")]
    InvalidHandle(Handle),

    /// Attempted to invoke a value that is not callable
    #[error("Foreign value of type {got} is not callable")]
    NotCallable {
        /// Type name of the value
        got: String,
    },

    /// Type mismatch while reading a foreign value
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Foreign code raised an error
    #[error("Foreign evaluation error: {0}")]
    Evaluation(String),
}

impl ForeignError {
    /// Build a lookup error for `name`
    pub fn lookup(name: impl Into<String>) -> Self {
        ForeignError::Lookup { name: name.into() }
    }

    /// Whether this is an attribute lookup failure
    pub fn is_lookup(&self) -> bool {
        matches!(self, ForeignError::Lookup { .. })
    }
}

impl From<String> for ForeignError {
    fn from(s: String) -> Self {
        ForeignError::Evaluation(s)
    }
}

impl From<&str> for ForeignError {
    fn from(s: &str) -> Self {
        ForeignError::Evaluation(s.to_string())
    }
}
