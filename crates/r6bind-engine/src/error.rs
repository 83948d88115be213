//! Binding errors

use r6bind_sdk::{ForeignError, Handle};
use thiserror::Error;

/// Result type for binding operations
pub type BindResult<T> = Result<T, BindError>;

/// Errors raised by the binding layer
#[derive(Debug, Clone, Error)]
pub enum BindError {
    /// The handle is not a class generator
    #[error("{handle:?} is not a class generator")]
    NotAClassGenerator {
        /// Offending handle
        handle: Handle,
    },

    /// A value that must reference a foreign object holds something else
    #[error("Expected a foreign object handle, got {got}")]
    NotAHandle {
        /// Type name of the value
        got: &'static str,
    },

    /// Configuration rejected before binding
    #[error("Invalid binding configuration: {0}")]
    InvalidConfig(String),

    /// Error raised while crossing into the foreign runtime
    #[error(transparent)]
    Foreign(#[from] ForeignError),

    /// Neither the class nor any of its ancestors declares a default-attribute table
    #[error("Class '{class}' has no default-attribute table and inherits none")]
    MissingDefaultTable {
        /// Class being defined
        class: String,
    },

    /// A default-attribute table lists the same name twice
    #[error("Default-attribute table of class '{class}' lists '{name}' more than once")]
    DuplicateAttributeName {
        /// Class being defined
        class: String,
        /// Repeated attribute name
        name: String,
    },

    /// A name is both a public field and a public method under strict partitioning
    #[error("Class '{class}' declares {names:?} as both public fields and public methods")]
    SynthesisConflict {
        /// Class being synthesized
        class: String,
        /// Names present in both sets
        names: Vec<String>,
    },

    /// No attribute with this name on the proxy's class
    #[error("'{class}' object has no attribute '{name}'")]
    UnknownAttribute {
        /// Class of the proxy
        class: String,
        /// Requested attribute
        name: String,
    },

    /// A property was called as a method
    #[error("Attribute '{name}' of '{class}' is a property and cannot be called")]
    NotCallable {
        /// Class of the proxy
        class: String,
        /// Requested attribute
        name: String,
    },

    /// A method was read as a value
    #[error("Attribute '{name}' of '{class}' is a method; call it instead")]
    NotAProperty {
        /// Class of the proxy
        class: String,
        /// Requested attribute
        name: String,
    },

    /// Direct instantiation of a class with no originating class generator
    #[error("Class '{class}' has no class generator to construct instances with")]
    NoClassGenerator {
        /// Class being instantiated
        class: String,
    },

    /// The foreign constructor returned something other than an object handle
    #[error("Constructor of '{class}' returned {got}, expected an object handle")]
    ConstructorResult {
        /// Class being instantiated
        class: String,
        /// Type name of the returned value
        got: &'static str,
    },
}

impl BindError {
    /// Whether this is a foreign attribute lookup failure
    pub fn is_lookup(&self) -> bool {
        matches!(self, BindError::Foreign(e) if e.is_lookup())
    }
}
