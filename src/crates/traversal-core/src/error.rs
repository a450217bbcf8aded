//! Error types for traversal construction, execution and decoding
//!
//! Every failure a caller can observe is a [`TraversalError`]. Schema problems
//! detected while the [`GraphModel`](crate::schema::GraphModel) is being built
//! are reported as [`SchemaError`] and wrapped into `TraversalError::Schema`
//! when they surface from a builder call.
//!
//! # Error Hierarchy
//!
//! ```text
//! TraversalError
//! ├── Schema              - bad type registration / unregistered type (startup)
//! ├── TypeMismatch        - narrowing to a label outside the current shape
//! ├── UnknownProperty     - predicate or projection on an undeclared property
//! ├── UnboundReference    - bound handle used outside of its scope
//! ├── Cardinality         - edge endpoint selector does not resolve to one vertex
//! ├── Transport           - channel-level failure (no implicit retry)
//! ├── Server              - remote engine rejected the traversal
//! ├── Decoding            - malformed or mistyped response
//! ├── TypeFilterMismatch  - label mismatch under strict projection
//! ├── Cancelled           - execution cancelled by the caller
//! ├── Serialization       - JSON encoding/decoding failure
//! └── Configuration       - invalid environment configuration
//! ```
//!
//! Construction-time errors (`Schema`, `TypeMismatch`, `UnknownProperty`,
//! `UnboundReference`, `Cardinality`) are returned synchronously by the builder
//! and are never sent to the remote engine.

use thiserror::Error;

/// Convenience result type using [`TraversalError`]
pub type Result<T> = std::result::Result<T, TraversalError>;

/// Errors raised while registering domain types in a graph model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A descriptor declared a label that is empty
    #[error("Type '{type_name}' declares an empty label")]
    EmptyLabel {
        /// Rust type name of the offending type
        type_name: String,
    },

    /// Two distinct types resolve to the same label
    #[error("Label '{label}' is ambiguous: declared by both '{first}' and '{second}'")]
    DuplicateLabel {
        /// The contested label
        label: String,
        /// Type registered first
        first: String,
        /// Type that attempted to reuse the label
        second: String,
    },

    /// A type was registered in a slot that does not match its element kind
    #[error("Type '{type_name}' is a {found} kind but was registered as a {expected}")]
    UnrecognizedKind {
        /// Rust type name of the offending type
        type_name: String,
        /// Kind the registration slot expects
        expected: String,
        /// Kind the type actually declares
        found: String,
    },

    /// A label or property uses a name reserved for element metadata
    #[error("Type '{type_name}' uses reserved name '{name}'")]
    ReservedName {
        /// Rust type name of the offending type
        type_name: String,
        /// The reserved name
        name: String,
    },

    /// The same property is declared twice on one type
    #[error("Type '{type_name}' declares property '{property}' more than once")]
    DuplicateProperty {
        /// Rust type name of the offending type
        type_name: String,
        /// The repeated property
        property: String,
    },

    /// A serialised value carries a field its type never declared
    #[error("Type '{type_name}' serialises undeclared property '{property}'")]
    UndeclaredProperty {
        /// Rust type name of the offending type
        type_name: String,
        /// The undeclared field
        property: String,
    },

    /// A value does not serialise to a map of properties
    #[error("Type '{type_name}' does not serialise to a property map")]
    NotAnObject {
        /// Rust type name of the offending type
        type_name: String,
    },

    /// Property configuration names a property the type does not declare
    #[error("Cannot configure unknown property '{property}' on '{type_name}'")]
    UnknownPropertyConfig {
        /// Rust type name of the configured type
        type_name: String,
        /// The unknown property
        property: String,
    },

    /// A type was used without being registered in the model
    #[error("Type '{type_name}' is not registered in the graph model")]
    NotRegistered {
        /// Rust type name of the unregistered type
        type_name: String,
    },
}

/// Comprehensive error type for all traversal operations
#[derive(Error, Debug)]
pub enum TraversalError {
    /// Schema registration or lookup failed
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Narrowing to a type that shares no candidate with the current shape
    ///
    /// # Example
    ///
    /// ```rust
    /// use traversal_core::error::TraversalError;
    ///
    /// let err = TraversalError::type_mismatch("[Person]", "Software");
    /// assert_eq!(err.to_string(), "Type mismatch: cannot narrow [Person] to Software");
    /// ```
    #[error("Type mismatch: cannot narrow {from} to {to}")]
    TypeMismatch {
        /// Description of the current shape
        from: String,
        /// Label that was requested
        to: String,
    },

    /// A predicate or projection referenced a property no candidate declares
    #[error("Unknown property '{property}' on {shape}")]
    UnknownProperty {
        /// Description of the current shape
        shape: String,
        /// The property name
        property: String,
    },

    /// A bound handle was referenced outside of the scope that produced it
    #[error("Unbound reference '{name}'")]
    UnboundReference {
        /// Name of the binding
        name: String,
    },

    /// An endpoint selector cannot resolve to exactly one vertex
    #[error("Cardinality error: {0}")]
    Cardinality(String),

    /// The channel to the remote engine failed
    ///
    /// Never retried by this crate; retry policy belongs to the caller.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote engine rejected the traversal
    #[error("Server error {code}: {message}")]
    Server {
        /// Engine status code
        code: u16,
        /// Engine message
        message: String,
    },

    /// A raw result could not be decoded into the expected type
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Strict projection found an element with an unexpected label
    #[error("Type filter mismatch: expected '{expected}', found '{found}'")]
    TypeFilterMismatch {
        /// Label the projection expected
        expected: String,
        /// Label the engine returned
        found: String,
    },

    /// The execution was cancelled before it completed
    #[error("Traversal cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid environment configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TraversalError {
    /// Create a type mismatch error
    pub fn type_mismatch(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::TypeMismatch {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a server error with code and message
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Create an unbound reference error
    pub fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundReference { name: name.into() }
    }

    /// Whether this error was raised while building, before any network call
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::Schema(_)
                | Self::TypeMismatch { .. }
                | Self::UnknownProperty { .. }
                | Self::UnboundReference { .. }
                | Self::Cardinality(_)
        )
    }
}
