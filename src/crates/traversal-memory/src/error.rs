//! Engine-side evaluation errors

use thiserror::Error;
use traversal_core::TraversalError;

/// Result type for evaluation
pub type Result<T> = std::result::Result<T, EngineError>;

/// Status code for requests the engine refuses to evaluate
pub const INVALID_REQUEST: u16 = 499;

/// Status code for failures while evaluating a traversal
pub const EVALUATION_FAILED: u16 = 597;

/// Failures raised while evaluating a traversal
///
/// They reach the caller as [`TraversalError::Server`] inside the result
/// stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The request is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A step was applied to a value it cannot handle
    #[error("Cannot apply '{step}' to {found}")]
    UnsupportedInput { step: &'static str, found: String },

    /// An edge endpoint selector did not resolve to exactly one vertex
    #[error("Edge '{label}' endpoint resolved to {found} vertices, expected exactly one")]
    Endpoint { label: String, found: usize },

    /// A predicate referenced a name with no binding in scope
    #[error("No binding named '{0}' in scope")]
    UnknownBinding(String),
}

impl EngineError {
    /// Status code reported to the client
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::UnknownBinding(_) => INVALID_REQUEST,
            Self::UnsupportedInput { .. } | Self::Endpoint { .. } => EVALUATION_FAILED,
        }
    }

    pub(crate) fn unsupported(step: &'static str, found: impl Into<String>) -> Self {
        Self::UnsupportedInput {
            step,
            found: found.into(),
        }
    }
}

impl From<EngineError> for TraversalError {
    fn from(err: EngineError) -> Self {
        TraversalError::server(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(EngineError::InvalidRequest("x".into()).code(), 499);
        assert_eq!(
            EngineError::Endpoint {
                label: "Knows".into(),
                found: 2
            }
            .code(),
            597
        );
    }

    #[test]
    fn test_into_server_error() {
        let err: TraversalError = EngineError::unsupported("fold", "nothing").into();
        assert!(matches!(err, TraversalError::Server { code: 597, .. }));
    }
}
