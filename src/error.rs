//! Error types for Author Books.
//!
//! All errors are strongly typed using thiserror. Network-layer failures
//! (`TransportError`) are kept apart from application-layer failures
//! (`ExecutionError::GraphQl`) so callers and the alert channel can tell
//! them apart.

use thiserror::Error;

use crate::dialog::DialogError;
use crate::ir::GraphQlError;

/// Validation errors that occur during input validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An id does not have the `a:N` / `b:N` shape.
    #[error("Invalid {kind} id '{value}'")]
    InvalidId {
        /// `author` or `book`.
        kind: &'static str,
        /// The rejected text.
        value: String,
    },

    /// A required input field is absent.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Input field name.
        field: String,
    },

    /// An input field is longer than allowed.
    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Input field name.
        field: String,
        /// Longest accepted value.
        max_length: usize,
    },

    /// Variables do not fit the operation.
    #[error("Invalid variables for '{operation}': {reason}")]
    InvalidVariables {
        /// Operation name.
        operation: String,
        /// What is wrong.
        reason: String,
    },

    /// A request names one operation but carries another's document.
    #[error("Document hash does not match operation '{operation}'")]
    DocumentHashMismatch {
        /// Operation name.
        operation: String,
    },

    /// Form rules that failed.
    #[error("{}", .messages.join(", "))]
    Form {
        /// One message per failed rule.
        messages: Vec<String>,
    },
}

/// Execution errors reported by the server or raised while applying results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The server answered with errors.
    #[error("{}", join_messages(.errors))]
    GraphQl {
        /// Errors in server order.
        errors: Vec<GraphQlError>,
    },

    /// The response had neither data nor errors.
    #[error("Response for '{operation}' carried no data")]
    MissingData {
        /// Operation name.
        operation: String,
    },

    /// A cache-only read found missing fields.
    #[error("Query '{operation}' is not fully cached")]
    CacheMiss {
        /// Operation name.
        operation: String,
    },
}

/// Transport errors for client-server communication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never reached the server.
    #[error("Network error: {message}")]
    Network {
        /// Transport message.
        message: String,
    },

    /// The request could not be encoded.
    #[error("Failed to serialize request: {message}")]
    Serialization {
        /// Encoder message.
        message: String,
    },

    /// A mock transport ran out of scripted answers.
    #[error("No more mocked responses for the query: {operation}")]
    NoMockedResponse {
        /// Operation name.
        operation: String,
    },
}

/// Top-level error type for Author Books.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BooksError {
    /// Input was rejected before sending.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The operation failed.
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// The network layer failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A dialog event arrived in the wrong state.
    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    /// An invariant was broken.
    #[error("Internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl BooksError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the failure happened in the network layer.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the server answered with GraphQL errors.
    #[must_use]
    pub const fn is_application(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::GraphQl { .. }))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if retrying the same request could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Network { .. }))
    }

    /// Individual messages, one per underlying error.
    ///
    /// GraphQL failures yield one entry per server error and network failures
    /// their bare transport message; everything else yields its display
    /// string.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Execution(ExecutionError::GraphQl { errors }) if !errors.is_empty() => {
                errors.iter().map(|e| e.message.clone()).collect()
            }
            Self::Validation(ValidationError::Form { messages }) => messages.clone(),
            Self::Transport(TransportError::Network { message }) => vec![message.clone()],
            other => vec![other.to_string()],
        }
    }

    /// The message shown on the alert channel.
    #[must_use]
    pub fn alert_message(&self) -> String {
        self.messages().join(", ")
    }
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for Author Books operations.
pub type BooksResult<T> = Result<T, BooksError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_joins_messages() {
        let err = ExecutionError::GraphQl {
            errors: vec![GraphQlError::new("first"), GraphQlError::new("second")],
        };
        assert_eq!(err.to_string(), "first, second");
    }

    #[test]
    fn test_network_error_is_distinguishable() {
        let err: BooksError = TransportError::Network {
            message: "connection refused".to_string(),
        }
        .into();
        assert!(err.is_network());
        assert!(!err.is_application());
        assert!(err.is_retryable());
        assert_eq!(err.alert_message(), "connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_application_error_messages() {
        let err: BooksError = ExecutionError::GraphQl {
            errors: vec![GraphQlError::new("Book not found: b:9")],
        }
        .into();
        assert!(err.is_application());
        assert!(!err.is_retryable());
        assert_eq!(err.messages(), vec!["Book not found: b:9".to_string()]);
    }

    #[test]
    fn test_form_error_lists_every_rule() {
        let err: BooksError = ValidationError::Form {
            messages: vec!["a".to_string(), "b".to_string()],
        }
        .into();
        assert!(err.is_validation());
        assert_eq!(err.messages().len(), 2);
        assert_eq!(err.alert_message(), "a, b");
    }

    #[test]
    fn test_internal_error() {
        let err = BooksError::internal("unexpected state");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("unexpected state"));
    }
}
