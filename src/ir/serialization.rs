//! Request serialization helpers.
//!
//! Serde already provides JSON serialization. This module centralizes
//! convenience helpers used by transports and request logs and keeps
//! formatting stable.

use crate::error::{BooksError, TransportError};
use crate::ir::operations::Request;

/// Serialize a request to pretty JSON.
pub fn to_json_pretty(request: &Request) -> Result<String, BooksError> {
    serde_json::to_string_pretty(request).map_err(|e| {
        BooksError::Transport(TransportError::Serialization {
            message: format!("serialize request: {e}"),
        })
    })
}

/// Deserialize a request from JSON.
///
/// Callers should then invoke `validate_request` before executing.
pub fn from_json(s: &str) -> Result<Request, BooksError> {
    serde_json::from_str::<Request>(s).map_err(|e| {
        BooksError::Transport(TransportError::Serialization {
            message: format!("deserialize request: {e}"),
        })
    })
}
