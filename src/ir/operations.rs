//! Request and response definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::document::Document;

/// The top-level wrapper for every operation sent to the server.
///
/// Every request carries:
/// - Protocol versioning for forward/backward compatibility
/// - Request tracking via unique IDs
/// - A persisted-query hash of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Protocol version (e.g., "1.0").
    pub version: String,

    /// Unique identifier for this request (for tracing/debugging).
    pub request_id: Uuid,

    /// When this request was created.
    pub timestamp: DateTime<Utc>,

    /// Name of the operation (`Authors`, `removeBookAuthor`, ...).
    pub operation_name: String,

    /// BLAKE3 digest of the printed document.
    pub document_hash: String,

    /// The operation to execute.
    pub document: Document,

    /// Variables bound to the document.
    #[serde(default)]
    pub variables: Value,
}

impl Request {
    /// Current protocol version.
    pub const CURRENT_VERSION: &'static str = "1.0";

    /// Creates a new request for `document` with `variables`.
    #[must_use]
    pub fn new(document: &Document, variables: Value) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation_name: document.name.clone(),
            document_hash: document.hash(),
            document: document.clone(),
            variables,
        }
    }

    /// Sets a custom request ID (useful for correlation).
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Position of an error in the request document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// An application-layer error as reported in a response's `errors` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Human-readable message.
    pub message: String,
    /// Where in the document the error points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
    /// Response path of the failing field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl GraphQlError {
    /// Creates an error without location information.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Attaches the response path the error belongs to.
    #[must_use]
    pub fn at_path(mut self, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }
}

/// A server response: `data` on success, `errors` on failure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Result keyed by root field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Application-layer errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl Response {
    /// A successful response.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A failed response carrying a single error.
    #[must_use]
    pub fn error(error: GraphQlError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// Returns true if the server reported no errors.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::catalog;
    use serde_json::json;

    #[test]
    fn request_carries_document_identity() {
        let doc = catalog::authors();
        let req = Request::new(&doc, json!({ "filter": {} }));
        assert_eq!(req.operation_name, "Authors");
        assert_eq!(req.document_hash, doc.hash());
        assert_eq!(req.version, Request::CURRENT_VERSION);
    }

    #[test]
    fn response_serializes_without_empty_errors() {
        let resp = Response::ok(json!({ "books": [] }));
        assert_eq!(serde_json::to_value(&resp).unwrap(), json!({ "data": { "books": [] } }));
    }

    #[test]
    fn graphql_error_path() {
        let err = GraphQlError::new("Book not found: b:2").at_path(["book"]);
        assert_eq!(err.path, vec!["book".to_string()]);
        assert!(!Response::error(err).is_ok());
    }
}
