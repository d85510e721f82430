//! In-process library server.
//!
//! [`LibraryServer`] executes [`Request`]s against the author and book stores
//! and answers with GraphQL-shaped [`Response`]s. Every failure is reported in
//! the response's `errors`, never as a Rust error, so the client sees exactly
//! what a remote server would send.

mod resolve;
mod write_path;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::document::OperationKind;
use crate::entity::{Author, AuthorId, Book, BookId};
use crate::error::ValidationError;
use crate::ir::{validate_request, GraphQlError, Request, Response};
use crate::storage::{AuthorStore, BookStore, InMemoryAuthorStore, InMemoryBookStore, StorageError};

pub(crate) type FieldResult<T> = Result<T, GraphQlError>;

impl From<StorageError> for GraphQlError {
    fn from(err: StorageError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ValidationError> for GraphQlError {
    fn from(err: ValidationError) -> Self {
        Self::new(err.to_string())
    }
}

/// Deserialize the argument `name` into `T`.
fn argument<T: DeserializeOwned>(args: &Map<String, Value>, name: &str) -> FieldResult<T> {
    let raw = args
        .get(name)
        .cloned()
        .ok_or_else(|| GraphQlError::new(format!("Argument '{name}' is required")))?;
    serde_json::from_value(raw).map_err(|e| GraphQlError::new(format!("Invalid argument '{name}': {e}")))
}

/// Like [`argument`], but absent or null arguments yield `None`.
fn optional_argument<T: DeserializeOwned>(args: &Map<String, Value>, name: &str) -> FieldResult<Option<T>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => argument(args, name).map(Some),
    }
}

/// Executes Author Books operations.
#[derive(Clone)]
pub struct LibraryServer {
    authors: Arc<dyn AuthorStore>,
    books: Arc<dyn BookStore>,
}

impl LibraryServer {
    /// Create a server over the given stores.
    #[must_use]
    pub fn new(authors: Arc<dyn AuthorStore>, books: Arc<dyn BookStore>) -> Self {
        Self { authors, books }
    }

    /// Create a server over fresh in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryAuthorStore::new()),
            Arc::new(InMemoryBookStore::new()),
        )
    }

    /// Insert an author directly, bypassing the API.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn seed_author(&self, first_name: &str, last_name: &str) -> Result<AuthorId, StorageError> {
        let id = self.authors.next_id()?;
        self.authors.insert(Author::new(id, first_name, last_name))?;
        Ok(id)
    }

    /// Insert a book directly, bypassing the API.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn seed_book(&self, title: &str, author: Option<AuthorId>) -> Result<BookId, StorageError> {
        let id = self.books.next_id()?;
        let mut book = Book::new(id, title);
        book.set_author(author);
        self.books.insert(book)?;
        Ok(id)
    }

    /// Execute a request.
    #[must_use]
    pub fn execute(&self, request: &Request) -> Response {
        if let Err(err) = validate_request(request) {
            warn!(
                request_id = %request.request_id,
                operation = %request.operation_name,
                error = %err,
                "rejected request"
            );
            return Response::error(err.into());
        }

        let root = &request.document.root;
        let args = root.resolve_args(&request.variables);
        let result = match request.document.kind {
            OperationKind::Query => {
                debug!(request_id = %request.request_id, field = %root.name, "query");
                self.resolve_query(&root.name, &args)
            }
            OperationKind::Mutation => {
                info!(request_id = %request.request_id, field = %root.name, "mutation");
                self.apply_mutation(&root.name, &args)
            }
        };

        match result.and_then(|node| self.project(&node, &root.selection)) {
            Ok(value) => {
                let mut data = Map::new();
                data.insert(root.name.clone(), value);
                Response::ok(Value::Object(data))
            }
            Err(err) => {
                debug!(request_id = %request.request_id, error = %err.message, "field error");
                Response::error(err.at_path([root.name.clone()]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::catalog;
    use serde_json::json;

    fn run(server: &LibraryServer, doc: &crate::document::Document, vars: Value) -> Response {
        server.execute(&Request::new(doc, vars))
    }

    #[test]
    fn authors_listing_includes_typenames_and_books() {
        let server = LibraryServer::in_memory();
        let king = server.seed_author("Stephen", "King").unwrap();
        server.seed_book("It", Some(king)).unwrap();

        let res = run(&server, &catalog::authors(), json!({ "filter": {} }));
        assert!(res.is_ok());
        let author = &res.data.unwrap()["authors"][0];
        assert_eq!(author["__typename"], json!("Author"));
        assert_eq!(author["books"][0]["author"], json!({ "__typename": "Author", "id": "a:1" }));
        // Local fields are left to the client cache.
        assert!(author.get("fullName").is_none());
    }

    #[test]
    fn tampered_document_is_rejected() {
        let server = LibraryServer::in_memory();
        let mut req = Request::new(&catalog::books(), Value::Null);
        req.document_hash = "0".repeat(64);
        let res = server.execute(&req);
        assert!(res.data.is_none());
        assert!(res.errors[0].message.contains("Document hash"));
    }

    #[test]
    fn unknown_entities_surface_as_field_errors() {
        let server = LibraryServer::in_memory();
        let res = run(&server, &catalog::book(), json!({ "id": "b:9" }));
        assert_eq!(res.errors[0].message, "Book not found: b:9");
        assert_eq!(res.errors[0].path, vec!["book".to_string()]);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let server = LibraryServer::in_memory();
        let res = run(&server, &catalog::author(), json!({ "id": "b:1" }));
        assert!(res.errors[0].message.starts_with("Invalid argument 'id'"));
    }
}
