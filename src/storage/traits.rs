//! Abstract storage traits for authors and books.
//!
//! These traits define the contract that storage backends must implement.
//! The author/book relation is owned by the book side (`Book::author_id`);
//! stores expose an index to walk it from the author side.

use thiserror::Error;

use crate::entity::{Author, AuthorId, Book, BookId};

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Author not found.
    #[error("Author not found: {0}")]
    AuthorNotFound(AuthorId),

    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Storage trait for Author operations.
pub trait AuthorStore: Send + Sync {
    /// Allocate the next unused id.
    fn next_id(&self) -> Result<AuthorId, StorageError>;

    /// Insert a new author. Returns error if ID already exists.
    fn insert(&self, author: Author) -> Result<(), StorageError>;

    /// Get an author by ID.
    fn get(&self, id: AuthorId) -> Result<Option<Author>, StorageError>;

    /// Update an existing author. Returns error if not found.
    fn update(&self, author: Author) -> Result<(), StorageError>;

    /// Delete an author by ID. Returns error if not found.
    fn delete(&self, id: AuthorId) -> Result<(), StorageError>;

    /// All authors, ascending by id.
    fn list(&self) -> Result<Vec<Author>, StorageError>;
}

/// Storage trait for Book operations.
pub trait BookStore: Send + Sync {
    /// Allocate the next unused id.
    fn next_id(&self) -> Result<BookId, StorageError>;

    /// Insert a new book. Returns error if ID already exists.
    fn insert(&self, book: Book) -> Result<(), StorageError>;

    /// Get a book by ID.
    fn get(&self, id: BookId) -> Result<Option<Book>, StorageError>;

    /// Update an existing book, reindexing its author. Returns error if not found.
    fn update(&self, book: Book) -> Result<(), StorageError>;

    /// Delete a book by ID. Returns error if not found.
    fn delete(&self, id: BookId) -> Result<(), StorageError>;

    /// All books, ascending by id.
    fn list(&self) -> Result<Vec<Book>, StorageError>;

    /// Books whose author is `author_id`, ascending by id.
    fn find_by_author(&self, author_id: AuthorId) -> Result<Vec<Book>, StorageError>;

    /// Clear the author of every book owned by `author_id`.
    ///
    /// Returns the ids of the books that were detached.
    fn detach_author(&self, author_id: AuthorId) -> Result<Vec<BookId>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_author_store_object_safe(_: &dyn AuthorStore) {}
    fn _assert_book_store_object_safe(_: &dyn BookStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::AuthorNotFound(AuthorId::from_sequence(9));
        assert_eq!(err.to_string(), "Author not found: a:9");

        let err = StorageError::BookNotFound(BookId::from_sequence(2));
        assert_eq!(err.to_string(), "Book not found: b:2");

        let err = StorageError::BackendError("poisoned lock".to_string());
        assert!(err.to_string().contains("poisoned lock"));
    }
}
