//! In-memory storage backend.
//!
//! This module provides thread-safe in-memory implementations of the storage traits.
//! It backs the in-process server, tests, and serves as a reference implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use crate::entity::{Author, AuthorId, Book, BookId};
use crate::storage::traits::{AuthorStore, BookStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct AuthorState {
    by_id: BTreeMap<AuthorId, Author>,
    last_sequence: u64,
}

/// Thread-safe in-memory author store.
#[derive(Debug, Default)]
pub struct InMemoryAuthorStore {
    state: RwLock<AuthorState>,
}

impl InMemoryAuthorStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthorStore for InMemoryAuthorStore {
    fn next_id(&self) -> Result<AuthorId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("author.next_id"))?;
        state.last_sequence += 1;
        Ok(AuthorId::from_sequence(state.last_sequence))
    }

    fn insert(&self, author: Author) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("author.insert"))?;
        if state.by_id.contains_key(&author.id) {
            return Err(StorageError::DuplicateKey(author.id.to_string()));
        }
        // Ids inserted directly (seeding) must not be handed out again.
        state.last_sequence = state.last_sequence.max(author.id.sequence());
        state.by_id.insert(author.id, author);
        Ok(())
    }

    fn get(&self, id: AuthorId) -> Result<Option<Author>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("author.get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn update(&self, author: Author) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("author.update"))?;
        let Some(slot) = state.by_id.get_mut(&author.id) else {
            return Err(StorageError::AuthorNotFound(author.id));
        };
        *slot = author;
        Ok(())
    }

    fn delete(&self, id: AuthorId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("author.delete"))?;
        state
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::AuthorNotFound(id))
    }

    fn list(&self) -> Result<Vec<Author>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("author.list"))?;
        Ok(state.by_id.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
struct BookState {
    by_id: BTreeMap<BookId, Book>,
    by_author: HashMap<AuthorId, BTreeSet<BookId>>,
    last_sequence: u64,
}

impl BookState {
    fn index_remove(&mut self, book: &Book) {
        let Some(author_id) = book.author_id else {
            return;
        };
        if let Some(set) = self.by_author.get_mut(&author_id) {
            set.remove(&book.id);
            if set.is_empty() {
                self.by_author.remove(&author_id);
            }
        }
    }

    fn index_insert(&mut self, book: &Book) {
        if let Some(author_id) = book.author_id {
            self.by_author.entry(author_id).or_default().insert(book.id);
        }
    }
}

/// Thread-safe in-memory book store with an author index.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    state: RwLock<BookState>,
}

impl InMemoryBookStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookStore for InMemoryBookStore {
    fn next_id(&self) -> Result<BookId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("book.next_id"))?;
        state.last_sequence += 1;
        Ok(BookId::from_sequence(state.last_sequence))
    }

    fn insert(&self, book: Book) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("book.insert"))?;
        if state.by_id.contains_key(&book.id) {
            return Err(StorageError::DuplicateKey(book.id.to_string()));
        }
        state.last_sequence = state.last_sequence.max(book.id.sequence());
        state.index_insert(&book);
        state.by_id.insert(book.id, book);
        Ok(())
    }

    fn get(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("book.get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn update(&self, book: Book) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("book.update"))?;
        let Some(old) = state.by_id.get(&book.id).cloned() else {
            return Err(StorageError::BookNotFound(book.id));
        };
        state.index_remove(&old);
        state.index_insert(&book);
        state.by_id.insert(book.id, book);
        Ok(())
    }

    fn delete(&self, id: BookId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("book.delete"))?;
        let Some(old) = state.by_id.remove(&id) else {
            return Err(StorageError::BookNotFound(id));
        };
        state.index_remove(&old);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Book>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("book.list"))?;
        Ok(state.by_id.values().cloned().collect())
    }

    fn find_by_author(&self, author_id: AuthorId) -> Result<Vec<Book>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("book.find_by_author"))?;
        let Some(ids) = state.by_author.get(&author_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect())
    }

    fn detach_author(&self, author_id: AuthorId) -> Result<Vec<BookId>, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("book.detach_author"))?;
        let ids: Vec<BookId> = state
            .by_author
            .remove(&author_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for id in &ids {
            if let Some(book) = state.by_id.get_mut(id) {
                book.set_author(None);
            }
        }
        Ok(ids)
    }
}

/// Bundle of in-memory stores.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    /// Author store.
    pub authors: InMemoryAuthorStore,
    /// Book store.
    pub books: InMemoryBookStore,
}

impl InMemoryStores {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
