//! Storage for the server side of the application.
//!
//! The traits define the abstract interface; `memory` provides the
//! thread-safe in-memory backends used by the in-process server and tests.

mod memory;
mod traits;

pub use memory::{InMemoryAuthorStore, InMemoryBookStore, InMemoryStores};
pub use traits::{AuthorStore, BookStore, StorageError};
