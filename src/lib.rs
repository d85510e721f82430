//! # Author Books
//!
//! A client library for a small GraphQL catalogue of authors and the books
//! they wrote. It keeps an Apollo-style normalized cache in sync with the
//! server while screens create, edit, assign and delete records.
//!
//! ## Core Concepts
//!
//! - **Client**: sends operations over a [`Transport`] and writes results into
//!   the [`InMemoryCache`]
//! - **Cache**: records keyed by `Typename:id`, with root query and mutation
//!   fields pointing at them
//! - **Relation patcher**: repairs a cached parent listing when a child loses
//!   its parent and the server only returns the child
//! - **Flows**: the actions behind each screen and dialog
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use author_books::flows::{list_books, Session};
//! use author_books::{BooksClient, ClientConfig, InProcessTransport, LibraryServer};
//!
//! let server = LibraryServer::in_memory();
//! server.seed_book("Dune", None).unwrap();
//!
//! let transport = Arc::new(InProcessTransport::new(Arc::new(server)));
//! let session = Session::new(BooksClient::new(transport, ClientConfig::default()));
//!
//! let books = list_books(&session).unwrap();
//! assert_eq!(books[0].title, "Dune");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Domain types
pub mod entity;
pub mod error;
pub mod schema;
pub mod validation;

// Operations, envelopes and the server they run against
pub mod document;
pub mod ir;
pub mod server;
pub mod storage;
pub mod transport;

// Client side
pub mod cache;
pub mod client;
pub mod config;
pub mod patch;

// Screens
pub mod alert;
pub mod dialog;
pub mod flows;

pub use entity::{Author, AuthorId, Book, BookId, Typename};
pub use error::{BooksError, BooksResult, ExecutionError, TransportError, ValidationError};

pub use cache::{CacheKey, InMemoryCache, NormalizedCache};
pub use client::{BooksClient, MutationOptions, QueryWatch};
pub use config::{CacheConfig, ClientConfig, FetchPolicy};
pub use patch::{PatchOutcome, RelationCachePatcher, RelationEdge};

pub use server::LibraryServer;
pub use transport::{InProcessTransport, MockTransport, MockedResponse, Transport};

pub use alert::{AlertContext, AlertLevel, ErrorContext};
pub use dialog::{ConfirmDialog, DialogAction, DialogError, DialogState, FormAction, FormDialog};
