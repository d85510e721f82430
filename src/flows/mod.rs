//! Screen actions.
//!
//! Each action binds one mutation to the cache strategy its screen relies
//! on. Confirmation actions implement [`DialogAction`](crate::dialog::DialogAction),
//! creation forms implement [`FormAction`](crate::dialog::FormAction), and the
//! detail pages are [`AuthorEditor`] and [`BookEditor`].

mod author;
mod book;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::alert::{AlertContext, ErrorContext};
use crate::client::BooksClient;
use crate::entity::{AuthorId, BookId};
use crate::error::{BooksError, BooksResult};

pub use author::{
    assign_book_to_author, list_authors, unassigned_books, AuthorEditor, AuthorForm, CreateAuthor, DeleteAuthor,
    DeleteAuthorBook,
};
pub use book::{
    assign_author_to_book, list_books, BookEditor, BookForm, CreateBook, DeleteBook, RemoveBookAuthor, BOOKS_ROUTE,
};

/// Everything a screen needs to talk to the server.
#[derive(Clone)]
pub struct Session {
    /// Client shared by every screen.
    pub client: BooksClient,
    /// Application-wide alert banner.
    pub alerts: AlertContext,
    /// Errors rendered in place of a page.
    pub errors: ErrorContext,
}

impl Session {
    /// A session with fresh alert and error channels.
    #[must_use]
    pub fn new(client: BooksClient) -> Self {
        Self {
            client,
            alerts: AlertContext::new(),
            errors: ErrorContext::new(),
        }
    }
}

/// Whether a detail page shows or edits its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    /// Read-only display.
    #[default]
    View,
    /// Inputs are editable.
    Edit,
}

/// The author of a book, as far as the query selected it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAuthor {
    /// Author id.
    pub id: AuthorId,
    /// Absent when the query selected only the id.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Absent when the query selected only the id.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A book as shown on a screen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    /// Book id.
    pub id: BookId,
    /// Book title.
    pub title: String,
    /// `None` for unassigned books.
    #[serde(default)]
    pub author: Option<BookAuthor>,
}

/// An author as shown on a screen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    /// Author id.
    pub id: AuthorId,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Resolved locally, when the query selected it.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Books, when the query selected them.
    #[serde(default)]
    pub books: Vec<BookView>,
}

/// `{ "input": <input> }`.
fn input_variables<T: Serialize>(input: &T) -> BooksResult<Value> {
    let value = serde_json::to_value(input).map_err(|e| BooksError::internal(format!("encode input: {e}")))?;
    let mut vars = Map::new();
    vars.insert("input".to_string(), value);
    Ok(Value::Object(vars))
}

/// Decode `data[field]` into a view type.
fn decode<T: DeserializeOwned>(data: &Value, field: &str) -> BooksResult<T> {
    let raw = data.get(field).cloned().unwrap_or(Value::Null);
    serde_json::from_value(raw).map_err(|e| BooksError::internal(format!("decode {field}: {e}")))
}
