//! Input and result types of the Author Books API.
//!
//! These mirror the server schema's input objects. Field names serialize in
//! camelCase so the same values can travel as request variables.

use serde::{Deserialize, Serialize};

use crate::entity::{AuthorId, BookId};

/// Input for `addAuthor` and `updateAuthor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInput {
    /// Author to update; absent when adding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AuthorId>,
    /// New first name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Books to assign to the author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_ids: Option<Vec<BookId>>,
}

/// Input for `deleteAuthorBooks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorBookInput {
    /// Author whose books are detached.
    pub id: AuthorId,
    /// Books to detach.
    pub book_ids: Vec<BookId>,
}

/// Input for `deleteAuthor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDeleteInput {
    /// Author to delete.
    pub id: AuthorId,
}

/// Filter for the `authors` listing.
///
/// Every populated list narrows the result: an author must match at least
/// one value of each populated list. An empty filter matches everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorFilter {
    /// Any of these ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Vec<AuthorId>>,
    /// Any of these first names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Vec<String>>,
    /// Any of these last names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Vec<String>>,
    /// Authors owning any of these books.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_ids: Option<Vec<BookId>>,
}

impl AuthorFilter {
    /// Returns true if no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.book_ids.is_none()
    }
}

/// Sort direction for the `authors` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorSortType {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Input for `addBook` and `updateBook`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    /// Book to update; absent when adding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
}

/// Input for `deleteBook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDeleteInput {
    /// Book to delete.
    pub id: BookId,
}

/// Input for `removeBookAuthor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAuthorInput {
    /// Book to orphan.
    pub id: BookId,
}
