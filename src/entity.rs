//! Entity types and identity management.
//!
//! Authors and books carry string identities of the form `a:<n>` and
//! `b:<n>`. The prefix is part of the id, the typename is not: the cache
//! combines the two into a canonical key (`Book:b:1`).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static AUTHOR_ID_RE: OnceLock<Regex> = OnceLock::new();
static BOOK_ID_RE: OnceLock<Regex> = OnceLock::new();

fn author_id_re() -> &'static Regex {
    AUTHOR_ID_RE.get_or_init(|| Regex::new(r"^a:(\d+)$").expect("static regex"))
}

fn book_id_re() -> &'static Regex {
    BOOK_ID_RE.get_or_init(|| Regex::new(r"^b:(\d+)$").expect("static regex"))
}

fn parse_sequence(re: &Regex, kind: &'static str, value: &str) -> Result<u64, ValidationError> {
    re.captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| ValidationError::InvalidId {
            kind,
            value: value.to_string(),
        })
}

/// Stable author identifier (`a:<n>`).
///
/// # Examples
///
/// ```
/// use author_books::AuthorId;
///
/// let id: AuthorId = "a:7".parse().unwrap();
/// assert_eq!(id.sequence(), 7);
/// assert_eq!(id.to_string(), "a:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorId(u64);

impl AuthorId {
    /// Creates an author id from its numeric sequence.
    #[must_use]
    pub const fn from_sequence(n: u64) -> Self {
        Self(n)
    }

    /// Returns the numeric part of the id.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a:{}", self.0)
    }
}

impl FromStr for AuthorId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sequence(author_id_re(), "author", s).map(Self)
    }
}

impl TryFrom<String> for AuthorId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AuthorId> for String {
    fn from(id: AuthorId) -> Self {
        id.to_string()
    }
}

/// Stable book identifier (`b:<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(u64);

impl BookId {
    /// Creates a book id from its numeric sequence.
    #[must_use]
    pub const fn from_sequence(n: u64) -> Self {
        Self(n)
    }

    /// Returns the numeric part of the id.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b:{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sequence(book_id_re(), "book", s).map(Self)
    }
}

impl TryFrom<String> for BookId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookId> for String {
    fn from(id: BookId) -> Self {
        id.to_string()
    }
}

/// GraphQL object types known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Typename {
    /// An author.
    Author,
    /// A book.
    Book,
    /// Result of `deleteAuthor`.
    AuthorDeleteResult,
    /// Result of `deleteBook`.
    BookDeleteResult,
    /// Root query type.
    Query,
    /// Root mutation type.
    Mutation,
}

impl Typename {
    /// The name as it appears in `__typename`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "Author",
            Self::Book => "Book",
            Self::AuthorDeleteResult => "AuthorDeleteResult",
            Self::BookDeleteResult => "BookDeleteResult",
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }
}

impl fmt::Display for Typename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side author record.
///
/// The `books` relation is not stored here: it is derived from
/// [`Book::author_id`] so the two sides cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Stable identifier.
    pub id: AuthorId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
    /// Bumped on every write.
    pub version: u64,
}

impl Author {
    /// Creates a new author record.
    ///
    /// # Examples
    ///
    /// ```
    /// use author_books::{Author, AuthorId};
    ///
    /// let author = Author::new(AuthorId::from_sequence(1), "Stephen", "King");
    /// assert_eq!(author.full_name(), "Stephen King");
    /// assert_eq!(author.version, 1);
    /// ```
    #[must_use]
    pub fn new(id: AuthorId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// `"{first} {last}"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Replaces the provided names, bumping the version when anything changed.
    pub fn rename(&mut self, first_name: Option<&str>, last_name: Option<&str>) {
        let mut changed = false;
        if let Some(first) = first_name {
            if first != self.first_name {
                self.first_name = first.to_string();
                changed = true;
            }
        }
        if let Some(last) = last_name {
            if last != self.last_name {
                self.last_name = last.to_string();
                changed = true;
            }
        }
        if changed {
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

/// Server-side book record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Stable identifier.
    pub id: BookId,
    /// Title shown everywhere.
    pub title: String,
    /// Owning author; `None` for unassigned books.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
    /// Bumped on every write.
    pub version: u64,
}

impl Book {
    /// Creates a new book without an author.
    #[must_use]
    pub fn new(id: BookId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            author_id: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Points the back-reference at `author` (or clears it).
    pub fn set_author(&mut self, author: Option<AuthorId>) {
        if self.author_id != author {
            self.author_id = author;
            self.touch();
        }
    }

    /// Changes the title.
    pub fn retitle(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title != self.title {
            self.title = title;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_id_parse_and_display() {
        let id: AuthorId = "a:12".parse().unwrap();
        assert_eq!(id, AuthorId::from_sequence(12));
        assert_eq!(format!("{id}"), "a:12");
    }

    #[test]
    fn test_author_id_rejects_wrong_prefix() {
        let err = "b:1".parse::<AuthorId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidId {
                kind: "author",
                value: "b:1".to_string()
            }
        );
        assert!("a:".parse::<AuthorId>().is_err());
        assert!("a:1x".parse::<AuthorId>().is_err());
    }

    #[test]
    fn test_book_id_serde_is_string() {
        let id = BookId::from_sequence(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"b:3\"");
        let back: BookId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<BookId>("\"a:3\"").is_err());
    }

    #[test]
    fn test_author_rename_bumps_version_only_on_change() {
        let mut author = Author::new(AuthorId::from_sequence(1), "Stephen", "King");
        author.rename(Some("Stephen"), None);
        assert_eq!(author.version, 1);

        author.rename(None, Some("Kingsley"));
        assert_eq!(author.version, 2);
        assert_eq!(author.full_name(), "Stephen Kingsley");
    }

    #[test]
    fn test_book_set_author() {
        let mut book = Book::new(BookId::from_sequence(1), "The Shining");
        assert!(book.author_id.is_none());

        book.set_author(Some(AuthorId::from_sequence(1)));
        assert_eq!(book.version, 2);
        book.set_author(Some(AuthorId::from_sequence(1)));
        assert_eq!(book.version, 2);
        book.set_author(None);
        assert_eq!(book.version, 3);
    }

    #[test]
    fn test_typename_display() {
        assert_eq!(Typename::Book.to_string(), "Book");
        assert_eq!(Typename::AuthorDeleteResult.as_str(), "AuthorDeleteResult");
    }
}
