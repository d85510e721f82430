//! Read path: root queries and selection-set projection.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::cache::TYPENAME_FIELD;
use crate::document::Field;
use crate::entity::{Author, AuthorId, Book, BookId, Typename};
use crate::ir::GraphQlError;
use crate::schema::{AuthorFilter, AuthorSortType};
use crate::storage::StorageError;

use super::{argument, optional_argument, FieldResult, LibraryServer};

/// A resolved value awaiting projection.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Author(Author),
    Book(Book),
    List(Vec<Node>),
    /// `{ id }` payload of a delete mutation.
    Deleted {
        typename: Typename,
        id: String,
    },
}

fn unknown_field(typename: Typename, field: &str) -> GraphQlError {
    GraphQlError::new(format!(
        "Cannot query field \"{field}\" on type \"{}\"",
        typename.as_str()
    ))
}

fn compare_names(a: &Author, b: &Author) -> Ordering {
    a.last_name
        .cmp(&b.last_name)
        .then_with(|| a.first_name.cmp(&b.first_name))
        .then_with(|| a.id.cmp(&b.id))
}

impl LibraryServer {
    pub(super) fn resolve_query(&self, field: &str, args: &Map<String, Value>) -> FieldResult<Node> {
        match field {
            "authors" => {
                let filter: AuthorFilter = optional_argument(args, "filter")?.unwrap_or_default();
                let sort: Option<AuthorSortType> = optional_argument(args, "sortBy")?;
                self.list_authors(&filter, sort)
            }
            "author" => {
                let id: AuthorId = argument(args, "id")?;
                Ok(Node::Author(self.author_by_id(id)?))
            }
            "books" => Ok(Node::List(
                self.books.list()?.into_iter().map(Node::Book).collect(),
            )),
            "book" => {
                let id: BookId = argument(args, "id")?;
                Ok(Node::Book(self.book_by_id(id)?))
            }
            other => Err(unknown_field(Typename::Query, other)),
        }
    }

    pub(super) fn author_by_id(&self, id: AuthorId) -> FieldResult<Author> {
        self.authors
            .get(id)?
            .ok_or_else(|| StorageError::AuthorNotFound(id).into())
    }

    pub(super) fn book_by_id(&self, id: BookId) -> FieldResult<Book> {
        self.books
            .get(id)?
            .ok_or_else(|| StorageError::BookNotFound(id).into())
    }

    fn list_authors(&self, filter: &AuthorFilter, sort: Option<AuthorSortType>) -> FieldResult<Node> {
        let mut authors = Vec::new();
        for author in self.authors.list()? {
            if self.matches(&author, filter)? {
                authors.push(author);
            }
        }
        match sort {
            Some(AuthorSortType::Asc) => authors.sort_by(compare_names),
            Some(AuthorSortType::Desc) => authors.sort_by(|a, b| compare_names(b, a)),
            None => {}
        }
        Ok(Node::List(authors.into_iter().map(Node::Author).collect()))
    }

    fn matches(&self, author: &Author, filter: &AuthorFilter) -> FieldResult<bool> {
        if filter.is_empty() {
            return Ok(true);
        }
        if filter.id.as_ref().is_some_and(|ids| !ids.contains(&author.id)) {
            return Ok(false);
        }
        if filter
            .first_name
            .as_ref()
            .is_some_and(|names| !names.contains(&author.first_name))
        {
            return Ok(false);
        }
        if filter
            .last_name
            .as_ref()
            .is_some_and(|names| !names.contains(&author.last_name))
        {
            return Ok(false);
        }
        if let Some(book_ids) = &filter.book_ids {
            let owned = self.books.find_by_author(author.id)?;
            if !owned.iter().any(|b| book_ids.contains(&b.id)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Render `node` through `selection`.
    ///
    /// Objects always carry `__typename` so the client cache can identify
    /// them. `@client` fields are skipped.
    pub(super) fn project(&self, node: &Node, selection: &[Field]) -> FieldResult<Value> {
        match node {
            Node::List(items) => items
                .iter()
                .map(|item| self.project(item, selection))
                .collect::<FieldResult<Vec<_>>>()
                .map(Value::Array),
            Node::Author(author) => self.project_author(author, selection),
            Node::Book(book) => self.project_book(book, selection),
            Node::Deleted { typename, id } => {
                let mut out = typed(*typename);
                for field in selection.iter().filter(|f| !f.client_only) {
                    match field.name.as_str() {
                        TYPENAME_FIELD => {}
                        "id" => {
                            out.insert("id".to_string(), Value::String(id.clone()));
                        }
                        other => return Err(unknown_field(*typename, other)),
                    }
                }
                Ok(Value::Object(out))
            }
        }
    }

    fn project_author(&self, author: &Author, selection: &[Field]) -> FieldResult<Value> {
        let mut out = typed(Typename::Author);
        for field in selection.iter().filter(|f| !f.client_only) {
            let value = match field.name.as_str() {
                TYPENAME_FIELD => continue,
                "id" => Value::String(author.id.to_string()),
                "firstName" => Value::String(author.first_name.clone()),
                "lastName" => Value::String(author.last_name.clone()),
                "fullName" => Value::String(author.full_name()),
                "books" => {
                    let books = self.books.find_by_author(author.id)?;
                    self.project(&Node::List(books.into_iter().map(Node::Book).collect()), &field.selection)?
                }
                other => return Err(unknown_field(Typename::Author, other)),
            };
            out.insert(field.name.clone(), value);
        }
        Ok(Value::Object(out))
    }

    fn project_book(&self, book: &Book, selection: &[Field]) -> FieldResult<Value> {
        let mut out = typed(Typename::Book);
        for field in selection.iter().filter(|f| !f.client_only) {
            let value = match field.name.as_str() {
                TYPENAME_FIELD => continue,
                "id" => Value::String(book.id.to_string()),
                "title" => Value::String(book.title.clone()),
                "author" => match book.author_id {
                    Some(id) => self.project_author(&self.author_by_id(id)?, &field.selection)?,
                    None => Value::Null,
                },
                other => return Err(unknown_field(Typename::Book, other)),
            };
            out.insert(field.name.clone(), value);
        }
        Ok(Value::Object(out))
    }
}

fn typed(typename: Typename) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert(
        TYPENAME_FIELD.to_string(),
        Value::String(typename.as_str().to_string()),
    );
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::document::{catalog, Document, Field};
    use crate::ir::Request;
    use crate::server::LibraryServer;

    fn seeded() -> LibraryServer {
        let server = LibraryServer::in_memory();
        let king = server.seed_author("Stephen", "King").unwrap();
        let austen = server.seed_author("Jane", "Austen").unwrap();
        server.seed_author("Anne", "King").unwrap();
        server.seed_book("Carrie", Some(king)).unwrap();
        server.seed_book("Emma", Some(austen)).unwrap();
        server
    }

    fn author_ids(server: &LibraryServer, vars: serde_json::Value) -> Vec<String> {
        let res = server.execute(&Request::new(&catalog::authors(), vars));
        res.data.unwrap()["authors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn authors_default_to_id_order() {
        assert_eq!(author_ids(&seeded(), json!({ "filter": {} })), ["a:1", "a:2", "a:3"]);
    }

    #[test]
    fn authors_sort_by_last_then_first_name() {
        let server = seeded();
        assert_eq!(
            author_ids(&server, json!({ "filter": {}, "sortBy": "ASC" })),
            ["a:2", "a:3", "a:1"]
        );
        assert_eq!(
            author_ids(&server, json!({ "filter": {}, "sortBy": "DESC" })),
            ["a:1", "a:3", "a:2"]
        );
    }

    #[test]
    fn authors_filter_by_name_and_books() {
        let server = seeded();
        assert_eq!(
            author_ids(&server, json!({ "filter": { "lastName": ["King"] } })),
            ["a:1", "a:3"]
        );
        assert_eq!(
            author_ids(&server, json!({ "filter": { "bookIds": ["b:2"] } })),
            ["a:2"]
        );
        assert!(author_ids(&server, json!({ "filter": { "id": ["a:9"] } })).is_empty());
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let server = seeded();
        let doc = Document::query("Books", Field::object("books", vec![Field::scalar("isbn")]));
        let res = server.execute(&Request::new(&doc, serde_json::Value::Null));
        assert_eq!(res.errors[0].message, "Cannot query field \"isbn\" on type \"Book\"");
    }

    #[test]
    fn book_resolves_its_author() {
        let server = seeded();
        let res = server.execute(&Request::new(&catalog::book(), json!({ "id": "b:2" })));
        let book = &res.data.unwrap()["book"];
        assert_eq!(book["author"]["lastName"], json!("Austen"));
    }
}
