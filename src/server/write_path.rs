//! Write path: the mutation resolvers.
//!
//! The relation lives on the book side, so every change to an author's
//! books is a change to `Book::author_id`.

use serde_json::{Map, Value};
use tracing::info;

use crate::entity::{Author, AuthorId, Book, BookId, Typename};
use crate::error::ValidationError;
use crate::ir::GraphQlError;
use crate::schema::{AuthorBookInput, AuthorDeleteInput, AuthorInput, BookAuthorInput, BookDeleteInput, BookInput};

use super::resolve::Node;
use super::{argument, FieldResult, LibraryServer};

fn required<T>(value: Option<T>, field: &str) -> FieldResult<T> {
    value.ok_or_else(|| {
        ValidationError::MissingField {
            field: field.to_string(),
        }
        .into()
    })
}

impl LibraryServer {
    pub(super) fn apply_mutation(&self, field: &str, args: &Map<String, Value>) -> FieldResult<Node> {
        match field {
            "addAuthor" => self.add_author(argument(args, "input")?),
            "updateAuthor" => self.update_author(argument(args, "input")?),
            "deleteAuthor" => self.delete_author(argument(args, "input")?),
            "deleteAuthorBooks" => self.delete_author_books(argument(args, "input")?),
            "addBook" => self.add_book(argument(args, "input")?),
            "updateBook" => self.update_book(argument(args, "input")?),
            "deleteBook" => self.delete_book(argument(args, "input")?),
            "removeBookAuthor" => self.remove_book_author(argument(args, "input")?),
            other => Err(GraphQlError::new(format!(
                "Cannot query field \"{other}\" on type \"{}\"",
                Typename::Mutation.as_str()
            ))),
        }
    }

    fn load_books(&self, book_ids: Option<&[BookId]>) -> FieldResult<Vec<Book>> {
        book_ids
            .unwrap_or_default()
            .iter()
            .map(|id| self.book_by_id(*id))
            .collect()
    }

    fn assign_books(&self, author: AuthorId, books: Vec<Book>) -> FieldResult<()> {
        for mut book in books {
            book.set_author(Some(author));
            self.books.update(book)?;
        }
        Ok(())
    }

    fn add_author(&self, input: AuthorInput) -> FieldResult<Node> {
        let first_name = required(input.first_name, "firstName")?;
        let last_name = required(input.last_name, "lastName")?;
        // Every book id resolves before anything is written.
        let books = self.load_books(input.book_ids.as_deref())?;
        let id = self.authors.next_id()?;
        self.authors.insert(Author::new(id, first_name, last_name))?;
        self.assign_books(id, books)?;
        info!(author = %id, "author added");
        Ok(Node::Author(self.author_by_id(id)?))
    }

    fn update_author(&self, input: AuthorInput) -> FieldResult<Node> {
        let id = required(input.id, "id")?;
        let mut author = self.author_by_id(id)?;
        let books = self.load_books(input.book_ids.as_deref())?;
        author.rename(input.first_name.as_deref(), input.last_name.as_deref());
        self.authors.update(author)?;
        self.assign_books(id, books)?;
        Ok(Node::Author(self.author_by_id(id)?))
    }

    fn delete_author(&self, input: AuthorDeleteInput) -> FieldResult<Node> {
        self.author_by_id(input.id)?;
        let detached = self.books.detach_author(input.id)?;
        self.authors.delete(input.id)?;
        info!(author = %input.id, detached = detached.len(), "author deleted");
        Ok(Node::Deleted {
            typename: Typename::AuthorDeleteResult,
            id: input.id.to_string(),
        })
    }

    fn delete_author_books(&self, input: AuthorBookInput) -> FieldResult<Node> {
        let author = self.author_by_id(input.id)?;
        for book_id in input.book_ids {
            let mut book = self.book_by_id(book_id)?;
            // Books owned by someone else are left alone.
            if book.author_id == Some(author.id) {
                book.set_author(None);
                self.books.update(book)?;
            }
        }
        Ok(Node::Author(author))
    }

    fn add_book(&self, input: BookInput) -> FieldResult<Node> {
        let title = required(input.title, "title")?;
        if let Some(author) = input.author_id {
            self.author_by_id(author)?;
        }
        let id = self.books.next_id()?;
        let mut book = Book::new(id, title);
        book.set_author(input.author_id);
        self.books.insert(book.clone())?;
        info!(book = %id, "book added");
        Ok(Node::Book(book))
    }

    fn update_book(&self, input: BookInput) -> FieldResult<Node> {
        let id = required(input.id, "id")?;
        let mut book = self.book_by_id(id)?;
        if let Some(author) = input.author_id {
            self.author_by_id(author)?;
            book.set_author(Some(author));
        }
        if let Some(title) = input.title {
            book.retitle(title);
        }
        self.books.update(book.clone())?;
        Ok(Node::Book(book))
    }

    fn delete_book(&self, input: BookDeleteInput) -> FieldResult<Node> {
        self.books.delete(input.id)?;
        info!(book = %input.id, "book deleted");
        Ok(Node::Deleted {
            typename: Typename::BookDeleteResult,
            id: input.id.to_string(),
        })
    }

    fn remove_book_author(&self, input: BookAuthorInput) -> FieldResult<Node> {
        let mut book = self.book_by_id(input.id)?;
        book.set_author(None);
        self.books.update(book.clone())?;
        Ok(Node::Book(book))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::document::{catalog, Document};
    use crate::ir::{Request, Response};
    use crate::server::LibraryServer;

    fn run(server: &LibraryServer, doc: &Document, vars: Value) -> Response {
        server.execute(&Request::new(doc, vars))
    }

    fn book_author(server: &LibraryServer, id: &str) -> Value {
        let res = run(server, &catalog::book(), json!({ "id": id }));
        res.data.unwrap()["book"]["author"].clone()
    }

    #[test]
    fn remove_book_author_returns_the_orphaned_book() {
        let server = LibraryServer::in_memory();
        let king = server.seed_author("Stephen", "King").unwrap();
        server.seed_book("It", Some(king)).unwrap();

        let res = run(&server, &catalog::remove_book_author(), json!({ "input": { "id": "b:1" } }));
        assert_eq!(
            res.data.unwrap()["removeBookAuthor"],
            json!({ "__typename": "Book", "id": "b:1", "author": null })
        );
        assert_eq!(book_author(&server, "b:1"), Value::Null);
    }

    #[test]
    fn add_author_requires_both_names() {
        let server = LibraryServer::in_memory();
        let res = run(&server, &catalog::add_author(), json!({ "input": { "firstName": "Cher" } }));
        assert_eq!(res.errors[0].message, "Required field 'lastName' is missing");

        let res = run(
            &server,
            &catalog::add_author(),
            json!({ "input": { "firstName": "Iain", "lastName": "Banks" } }),
        );
        assert_eq!(res.data.unwrap()["addAuthor"]["id"], json!("a:1"));
    }

    #[test]
    fn update_author_moves_books() {
        let server = LibraryServer::in_memory();
        let a = server.seed_author("A", "One").unwrap();
        server.seed_author("B", "Two").unwrap();
        server.seed_book("Moved", Some(a)).unwrap();

        let res = run(
            &server,
            &catalog::update_author(),
            json!({ "input": { "id": "a:2", "bookIds": ["b:1"] } }),
        );
        let author = &res.data.unwrap()["updateAuthor"];
        assert_eq!(author["books"][0]["id"], json!("b:1"));
        assert_eq!(book_author(&server, "b:1")["id"], json!("a:2"));
    }

    #[test]
    fn update_author_with_unknown_book_changes_nothing() {
        let server = LibraryServer::in_memory();
        server.seed_author("A", "One").unwrap();
        server.seed_book("Kept", None).unwrap();
        let res = run(
            &server,
            &catalog::update_author(),
            json!({ "input": { "id": "a:1", "bookIds": ["b:1", "b:7"] } }),
        );
        assert_eq!(res.errors[0].message, "Book not found: b:7");
        assert_eq!(book_author(&server, "b:1"), Value::Null);
    }

    #[test]
    fn update_author_with_unknown_book_keeps_the_old_names() {
        let server = LibraryServer::in_memory();
        server.seed_author("A", "One").unwrap();
        let res = run(
            &server,
            &catalog::update_author(),
            json!({ "input": { "id": "a:1", "firstName": "Changed", "bookIds": ["b:7"] } }),
        );
        assert_eq!(res.errors[0].message, "Book not found: b:7");

        let res = run(&server, &catalog::author(), json!({ "id": "a:1" }));
        let author = &res.data.unwrap()["author"];
        assert_eq!(author["firstName"], json!("A"));
        assert_eq!(author["lastName"], json!("One"));
    }

    #[test]
    fn add_author_with_unknown_book_adds_nobody() {
        let server = LibraryServer::in_memory();
        let res = run(
            &server,
            &catalog::add_author(),
            json!({ "input": { "firstName": "Iain", "lastName": "Banks", "bookIds": ["b:7"] } }),
        );
        assert_eq!(res.errors[0].message, "Book not found: b:7");

        let res = run(&server, &catalog::authors(), json!({ "filter": {} }));
        assert_eq!(res.data.unwrap()["authors"], json!([]));
    }

    #[test]
    fn delete_author_orphans_its_books() {
        let server = LibraryServer::in_memory();
        let a = server.seed_author("A", "One").unwrap();
        server.seed_book("Orphan", Some(a)).unwrap();

        let res = run(&server, &catalog::delete_author(), json!({ "input": { "id": "a:1" } }));
        assert_eq!(
            res.data.unwrap()["deleteAuthor"],
            json!({ "__typename": "AuthorDeleteResult", "id": "a:1" })
        );
        assert_eq!(book_author(&server, "b:1"), Value::Null);
    }

    #[test]
    fn delete_author_books_only_detaches_owned_books() {
        let server = LibraryServer::in_memory();
        let a = server.seed_author("A", "One").unwrap();
        let b = server.seed_author("B", "Two").unwrap();
        server.seed_book("Mine", Some(a)).unwrap();
        server.seed_book("Theirs", Some(b)).unwrap();

        let res = run(
            &server,
            &catalog::delete_author_books(),
            json!({ "input": { "id": "a:1", "bookIds": ["b:1", "b:2"] } }),
        );
        assert_eq!(res.data.unwrap()["deleteAuthorBooks"]["books"], json!([]));
        assert_eq!(book_author(&server, "b:2")["id"], json!("a:2"));
    }

    #[test]
    fn add_book_rejects_unknown_author() {
        let server = LibraryServer::in_memory();
        let res = run(
            &server,
            &catalog::add_book(),
            json!({ "input": { "title": "Lost", "authorId": "a:3" } }),
        );
        assert_eq!(res.errors[0].message, "Author not found: a:3");

        let res = run(&server, &catalog::add_book(), json!({ "input": {} }));
        assert_eq!(res.errors[0].message, "Required field 'title' is missing");
    }

    #[test]
    fn update_and_delete_book() {
        let server = LibraryServer::in_memory();
        server.seed_author("A", "One").unwrap();
        server.seed_book("Draft", None).unwrap();

        let res = run(
            &server,
            &catalog::update_book(),
            json!({ "input": { "id": "b:1", "title": "Final", "authorId": "a:1" } }),
        );
        let book = &res.data.unwrap()["updateBook"];
        assert_eq!(book["title"], json!("Final"));
        assert_eq!(book["author"]["books"], json!([{ "__typename": "Book", "id": "b:1" }]));

        let res = run(&server, &catalog::delete_book(), json!({ "input": { "id": "b:1" } }));
        assert!(res.is_ok());
        let res = run(&server, &catalog::delete_book(), json!({ "input": { "id": "b:1" } }));
        assert_eq!(res.errors[0].message, "Book not found: b:1");
    }
}
