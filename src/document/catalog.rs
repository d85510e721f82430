//! The operations the application issues.
//!
//! Selections match what each screen reads; mutations select enough of the
//! result for the cache to merge it back into existing records.

use super::{Document, Field};

fn book_with_author_id() -> Vec<Field> {
    vec![
        Field::scalar("id"),
        Field::scalar("title"),
        Field::object("author", vec![Field::scalar("id")]),
    ]
}

fn author_listing_fields() -> Vec<Field> {
    vec![
        Field::scalar("id"),
        Field::scalar("firstName"),
        Field::scalar("lastName"),
        Field::client("fullName"),
        Field::object("books", book_with_author_id()),
    ]
}

/// `query Authors($filter: AuthorFilter!, $sortBy: AuthorSortType)`.
///
/// The parent listing used by the relation patcher; the screens issue it
/// with `{ "filter": {} }`.
#[must_use]
pub fn authors() -> Document {
    Document::query(
        "Authors",
        Field::object("authors", author_listing_fields())
            .with_variable_arg("filter", "filter")
            .with_variable_arg("sortBy", "sortBy"),
    )
    .with_variable("filter", "AuthorFilter!")
    .with_variable("sortBy", "AuthorSortType")
}

/// `query Author($id: ID!)`.
#[must_use]
pub fn author() -> Document {
    Document::query(
        "Author",
        Field::object("author", author_listing_fields()).with_variable_arg("id", "id"),
    )
    .with_variable("id", "ID!")
}

/// `query Books`.
#[must_use]
pub fn books() -> Document {
    Document::query("Books", Field::object("books", book_with_author_id()))
}

/// `query Book($id: ID!)`.
#[must_use]
pub fn book() -> Document {
    Document::query(
        "Book",
        Field::object(
            "book",
            vec![
                Field::scalar("id"),
                Field::scalar("title"),
                Field::object(
                    "author",
                    vec![
                        Field::scalar("id"),
                        Field::scalar("firstName"),
                        Field::scalar("lastName"),
                    ],
                ),
            ],
        )
        .with_variable_arg("id", "id"),
    )
    .with_variable("id", "ID!")
}

/// `mutation addAuthor($input: AuthorInput!)`.
#[must_use]
pub fn add_author() -> Document {
    Document::mutation(
        "addAuthor",
        Field::object(
            "addAuthor",
            vec![
                Field::scalar("id"),
                Field::scalar("firstName"),
                Field::scalar("lastName"),
            ],
        )
        .with_variable_arg("input", "input"),
    )
    .with_variable("input", "AuthorInput!")
}

/// `mutation updateAuthor($input: AuthorInput!)`.
#[must_use]
pub fn update_author() -> Document {
    Document::mutation(
        "updateAuthor",
        Field::object(
            "updateAuthor",
            vec![
                Field::scalar("id"),
                Field::scalar("firstName"),
                Field::scalar("lastName"),
                Field::object(
                    "books",
                    vec![
                        Field::scalar("id"),
                        Field::scalar("title"),
                        Field::object(
                            "author",
                            vec![
                                Field::scalar("id"),
                                Field::scalar("firstName"),
                                Field::scalar("lastName"),
                            ],
                        ),
                    ],
                ),
            ],
        )
        .with_variable_arg("input", "input"),
    )
    .with_variable("input", "AuthorInput!")
}

/// `mutation deleteAuthor($input: AuthorDeleteInput!)`.
#[must_use]
pub fn delete_author() -> Document {
    Document::mutation(
        "deleteAuthor",
        Field::object("deleteAuthor", vec![Field::scalar("id")]).with_variable_arg("input", "input"),
    )
    .with_variable("input", "AuthorDeleteInput!")
}

/// `mutation deleteAuthorBooks($input: AuthorBookInput!)`.
#[must_use]
pub fn delete_author_books() -> Document {
    Document::mutation(
        "deleteAuthorBooks",
        Field::object(
            "deleteAuthorBooks",
            vec![
                Field::scalar("id"),
                Field::scalar("firstName"),
                Field::scalar("lastName"),
                Field::object("books", book_with_author_id()),
            ],
        )
        .with_variable_arg("input", "input"),
    )
    .with_variable("input", "AuthorBookInput!")
}

/// `mutation addBook($input: BookInput!)`.
#[must_use]
pub fn add_book() -> Document {
    Document::mutation(
        "addBook",
        Field::object("addBook", book_with_author_id()).with_variable_arg("input", "input"),
    )
    .with_variable("input", "BookInput!")
}

/// `mutation updateBook($input: BookInput!)`.
#[must_use]
pub fn update_book() -> Document {
    Document::mutation(
        "updateBook",
        Field::object(
            "updateBook",
            vec![
                Field::scalar("id"),
                Field::scalar("title"),
                Field::object(
                    "author",
                    vec![
                        Field::scalar("id"),
                        Field::object("books", vec![Field::scalar("id")]),
                    ],
                ),
            ],
        )
        .with_variable_arg("input", "input"),
    )
    .with_variable("input", "BookInput!")
}

/// `mutation deleteBook($input: BookDeleteInput!)`.
#[must_use]
pub fn delete_book() -> Document {
    Document::mutation(
        "deleteBook",
        Field::object("deleteBook", vec![Field::scalar("id")]).with_variable_arg("input", "input"),
    )
    .with_variable("input", "BookDeleteInput!")
}

/// `mutation removeBookAuthor($input: BookAuthorInput!)`.
///
/// The server only returns the book id and its (now null) author, which is
/// why the caller repairs the author listing itself.
#[must_use]
pub fn remove_book_author() -> Document {
    Document::mutation(
        "removeBookAuthor",
        Field::object(
            "removeBookAuthor",
            vec![
                Field::scalar("id"),
                Field::object("author", vec![Field::scalar("id")]),
            ],
        )
        .with_variable_arg("input", "input"),
    )
    .with_variable("input", "BookAuthorInput!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_a_distinct_hash() {
        let docs = [
            authors(),
            author(),
            books(),
            book(),
            add_author(),
            update_author(),
            delete_author(),
            delete_author_books(),
            add_book(),
            update_book(),
            delete_book(),
            remove_book_author(),
        ];
        let mut hashes: Vec<String> = docs.iter().map(Document::hash).collect();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), docs.len());
    }

    #[test]
    fn mutations_are_marked() {
        assert!(remove_book_author().is_mutation());
        assert!(!authors().is_mutation());
    }
}
