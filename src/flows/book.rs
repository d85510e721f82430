//! Book screens: the listing, the detail page and their dialogs.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::MutationOptions;
use crate::dialog::{DialogAction, FormAction};
use crate::document::catalog;
use crate::entity::{AuthorId, BookId};
use crate::error::{BooksError, BooksResult, ExecutionError, ValidationError};
use crate::ir::GraphQlError;
use crate::patch::{PatchOutcome, RelationCachePatcher, RelationEdge};
use crate::schema::{BookAuthorInput, BookDeleteInput, BookInput};
use crate::validation::validate_title;

use super::{decode, input_variables, BookView, FormMode, Session};

/// Where the book detail page goes after its book is deleted.
pub const BOOKS_ROUTE: &str = "/books";

/// The books listing.
///
/// # Errors
/// Query failures, which are also shown on the session's alert channel.
pub fn list_books(session: &Session) -> BooksResult<Vec<BookView>> {
    let data = session
        .client
        .query(&session.alerts, &catalog::books(), &Value::Null)?;
    decode(&data, "books")
}

/// Make `author_id` the author of `book_id`.
///
/// # Errors
/// Mutation failures.
pub fn assign_author_to_book(session: &Session, book_id: BookId, author_id: AuthorId) -> BooksResult<BookView> {
    let vars = input_variables(&BookInput {
        id: Some(book_id),
        author_id: Some(author_id),
        ..BookInput::default()
    })?;
    let data = session
        .client
        .mutate(&session.alerts, &catalog::update_book(), &vars, MutationOptions::new())?;
    decode(&data, "updateBook")
}

/// "Remove Author" confirmation on a book's page.
///
/// The server answers with the book alone, so the cached authors listing is
/// repaired in place with a [`RelationCachePatcher`] instead of a refetch.
#[derive(Clone)]
pub struct RemoveBookAuthor {
    session: Session,
    book_id: BookId,
    outcome: Option<PatchOutcome>,
}

impl RemoveBookAuthor {
    /// Detach `book_id` from its author once confirmed.
    #[must_use]
    pub fn new(session: Session, book_id: BookId) -> Self {
        Self {
            session,
            book_id,
            outcome: None,
        }
    }

    /// What the cache repair did on the last successful run.
    #[must_use]
    pub fn outcome(&self) -> Option<&PatchOutcome> {
        self.outcome.as_ref()
    }
}

impl DialogAction for RemoveBookAuthor {
    fn run(&mut self) -> BooksResult<bool> {
        let vars = input_variables(&BookAuthorInput { id: self.book_id })?;
        let child_id = self.book_id.to_string();
        let mut outcome = None;
        self.session.client.mutate(
            &self.session.alerts,
            &catalog::remove_book_author(),
            &vars,
            MutationOptions::new().update(|cache, _| {
                outcome = Some(RelationCachePatcher::new(cache).detach_child(&RelationEdge::authors_books(), &child_id));
            }),
        )?;
        if let Some(outcome) = &outcome {
            if !outcome.is_detached() {
                debug!(book = %self.book_id, ?outcome, "author listing left as is");
            }
        }
        self.outcome = outcome;
        Ok(true)
    }
}

/// "Delete Book" confirmation. Refetches the books listing and leaves the
/// detail page for [`BOOKS_ROUTE`].
#[derive(Clone)]
pub struct DeleteBook {
    session: Session,
    book_id: BookId,
    redirect: Option<&'static str>,
}

impl DeleteBook {
    /// Delete `book_id` once confirmed.
    #[must_use]
    pub fn new(session: Session, book_id: BookId) -> Self {
        Self {
            session,
            book_id,
            redirect: None,
        }
    }

    /// The route to show next, set once the book is gone.
    #[must_use]
    pub const fn redirect(&self) -> Option<&'static str> {
        self.redirect
    }
}

impl DialogAction for DeleteBook {
    fn run(&mut self) -> BooksResult<bool> {
        let vars = input_variables(&BookDeleteInput { id: self.book_id })?;
        self.session.client.mutate(
            &self.session.alerts,
            &catalog::delete_book(),
            &vars,
            MutationOptions::new().refetch(catalog::books(), Value::Null),
        )?;
        self.redirect = Some(BOOKS_ROUTE);
        Ok(true)
    }
}

/// Values of the "Create Book" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    /// Title input.
    pub title: String,
}

impl BookForm {
    /// Create is offered only once a title is typed.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.title.is_empty()
    }
}

/// "Create Book" form submission.
#[derive(Clone)]
pub struct CreateBook {
    session: Session,
}

impl CreateBook {
    /// Submit through `session`.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl FormAction for CreateBook {
    type Form = BookForm;

    fn submit(&mut self, form: &BookForm) -> BooksResult<bool> {
        validate_title(&form.title)?;
        let vars = input_variables(&BookInput {
            title: Some(form.title.clone()),
            ..BookInput::default()
        })?;
        self.session.client.mutate(
            &self.session.alerts,
            &catalog::add_book(),
            &vars,
            MutationOptions::new().refetch(catalog::books(), Value::Null),
        )?;
        Ok(true)
    }
}

/// The book detail page.
pub struct BookEditor {
    session: Session,
    book_id: BookId,
    book: Option<BookView>,
    mode: FormMode,
    title: String,
    errors: Vec<String>,
}

impl BookEditor {
    /// A page for `book_id`; call [`load`](Self::load) to fetch it.
    #[must_use]
    pub fn new(session: Session, book_id: BookId) -> Self {
        Self {
            session,
            book_id,
            book: None,
            mode: FormMode::View,
            title: String::new(),
            errors: Vec::new(),
        }
    }

    /// Fetch the book.
    ///
    /// A failed load is also published on the session's error channel so the
    /// page can render it in place of the book.
    ///
    /// # Errors
    /// Query failures.
    pub fn load(&mut self) -> BooksResult<&BookView> {
        let loaded = self
            .session
            .client
            .query(&self.session.alerts, &catalog::book(), &json!({ "id": self.book_id }))
            .and_then(|data| decode::<Option<BookView>>(&data, "book"))
            .and_then(|book| {
                book.ok_or_else(|| BooksError::internal(format!("Book not found: {}", self.book_id)))
            });
        match loaded {
            Ok(book) => {
                self.title.clone_from(&book.title);
                Ok(self.book.insert(book))
            }
            Err(err) => {
                warn!(book = %self.book_id, error = %err, "book failed to load");
                match &err {
                    BooksError::Execution(ExecutionError::GraphQl { errors }) => self.session.errors.set_errors(errors),
                    other => self.session.errors.set_errors(&[GraphQlError::new(other.to_string())]),
                }
                Err(err)
            }
        }
    }

    /// The loaded book.
    #[must_use]
    pub fn book(&self) -> Option<&BookView> {
        self.book.as_ref()
    }

    /// Viewing or editing.
    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    /// The title being edited.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Messages from the last rejected save.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Switch to edit mode.
    pub fn edit(&mut self) {
        self.mode = FormMode::Edit;
    }

    /// Edit the title.
    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
    }

    /// Leave edit mode, restoring the loaded title.
    pub fn cancel(&mut self) {
        self.mode = FormMode::View;
        if let Some(book) = &self.book {
            self.title.clone_from(&book.title);
        }
        self.errors.clear();
    }

    /// Validate and send the edited title.
    ///
    /// # Errors
    /// Validation failures (kept in [`errors`](Self::errors)) and mutation
    /// failures.
    pub fn save(&mut self) -> BooksResult<&BookView> {
        if let Err(err) = validate_title(&self.title) {
            if let ValidationError::Form { messages } = &err {
                self.errors.clone_from(messages);
            }
            return Err(err.into());
        }
        let vars = input_variables(&BookInput {
            id: Some(self.book_id),
            title: Some(self.title.clone()),
            author_id: None,
        })?;
        let data = self.session.client.mutate(
            &self.session.alerts,
            &catalog::update_book(),
            &vars,
            MutationOptions::new(),
        )?;
        debug!(book = %self.book_id, "book saved");
        self.mode = FormMode::View;
        self.errors.clear();
        let saved: BookView = decode(&data, "updateBook")?;
        Ok(self.merge(saved))
    }

    /// Give this book an author and refresh the page's copy.
    ///
    /// # Errors
    /// Mutation failures.
    pub fn assign_author(&mut self, author_id: AuthorId) -> BooksResult<&BookView> {
        let saved = assign_author_to_book(&self.session, self.book_id, author_id)?;
        Ok(self.merge(saved))
    }

    // `updateBook` selects only the author id; keep the names already shown
    // when the author did not change.
    fn merge(&mut self, mut saved: BookView) -> &BookView {
        if let (Some(new), Some(Some(old))) = (&mut saved.author, self.book.as_ref().map(|b| b.author.as_ref())) {
            if new.id == old.id {
                new.first_name = new.first_name.take().or_else(|| old.first_name.clone());
                new.last_name = new.last_name.take().or_else(|| old.last_name.clone());
            }
        }
        self.book.insert(saved)
    }
}
