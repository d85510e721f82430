//! Author screens: the listing, the detail page and their dialogs.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::MutationOptions;
use crate::dialog::{DialogAction, FormAction};
use crate::document::catalog;
use crate::entity::{AuthorId, BookId};
use crate::error::{BooksError, BooksResult, ValidationError};
use crate::schema::{AuthorBookInput, AuthorDeleteInput, AuthorFilter, AuthorInput, AuthorSortType};
use crate::validation::validate_author_names;

use super::{decode, input_variables, AuthorView, BookView, FormMode, Session};

fn all_authors() -> Value {
    json!({ "filter": {} })
}

/// The authors listing, optionally filtered and sorted.
///
/// # Errors
/// Query failures, which are also shown on the session's alert channel.
pub fn list_authors(
    session: &Session,
    filter: &AuthorFilter,
    sort: Option<AuthorSortType>,
) -> BooksResult<Vec<AuthorView>> {
    let mut vars = Map::new();
    vars.insert(
        "filter".to_string(),
        serde_json::to_value(filter).map_err(|e| BooksError::internal(format!("encode filter: {e}")))?,
    );
    if let Some(sort) = sort {
        vars.insert("sortBy".to_string(), json!(sort));
    }
    let data = session
        .client
        .query(&session.alerts, &catalog::authors(), &Value::Object(vars))?;
    decode(&data, "authors")
}

/// Books that have no author, offered for assignment.
///
/// # Errors
/// Query failures.
pub fn unassigned_books(session: &Session) -> BooksResult<Vec<BookView>> {
    let data = session
        .client
        .query(&session.alerts, &catalog::books(), &Value::Null)?;
    let books: Vec<BookView> = decode(&data, "books")?;
    Ok(books.into_iter().filter(|b| b.author.is_none()).collect())
}

/// Give `book_id` to `author_id`.
///
/// # Errors
/// Mutation failures.
pub fn assign_book_to_author(session: &Session, author_id: AuthorId, book_id: BookId) -> BooksResult<AuthorView> {
    let vars = input_variables(&AuthorInput {
        id: Some(author_id),
        book_ids: Some(vec![book_id]),
        ..AuthorInput::default()
    })?;
    let data = session
        .client
        .mutate(&session.alerts, &catalog::update_author(), &vars, MutationOptions::new())?;
    decode(&data, "updateAuthor")
}

/// "Delete Author" confirmation. Refetches the authors listing.
#[derive(Clone)]
pub struct DeleteAuthor {
    session: Session,
    author_id: AuthorId,
}

impl DeleteAuthor {
    /// Delete `author_id` once confirmed.
    #[must_use]
    pub fn new(session: Session, author_id: AuthorId) -> Self {
        Self { session, author_id }
    }
}

impl DialogAction for DeleteAuthor {
    fn run(&mut self) -> BooksResult<bool> {
        let vars = input_variables(&AuthorDeleteInput { id: self.author_id })?;
        self.session.client.mutate(
            &self.session.alerts,
            &catalog::delete_author(),
            &vars,
            MutationOptions::new().refetch(catalog::authors(), all_authors()),
        )?;
        Ok(true)
    }
}

/// "Remove Book" confirmation on an author's page.
///
/// Detaches the book server side and refetches the books listing. The
/// cached author listing is not repaired locally.
#[derive(Clone)]
pub struct DeleteAuthorBook {
    session: Session,
    author_id: AuthorId,
    book_id: BookId,
}

impl DeleteAuthorBook {
    /// Take `book_id` away from `author_id` once confirmed.
    #[must_use]
    pub fn new(session: Session, author_id: AuthorId, book_id: BookId) -> Self {
        Self {
            session,
            author_id,
            book_id,
        }
    }
}

impl DialogAction for DeleteAuthorBook {
    fn run(&mut self) -> BooksResult<bool> {
        let vars = input_variables(&AuthorBookInput {
            id: self.author_id,
            book_ids: vec![self.book_id],
        })?;
        self.session.client.mutate(
            &self.session.alerts,
            &catalog::delete_author_books(),
            &vars,
            MutationOptions::new().refetch(catalog::books(), Value::Null),
        )?;
        Ok(true)
    }
}

/// Values of the "Create Author" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorForm {
    /// First name input.
    pub first_name: String,
    /// Last name input.
    pub last_name: String,
}

/// "Create Author" form submission.
#[derive(Clone)]
pub struct CreateAuthor {
    session: Session,
}

impl CreateAuthor {
    /// Submit through `session`.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl FormAction for CreateAuthor {
    type Form = AuthorForm;

    fn submit(&mut self, form: &AuthorForm) -> BooksResult<bool> {
        validate_author_names(&form.first_name, &form.last_name)?;
        let vars = input_variables(&AuthorInput {
            first_name: Some(form.first_name.clone()),
            last_name: Some(form.last_name.clone()),
            ..AuthorInput::default()
        })?;
        self.session.client.mutate(
            &self.session.alerts,
            &catalog::add_author(),
            &vars,
            MutationOptions::new().refetch(catalog::authors(), all_authors()),
        )?;
        Ok(true)
    }
}

/// The author detail page.
pub struct AuthorEditor {
    session: Session,
    author_id: AuthorId,
    author: Option<AuthorView>,
    mode: FormMode,
    first_name: String,
    last_name: String,
    errors: Vec<String>,
}

impl AuthorEditor {
    /// A page for `author_id`; call [`load`](Self::load) to fetch it.
    #[must_use]
    pub fn new(session: Session, author_id: AuthorId) -> Self {
        Self {
            session,
            author_id,
            author: None,
            mode: FormMode::View,
            first_name: String::new(),
            last_name: String::new(),
            errors: Vec::new(),
        }
    }

    /// Fetch the author and fill the form with its names.
    ///
    /// # Errors
    /// Query failures.
    pub fn load(&mut self) -> BooksResult<&AuthorView> {
        let data = self.session.client.query(
            &self.session.alerts,
            &catalog::author(),
            &json!({ "id": self.author_id }),
        )?;
        let author: AuthorView = decode(&data, "author")?;
        self.first_name.clone_from(&author.first_name);
        self.last_name.clone_from(&author.last_name);
        Ok(self.author.insert(author))
    }

    /// The loaded author.
    #[must_use]
    pub fn author(&self) -> Option<&AuthorView> {
        self.author.as_ref()
    }

    /// Viewing or editing.
    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
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

    /// Edit the first name.
    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.first_name = value.into();
    }

    /// Edit the last name.
    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.last_name = value.into();
    }

    /// Save is offered only when both names are filled in.
    #[must_use]
    pub fn can_save(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty()
    }

    /// Leave edit mode, restoring the loaded names.
    pub fn cancel(&mut self) {
        self.mode = FormMode::View;
        if let Some(author) = &self.author {
            self.first_name.clone_from(&author.first_name);
            self.last_name.clone_from(&author.last_name);
        }
        self.errors.clear();
    }

    /// Validate and send the edited names.
    ///
    /// # Errors
    /// Validation failures (kept in [`errors`](Self::errors), edit mode stays
    /// on) and mutation failures.
    pub fn save(&mut self) -> BooksResult<&AuthorView> {
        if let Err(err) = validate_author_names(&self.first_name, &self.last_name) {
            if let ValidationError::Form { messages } = &err {
                self.errors.clone_from(messages);
            }
            return Err(err.into());
        }
        let vars = input_variables(&AuthorInput {
            id: Some(self.author_id),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            book_ids: None,
        })?;
        let data = self.session.client.mutate(
            &self.session.alerts,
            &catalog::update_author(),
            &vars,
            MutationOptions::new(),
        )?;
        debug!(author = %self.author_id, "author saved");
        self.mode = FormMode::View;
        self.errors.clear();
        let author: AuthorView = decode(&data, "updateAuthor")?;
        Ok(self.author.insert(author))
    }

    /// Assign a book to this author and refresh the page's copy.
    ///
    /// # Errors
    /// Mutation failures.
    pub fn assign_book(&mut self, book_id: BookId) -> BooksResult<&AuthorView> {
        let author = assign_book_to_author(&self.session, self.author_id, book_id)?;
        Ok(self.author.insert(author))
    }
}
