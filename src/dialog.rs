//! Dialog controllers.
//!
//! A [`ConfirmDialog`] asks for confirmation twice before running its action:
//!
//! ```text
//! Closed --open--> ConfirmPending --proceed--> Confirmed --confirm(Ok(true))--> Closed
//! ```
//!
//! `confirm` that reports `Ok(false)` or an error leaves the dialog in
//! `Confirmed` so the user can retry. `dismiss` closes from any state.
//!
//! A [`FormDialog`] holds a form while open and closes only when its
//! submission succeeds.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::error::{BooksError, BooksResult};

/// Where a dialog is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogState {
    /// Not shown.
    Closed,
    /// Showing the "are you sure" prompt.
    ConfirmPending,
    /// Showing the action.
    Confirmed,
    /// A form dialog is showing its form.
    Open,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::ConfirmPending => "awaiting confirmation",
            Self::Confirmed => "confirmed",
            Self::Open => "open",
        };
        f.write_str(name)
    }
}

/// User events a dialog reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogEvent {
    /// Show the dialog.
    Open,
    /// Continue past the prompt.
    Proceed,
    /// Run the action.
    Confirm,
    /// Submit the form.
    Submit,
    /// Close without acting.
    Dismiss,
}

impl fmt::Display for DialogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Proceed => "proceed",
            Self::Confirm => "confirm",
            Self::Submit => "submit",
            Self::Dismiss => "dismiss",
        };
        f.write_str(name)
    }
}

/// Dialog errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    /// `event` is not accepted in `state`.
    #[error("Cannot {event} a dialog that is {state}")]
    InvalidTransition {
        /// State the dialog was in.
        state: DialogState,
        /// Event that was rejected.
        event: DialogEvent,
    },
}

fn invalid(state: DialogState, event: DialogEvent) -> BooksError {
    DialogError::InvalidTransition { state, event }.into()
}

/// The work a confirmation dialog performs.
///
/// `Ok(true)` closes the dialog; `Ok(false)` keeps it open.
pub trait DialogAction {
    /// Run the action.
    ///
    /// # Errors
    /// Any failure keeps the dialog open.
    fn run(&mut self) -> BooksResult<bool>;
}

impl<F> DialogAction for F
where
    F: FnMut() -> BooksResult<bool>,
{
    fn run(&mut self) -> BooksResult<bool> {
        self()
    }
}

/// Two-step confirmation dialog.
#[derive(Debug)]
pub struct ConfirmDialog<A> {
    title: String,
    state: DialogState,
    action: A,
}

impl<A: DialogAction> ConfirmDialog<A> {
    /// A closed dialog that runs `action` once confirmed.
    #[must_use]
    pub fn new(title: impl Into<String>, action: A) -> Self {
        Self {
            title: title.into(),
            state: DialogState::Closed,
            action,
        }
    }

    /// Heading shown by the dialog.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DialogState {
        self.state
    }

    /// Returns true unless closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state != DialogState::Closed
    }

    /// The wrapped action.
    #[must_use]
    pub fn action(&self) -> &A {
        &self.action
    }

    fn transition(&mut self, event: DialogEvent, from: DialogState, to: DialogState) -> BooksResult<()> {
        if self.state != from {
            return Err(invalid(self.state, event));
        }
        debug!(dialog = %self.title, from = %from, to = %to, "dialog transition");
        self.state = to;
        Ok(())
    }

    /// Show the "are you sure" prompt.
    ///
    /// # Errors
    /// Fails unless the dialog is closed.
    pub fn open(&mut self) -> BooksResult<()> {
        self.transition(DialogEvent::Open, DialogState::Closed, DialogState::ConfirmPending)
    }

    /// Answer "continue" to the prompt and reveal the action.
    ///
    /// # Errors
    /// Fails unless the prompt is showing.
    pub fn proceed(&mut self) -> BooksResult<()> {
        self.transition(DialogEvent::Proceed, DialogState::ConfirmPending, DialogState::Confirmed)
    }

    /// Run the action. Closes the dialog when it reports `Ok(true)`.
    ///
    /// # Errors
    /// Fails when the dialog has not been confirmed or the action fails; in
    /// the latter case the dialog stays confirmed.
    pub fn confirm(&mut self) -> BooksResult<bool> {
        if self.state != DialogState::Confirmed {
            return Err(invalid(self.state, DialogEvent::Confirm));
        }
        let done = self.action.run()?;
        if done {
            self.state = DialogState::Closed;
        }
        debug!(dialog = %self.title, done, "dialog action");
        Ok(done)
    }

    /// Close and forget the confirmation.
    pub fn dismiss(&mut self) {
        self.state = DialogState::Closed;
    }
}

/// The submission behind a form dialog.
pub trait FormAction {
    /// Values the user edits.
    type Form: Default;

    /// Submit `form`. `Ok(true)` closes the dialog.
    ///
    /// # Errors
    /// Validation failures carry the messages to show next to the form.
    fn submit(&mut self, form: &Self::Form) -> BooksResult<bool>;
}

/// A dialog holding a form.
pub struct FormDialog<F: FormAction> {
    title: String,
    open: bool,
    form: F::Form,
    errors: Vec<String>,
    action: F,
}

impl<F: FormAction> FormDialog<F> {
    /// A closed dialog with an empty form.
    #[must_use]
    pub fn new(title: impl Into<String>, action: F) -> Self {
        Self {
            title: title.into(),
            open: false,
            form: F::Form::default(),
            errors: Vec::new(),
            action,
        }
    }

    /// Heading shown by the dialog.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current state: `Open` or `Closed`.
    #[must_use]
    pub const fn state(&self) -> DialogState {
        if self.open {
            DialogState::Open
        } else {
            DialogState::Closed
        }
    }

    /// Returns true while the form is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Show the form.
    ///
    /// # Errors
    /// Fails if the form is already shown.
    pub fn open(&mut self) -> BooksResult<()> {
        if self.open {
            return Err(invalid(DialogState::Open, DialogEvent::Open));
        }
        self.open = true;
        Ok(())
    }

    /// The form values.
    #[must_use]
    pub fn form(&self) -> &F::Form {
        &self.form
    }

    /// Edit the form values.
    pub fn form_mut(&mut self) -> &mut F::Form {
        &mut self.form
    }

    /// Messages from the last failed validation.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Submit the form; on `Ok(true)` the form resets and the dialog closes.
    ///
    /// # Errors
    /// Fails when the dialog is closed or the action fails. Validation
    /// messages are kept for [`errors`](Self::errors).
    pub fn submit(&mut self) -> BooksResult<bool> {
        if !self.open {
            return Err(invalid(DialogState::Closed, DialogEvent::Submit));
        }
        match self.action.submit(&self.form) {
            Ok(true) => {
                self.reset();
                self.open = false;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                if err.is_validation() {
                    self.errors = err.messages();
                }
                Err(err)
            }
        }
    }

    /// Close and reset the form.
    pub fn dismiss(&mut self) {
        self.reset();
        self.open = false;
    }

    fn reset(&mut self) {
        self.form = F::Form::default();
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, ValidationError};

    #[test]
    fn confirm_dialog_happy_path() {
        let mut runs = 0;
        let mut dialog = ConfirmDialog::new("Remove Author", || -> BooksResult<bool> {
            runs += 1;
            Ok(true)
        });
        dialog.open().unwrap();
        assert_eq!(dialog.state(), DialogState::ConfirmPending);
        dialog.proceed().unwrap();
        assert_eq!(dialog.state(), DialogState::Confirmed);
        assert!(dialog.confirm().unwrap());
        assert_eq!(dialog.state(), DialogState::Closed);
        drop(dialog);
        assert_eq!(runs, 1);
    }

    #[test]
    fn failed_action_keeps_dialog_confirmed() {
        let mut attempts = 0;
        let mut dialog = ConfirmDialog::new("Delete Book", || -> BooksResult<bool> {
            attempts += 1;
            if attempts == 1 {
                Err(TransportError::Network {
                    message: "down".to_string(),
                }
                .into())
            } else {
                Ok(true)
            }
        });
        dialog.open().unwrap();
        dialog.proceed().unwrap();
        assert!(dialog.confirm().unwrap_err().is_network());
        assert_eq!(dialog.state(), DialogState::Confirmed);
        assert!(dialog.confirm().unwrap());
        assert!(!dialog.is_open());
    }

    #[test]
    fn illegal_events_are_rejected() {
        let mut dialog = ConfirmDialog::new("x", || -> BooksResult<bool> { Ok(true) });
        let err = dialog.confirm().unwrap_err();
        assert_eq!(
            err,
            BooksError::Dialog(DialogError::InvalidTransition {
                state: DialogState::Closed,
                event: DialogEvent::Confirm,
            })
        );
        assert!(dialog.proceed().is_err());
        dialog.open().unwrap();
        assert!(dialog.open().is_err());
        assert!(dialog.confirm().is_err());
    }

    #[test]
    fn dismiss_resets_confirmation() {
        let mut dialog = ConfirmDialog::new("x", || -> BooksResult<bool> { Ok(false) });
        dialog.open().unwrap();
        dialog.proceed().unwrap();
        assert!(!dialog.confirm().unwrap());
        assert_eq!(dialog.state(), DialogState::Confirmed);
        dialog.dismiss();
        assert_eq!(dialog.state(), DialogState::Closed);
        dialog.open().unwrap();
        assert_eq!(dialog.state(), DialogState::ConfirmPending);
    }

    #[derive(Default)]
    struct Name {
        value: String,
    }

    struct RequireName;

    impl FormAction for RequireName {
        type Form = Name;

        fn submit(&mut self, form: &Name) -> BooksResult<bool> {
            if form.value.is_empty() {
                return Err(ValidationError::Form {
                    messages: vec!["name required".to_string()],
                }
                .into());
            }
            Ok(true)
        }
    }

    #[test]
    fn form_dialog_keeps_validation_messages() {
        let mut dialog = FormDialog::new("Create", RequireName);
        assert!(dialog.submit().is_err());
        dialog.open().unwrap();

        assert!(dialog.submit().unwrap_err().is_validation());
        assert!(dialog.is_open());
        assert_eq!(dialog.errors(), ["name required"]);

        dialog.form_mut().value = "Ada".to_string();
        assert!(dialog.submit().unwrap());
        assert!(!dialog.is_open());
        assert!(dialog.form().value.is_empty());
        assert!(dialog.errors().is_empty());
    }

    #[test]
    fn form_dismiss_resets_values() {
        let mut dialog = FormDialog::new("Create", RequireName);
        dialog.open().unwrap();
        dialog.form_mut().value = "draft".to_string();
        dialog.dismiss();
        assert_eq!(dialog.state(), DialogState::Closed);
        assert!(dialog.form().value.is_empty());
    }
}
