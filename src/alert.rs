//! The application-wide alert channel.
//!
//! An [`AlertContext`] is created once at startup and handed to every
//! operation that can fail. Cloning it shares the same underlying state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::ir::GraphQlError;

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlertLevel {
    /// Something failed.
    Error,
    /// Neutral notice.
    #[default]
    Info,
    /// An action completed.
    Success,
    /// Something needs attention.
    Warning,
}

/// Background and text colors of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPalette {
    /// CSS color of the banner.
    pub background: &'static str,
    /// CSS color of the message.
    pub text: &'static str,
}

const TEXT_COLOR: &str = "#FFFFFF";

impl AlertLevel {
    /// Colors used to render this level.
    #[must_use]
    pub const fn palette(self) -> AlertPalette {
        let background = match self {
            Self::Error => "#e52418",
            Self::Info => "#0094fb",
            Self::Success => "#14e54b",
            Self::Warning => "#fbaa00",
        };
        AlertPalette {
            background,
            text: TEXT_COLOR,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "Error",
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Warning => "Warning",
        };
        f.write_str(name)
    }
}

/// What the alert banner currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertState {
    /// Severity of the current message.
    pub level: AlertLevel,
    /// Text shown on the banner.
    pub message: String,
    /// Whether the banner is visible.
    pub open: bool,
    /// When the current message was shown.
    pub shown_at: Option<DateTime<Utc>>,
}

/// Shared handle to the alert banner.
#[derive(Debug, Clone, Default)]
pub struct AlertContext {
    state: Arc<Mutex<AlertState>>,
}

impl AlertContext {
    /// A closed, empty alert.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn show(&self, level: AlertLevel, message: impl Into<String>) {
        *self.state.lock() = AlertState {
            level,
            message: message.into(),
            open: true,
            shown_at: Some(Utc::now()),
        };
    }

    /// Show an error.
    pub fn show_error(&self, message: impl Into<String>) {
        self.show(AlertLevel::Error, message);
    }

    /// Show a warning.
    pub fn show_warning(&self, message: impl Into<String>) {
        self.show(AlertLevel::Warning, message);
    }

    /// Show a success notice.
    pub fn show_success(&self, message: impl Into<String>) {
        self.show(AlertLevel::Success, message);
    }

    /// Show an informational notice.
    pub fn show_info(&self, message: impl Into<String>) {
        self.show(AlertLevel::Info, message);
    }

    /// Close the banner and clear its message.
    pub fn dismiss(&self) {
        let mut state = self.state.lock();
        state.message.clear();
        state.open = false;
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AlertState {
        self.state.lock().clone()
    }

    /// Returns true while the banner is shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }
}

/// Holds the last list of GraphQL errors as a single line.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    message: Arc<Mutex<String>>,
}

impl ErrorContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the message with `errors`, joined by `,`.
    pub fn set_errors(&self, errors: &[GraphQlError]) {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(",");
        *self.message.lock() = joined;
    }

    /// The current message, empty when no errors were set.
    #[must_use]
    pub fn message(&self) -> String {
        self.message.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_and_dismiss() {
        let alerts = AlertContext::new();
        assert!(!alerts.is_open());

        alerts.show_warning("careful");
        let state = alerts.state();
        assert!(state.open);
        assert_eq!(state.level, AlertLevel::Warning);
        assert_eq!(state.message, "careful");
        assert!(state.shown_at.is_some());

        alerts.dismiss();
        let state = alerts.state();
        assert!(!state.open);
        assert_eq!(state.message, "");
    }

    #[test]
    fn clones_share_state() {
        let alerts = AlertContext::new();
        let handle = alerts.clone();
        handle.show_error("Author not found: a:9");
        assert_eq!(alerts.state().level, AlertLevel::Error);
        assert_eq!(alerts.state().message, "Author not found: a:9");
    }

    #[test]
    fn palette_matches_levels() {
        assert_eq!(AlertLevel::Error.palette().background, "#e52418");
        assert_eq!(AlertLevel::Warning.palette().background, "#fbaa00");
        assert_eq!(AlertLevel::Success.palette().background, "#14e54b");
        assert_eq!(AlertLevel::Info.palette().background, "#0094fb");
        assert_eq!(AlertLevel::default(), AlertLevel::Info);
        assert!([AlertLevel::Error, AlertLevel::Info]
            .iter()
            .all(|l| l.palette().text == "#FFFFFF"));
    }

    #[test]
    fn error_context_joins_without_spaces() {
        let errors = ErrorContext::new();
        errors.set_errors(&[GraphQlError::new("first"), GraphQlError::new("second")]);
        assert_eq!(errors.message(), "first,second");
    }
}
