//! User-facing notifications.
//!
//! Every remote failure in the hub ends up as a message shown to the user.
//! The presentation layer decides how (toast, console line, ...); the core
//! only hands over the text and a severity and never waits for an answer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// An operation completed.
    Success,
    /// An operation failed or was rejected.
    Error,
}

impl Severity {
    /// Returns the severity name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives fire-and-forget messages for the user.
pub trait Notifier: Send + Sync {
    /// Shows a message with the given severity.
    fn notify(&self, message: &str, severity: Severity);

    /// Shows an error message.
    fn error(&self, message: &str) {
        self.notify(message, Severity::Error);
    }

    /// Shows a success message.
    fn success(&self, message: &str) {
        self.notify(message, Severity::Success);
    }
}
