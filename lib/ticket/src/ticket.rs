//! Ticket domain types.
//!
//! A `TicketDraft` is what the new-ticket form collects. It becomes a
//! `NewTicket` only after validation, and a `Ticket` only after the store
//! has assigned it an id and a creation time.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use luminarch_core::{IdentityId, TicketId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of change the client is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Text or media changes on existing pages.
    ContentUpdate,
    /// Layout or visual changes.
    DesignChange,
    /// Something is broken.
    BugReport,
    /// Anything else.
    Other,
}

impl RequestType {
    /// Every request type, in form order.
    pub const ALL: [Self; 4] = [
        Self::ContentUpdate,
        Self::DesignChange,
        Self::BugReport,
        Self::Other,
    ];

    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentUpdate => "content_update",
            Self::DesignChange => "design_change",
            Self::BugReport => "bug_report",
            Self::Other => "other",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ContentUpdate => "Content Update",
            Self::DesignChange => "Design Change",
            Self::BugReport => "Bug Report",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownRequestType {
                value: s.to_string(),
            })
    }
}

/// How quickly the client needs the change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

impl Priority {
    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
        }
    }

    #[must_use]
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Urgent)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Where a ticket is in the admin workflow.
///
/// Statuses are written by administrators outside the hub. A value the hub
/// does not know is kept verbatim in `Other` so one odd row cannot break the
/// whole feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    #[default]
    Submitted,
    InReview,
    InProgress,
    Deployed,
    Other(String),
}

impl TicketStatus {
    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "submitted",
            Self::InReview => "in_review",
            Self::InProgress => "in_progress",
            Self::Deployed => "deployed",
            Self::Other(raw) => raw,
        }
    }

    /// Returns the human-readable label; unknown values are shown raw.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Submitted => "Submitted",
            Self::InReview => "In Review",
            Self::InProgress => "In Progress",
            Self::Deployed => "Deployed",
            Self::Other(raw) => raw,
        }
    }

    /// Returns true once the change is live.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Deployed)
    }
}

impl From<String> for TicketStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "submitted" => Self::Submitted,
            "in_review" => Self::InReview,
            "in_progress" => Self::InProgress,
            "deployed" => Self::Deployed,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for TicketStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Store-assigned identifier.
    pub id: TicketId,
    /// Owner of the ticket.
    pub user_id: IdentityId,
    /// Owner's name at submission time.
    pub client_name: String,
    pub website_url: Option<String>,
    pub request_type: RequestType,
    pub subject: String,
    pub description: String,
    pub priority: Priority,
    pub status: TicketStatus,
    /// Notes written by an administrator, shown read-only.
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw input from the new-ticket form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDraft {
    /// Selected request type; empty when nothing was chosen.
    pub request_type: String,
    pub subject: String,
    pub description: String,
    pub website_url: String,
    pub priority: Priority,
}

impl TicketDraft {
    /// Checks the draft and produces the values to insert.
    ///
    /// Subject, description and website URL are trimmed. An empty URL is
    /// stored as absent.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: missing or unknown request type,
    /// then empty subject, then empty description.
    pub fn validate(&self) -> Result<NewTicket, ValidationError> {
        let request_type = self.request_type.trim();
        if request_type.is_empty() {
            return Err(ValidationError::MissingRequestType);
        }
        let request_type = request_type.parse::<RequestType>()?;

        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let website_url = Some(self.website_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(NewTicket {
            request_type,
            subject: subject.to_string(),
            description: description.to_string(),
            website_url,
            priority: self.priority,
        })
    }
}

/// A validated ticket ready for insertion.
///
/// Only `TicketDraft::validate` can build one, so holding a `NewTicket`
/// means the required fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    request_type: RequestType,
    subject: String,
    description: String,
    website_url: Option<String>,
    priority: Priority,
}

impl NewTicket {
    #[must_use]
    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn website_url(&self) -> Option<&str> {
        self.website_url.as_deref()
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Materializes the ticket the store created for this input.
    ///
    /// New tickets always start `Submitted` without admin notes.
    #[must_use]
    pub fn into_ticket(
        self,
        id: TicketId,
        user_id: IdentityId,
        client_name: String,
        created_at: DateTime<Utc>,
    ) -> Ticket {
        Ticket {
            id,
            user_id,
            client_name,
            website_url: self.website_url,
            request_type: self.request_type,
            subject: self.subject,
            description: self.description,
            priority: self.priority,
            status: TicketStatus::Submitted,
            admin_notes: None,
            created_at,
        }
    }
}
