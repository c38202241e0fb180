//! Identity domain type.
//!
//! An `Identity` is the user record handed out by the identity provider.
//! The hub never mutates it; a new record is fetched whenever the session
//! changes.

use chrono::{DateTime, Utc};
use luminarch_core::IdentityId;
use serde::{Deserialize, Serialize};

/// An authenticated user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned identifier.
    id: IdentityId,
    /// Email address used to sign in.
    email: String,
    /// `full_name` from the sign-up metadata.
    full_name: Option<String>,
    /// `name` from the provider metadata (some providers fill this instead).
    name: Option<String>,
    /// When the account was created.
    created_at: DateTime<Utc>,
}

impl Identity {
    /// Creates an identity without display-name metadata.
    #[must_use]
    pub fn new(id: IdentityId, email: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            email,
            full_name: None,
            name: None,
            created_at,
        }
    }

    /// Sets the `full_name` metadata.
    #[must_use]
    pub fn with_full_name(mut self, full_name: Option<String>) -> Self {
        self.full_name = full_name.filter(|n| !n.trim().is_empty());
        self
    }

    /// Sets the `name` metadata.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|n| !n.trim().is_empty());
        self
    }

    /// Returns the identity's ID.
    #[must_use]
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the `full_name` metadata, if present.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Returns when the account was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the name shown in the dashboard greeting.
    ///
    /// Falls back from `full_name` to `name` to the local part of the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or(&self.email)
                    .to_string()
            })
    }

    /// Returns the name recorded on tickets: `full_name`, else the email.
    #[must_use]
    pub fn client_name(&self) -> String {
        self.full_name
            .clone()
            .unwrap_or_else(|| self.email.clone())
    }

    /// Returns the "member since" label, e.g. `Jan 2026`.
    #[must_use]
    pub fn member_since(&self) -> String {
        self.created_at.format("%b %Y").to_string()
    }
}
