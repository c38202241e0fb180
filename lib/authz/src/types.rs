//! Approval types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an identity may use ticketing features.
///
/// A missing profile row and a row with `approved = false` are the same
/// thing to callers: both are `NotApproved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// An administrator approved the identity.
    Approved,
    /// No approval yet (or no profile row at all).
    NotApproved,
}

impl ApprovalStatus {
    /// Interprets the stored flag, treating a missing row as not approved.
    #[must_use]
    pub fn from_flag(approved: Option<bool>) -> Self {
        match approved {
            Some(true) => Self::Approved,
            Some(false) | None => Self::NotApproved,
        }
    }

    /// Returns true if the identity may use ticketing.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::NotApproved => write!(f, "not_approved"),
        }
    }
}
