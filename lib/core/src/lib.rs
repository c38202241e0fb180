//! Core domain types and utilities for the Luminarch client hub.
//!
//! This crate provides the identifiers, error handling foundation, and the
//! user-notification seam shared by every other crate in the workspace.

pub mod error;
pub mod id;
pub mod notify;

pub use error::Result;
pub use id::{AttachmentId, IdentityId, ParseIdError, TicketId};
pub use notify::{Notifier, Severity};
