//! Approval gate for the Luminarch client hub.
//!
//! Signing up does not grant access to ticketing: an administrator flips an
//! `approved` flag on the identity's profile first. This crate answers the
//! single question "may this identity use ticketing right now?".

mod error;
mod gate;
mod types;

pub use error::AuthzError;
pub use gate::{ApprovalGate, ApprovalStore};
pub use types::ApprovalStatus;
