//! The session store seam.
//!
//! Implementations wrap the identity provider's session and token lifecycle.
//! They never redirect or render anything themselves: reacting to "no
//! session" is the caller's job.

use async_trait::async_trait;
use rootcause::Report;

use crate::error::AuthenticationError;
use crate::events::SessionEvents;
use crate::identity::Identity;

/// Access to the current session and its change events.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves the identity of the current session, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not be reached or answered
    /// with something unusable.
    async fn current_session(&self) -> Result<Option<Identity>, Report<AuthenticationError>>;

    /// Subscribes to session change events.
    fn subscribe(&self) -> SessionEvents;

    /// Invalidates the current session.
    ///
    /// Afterwards `current_session` resolves to `None` and subscribers
    /// receive `SessionEvent::SignedOut`.
    ///
    /// # Errors
    ///
    /// Returns an error if local session state could not be cleared.
    async fn sign_out(&self) -> Result<(), Report<AuthenticationError>>;
}
