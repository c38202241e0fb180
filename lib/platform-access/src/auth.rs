//! Sign-in and sign-up flows.
//!
//! These are the entry-page operations: password sign-in, passwordless
//! magic links and account creation. New accounts still need manual
//! approval before they can file tickets.

use async_trait::async_trait;
use rootcause::Report;
use serde::Serialize;

use crate::error::AuthenticationError;
use crate::identity::Identity;

/// Data collected by the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpRequest {
    /// Name stored as `full_name` metadata.
    pub full_name: String,
    /// Email address to register.
    pub email: String,
    /// Chosen password.
    #[serde(skip_serializing)]
    pub password: String,
}

impl SignUpRequest {
    /// Creates a sign-up request, trimming the name and email.
    #[must_use]
    pub fn new(full_name: &str, email: &str, password: impl Into<String>) -> Self {
        Self {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.into(),
        }
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account was created and a session started immediately.
    SignedIn(Identity),
    /// The account was created; the user must confirm their email first.
    ConfirmationRequired,
}

/// Credential-based authentication against the identity provider.
///
/// Successful flows that produce a session emit `SessionEvent::SignedIn`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Signs in with email and password.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, Report<AuthenticationError>>;

    /// Sends a one-time sign-in link to the given email.
    async fn send_magic_link(&self, email: &str) -> Result<(), Report<AuthenticationError>>;

    /// Registers a new account.
    async fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> Result<SignUpOutcome, Report<AuthenticationError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_request_trims_name_and_email() {
        let request = SignUpRequest::new("  Ada Lovelace ", " ada@example.com ", " secret ");
        assert_eq!(request.full_name, "Ada Lovelace");
        assert_eq!(request.email, "ada@example.com");
        assert_eq!(request.password, " secret ");
    }

    #[test]
    fn sign_up_request_never_serializes_password() {
        let request = SignUpRequest::new("Ada", "ada@example.com", "hunter2");
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(!json.contains("hunter2"));
        assert!(json.contains("ada@example.com"));
    }
}
