//! Session tokens for an authenticated identity.
//!
//! A session is what the identity provider hands back after a successful
//! sign-in. It carries the bearer token used for every authenticated call
//! and can be persisted between runs of the client.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// How long before expiry a session is considered due for refresh.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// An active authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for authenticated calls.
    access_token: String,
    /// Token used to obtain a new access token.
    refresh_token: Option<String>,
    /// When the access token expires.
    expires_at: DateTime<Utc>,
    /// The identity the session belongs to.
    identity: Identity,
}

impl Session {
    /// Creates a session valid for the given duration from now.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Duration,
        identity: Identity,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + expires_in,
            identity,
        }
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if present.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns when the access token expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the identity this session belongs to.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns true if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token expires within the refresh margin.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::seconds(REFRESH_MARGIN_SECONDS) >= self.expires_at
    }

    /// Replaces the tokens after a refresh and extends expiration.
    pub fn refresh(
        &mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Duration,
    ) {
        self.access_token = access_token;
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = Utc::now() + expires_in;
    }

    /// Replaces the identity record (e.g. after re-fetching it).
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luminarch_core::IdentityId;

    fn identity() -> Identity {
        Identity::new(
            IdentityId::new("u1"),
            "ada@example.com".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn new_session_has_correct_fields() {
        let before = Utc::now();
        let session = Session::new(
            "access".to_string(),
            Some("refresh".to_string()),
            Duration::hours(1),
            identity(),
        );

        assert_eq!(session.access_token(), "access");
        assert_eq!(session.refresh_token(), Some("refresh"));
        assert!(session.expires_at() > before);
        assert_eq!(session.identity().email(), "ada@example.com");
    }

    #[test]
    fn session_expiration() {
        let session = Session::new(
            "access".to_string(),
            None,
            Duration::seconds(-1),
            identity(),
        );

        assert!(session.is_expired());
        assert!(session.needs_refresh());
    }

    #[test]
    fn session_near_expiry_needs_refresh() {
        let session = Session::new(
            "access".to_string(),
            None,
            Duration::seconds(30),
            identity(),
        );

        assert!(!session.is_expired());
        assert!(session.needs_refresh());
    }

    #[test]
    fn session_refresh_keeps_refresh_token_when_not_rotated() {
        let mut session = Session::new(
            "old".to_string(),
            Some("refresh".to_string()),
            Duration::seconds(1),
            identity(),
        );
        let old_expires = session.expires_at();

        session.refresh("new".to_string(), None, Duration::hours(1));

        assert_eq!(session.access_token(), "new");
        assert_eq!(session.refresh_token(), Some("refresh"));
        assert!(session.expires_at() > old_expires);
        assert!(!session.needs_refresh());
    }

    #[test]
    fn session_serialization_roundtrip() {
        let session = Session::new(
            "token".to_string(),
            Some("refresh".to_string()),
            Duration::hours(1),
            identity(),
        );

        let json = serde_json::to_string(&session).expect("serialize");
        let parsed: Session = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(session, parsed);
    }
}
