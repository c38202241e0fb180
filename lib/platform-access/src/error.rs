//! Error types for the platform-access crate.
//!
//! Operations return `Report<AuthenticationError>` so adapters can attach
//! their own context as errors propagate.

use std::fmt;

/// Errors from authentication and session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Email/password pair was rejected.
    InvalidCredentials { reason: String },
    /// No session is available.
    NotAuthenticated,
    /// Session has expired and could not be refreshed.
    SessionExpired,
    /// Identity provider returned an error.
    ProviderError { reason: String },
    /// Identity provider returned a response we could not interpret.
    InvalidResponse { reason: String },
    /// Local session persistence failed.
    PersistenceFailed { reason: String },
}

impl AuthenticationError {
    /// Returns the message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials { reason } | Self::ProviderError { reason } => reason.clone(),
            Self::NotAuthenticated => "Not signed in".to_string(),
            Self::SessionExpired => "Session expired, please sign in again".to_string(),
            Self::InvalidResponse { .. } | Self::PersistenceFailed { .. } => {
                "Authentication service error".to_string()
            }
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials { reason } => {
                write!(f, "invalid credentials: {reason}")
            }
            Self::NotAuthenticated => {
                write!(f, "not authenticated")
            }
            Self::SessionExpired => {
                write!(f, "session has expired")
            }
            Self::ProviderError { reason } => {
                write!(f, "identity provider error: {reason}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid identity provider response: {reason}")
            }
            Self::PersistenceFailed { reason } => {
                write!(f, "session persistence failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_display() {
        let err = AuthenticationError::InvalidCredentials {
            reason: "Invalid login credentials".to_string(),
        };
        assert!(err.to_string().contains("invalid credentials"));
        assert!(err.to_string().contains("Invalid login credentials"));
    }

    #[test]
    fn provider_error_display() {
        let err = AuthenticationError::ProviderError {
            reason: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("identity provider"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn user_message_passes_provider_text_through() {
        let err = AuthenticationError::InvalidCredentials {
            reason: "Email not confirmed".to_string(),
        };
        assert_eq!(err.user_message(), "Email not confirmed");
    }

    #[test]
    fn user_message_hides_internal_details() {
        let err = AuthenticationError::PersistenceFailed {
            reason: "/home/ada/.session: permission denied".to_string(),
        };
        assert!(!err.user_message().contains("/home/ada"));
    }
}
