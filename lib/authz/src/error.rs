//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The approval lookup could not be completed.
    LookupFailed {
        /// Error details.
        details: String,
    },
    /// The stored approval record could not be interpreted.
    InvalidRecord {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed { details } => {
                write!(f, "approval lookup failed: {}", details)
            }
            Self::InvalidRecord { details } => {
                write!(f, "invalid approval record: {}", details)
            }
        }
    }
}

impl std::error::Error for AuthzError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_failed_display() {
        let err = AuthzError::LookupFailed {
            details: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("approval lookup failed"));
        assert!(err.to_string().contains("connection refused"));
    }
}
