//! Error types for the ticket crate.
//!
//! - `ValidationError`: local input problems, detected before any network call
//! - `TicketError`: failures of the relational store (tickets and attachment rows)
//! - `StorageError`: failures of object storage (uploads and signed URLs)

use std::fmt;

/// Problems with user input, detected locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No request type was chosen.
    MissingRequestType,
    /// The request type is not one of the known values.
    UnknownRequestType { value: String },
    /// Subject is empty after trimming.
    EmptySubject,
    /// Description is empty after trimming.
    EmptyDescription,
    /// A staged file exceeds the attachment size limit.
    FileTooLarge { file_name: String, size: u64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequestType => write!(f, "request type is required"),
            Self::UnknownRequestType { value } => {
                write!(f, "unknown request type: {value}")
            }
            Self::EmptySubject => write!(f, "subject is required"),
            Self::EmptyDescription => write!(f, "description is required"),
            Self::FileTooLarge { file_name, size } => {
                write!(f, "{file_name} is {size} bytes, over the attachment limit")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// A write was rejected or failed; carries the server's message.
    StoreFailed { message: String },
    /// A read failed; carries the server's message.
    QueryFailed { message: String },
    /// A stored row could not be converted into a domain value.
    InvalidRecord { details: String },
}

impl TicketError {
    /// Returns the server-provided message, for showing to the user.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::StoreFailed { message } | Self::QueryFailed { message } => message,
            Self::InvalidRecord { details } => details,
        }
    }
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreFailed { message } => write!(f, "ticket store write failed: {message}"),
            Self::QueryFailed { message } => write!(f, "ticket store query failed: {message}"),
            Self::InvalidRecord { details } => write!(f, "invalid ticket record: {details}"),
        }
    }
}

impl std::error::Error for TicketError {}

/// Errors from object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The staged file's content could not be read.
    ReadFailed { file_name: String, message: String },
    /// The upload was rejected or failed.
    UploadFailed { path: String, message: String },
    /// No object exists at the path.
    NotFound { path: String },
    /// A signed URL could not be issued.
    SignFailed { path: String, message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { file_name, message } => {
                write!(f, "could not read {file_name}: {message}")
            }
            Self::UploadFailed { path, message } => {
                write!(f, "upload to {path} failed: {message}")
            }
            Self::NotFound { path } => write!(f, "object not found: {path}"),
            Self::SignFailed { path, message } => {
                write!(f, "signing {path} failed: {message}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::UnknownRequestType {
            value: "feature_request".to_string(),
        };
        assert!(err.to_string().contains("feature_request"));
    }

    #[test]
    fn ticket_error_exposes_server_message() {
        let err = TicketError::StoreFailed {
            message: "new row violates row-level security policy".to_string(),
        };
        assert_eq!(err.message(), "new row violates row-level security policy");
        assert!(err.to_string().starts_with("ticket store write failed"));
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::UploadFailed {
            path: "u1/tkt_1/1-0_logo.png".to_string(),
            message: "Payload too large".to_string(),
        };
        assert!(err.to_string().contains("u1/tkt_1/1-0_logo.png"));
        assert!(err.to_string().contains("Payload too large"));
    }
}
