//! Strongly-typed ID types for domain entities.
//!
//! Tickets and attachments use ULID (Universally Unique Lexicographically
//! Sortable Identifier) format, assigned by the relational store when a row
//! is inserted. Identities are assigned by the external identity provider
//! and are carried as opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed ID wrapper around ULID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Creates an ID from a ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let prefix_with_underscore = concat!($prefix, "_");
                let ulid_str = s.strip_prefix(prefix_with_underscore).unwrap_or(s);

                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<Ulid> for $name {
            fn from(ulid: Ulid) -> Self {
                Self(ulid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a support ticket.
    TicketId,
    "tkt"
);

define_id!(
    /// Unique identifier for a ticket attachment record.
    AttachmentId,
    "att"
);

/// Identifier of an authenticated identity.
///
/// The identity provider owns the format, so the value is kept verbatim.
/// It is also the first segment of every attachment storage path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Creates an identity ID from the provider's value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_display_format() {
        let id = TicketId::new();
        assert!(id.to_string().starts_with("tkt_"));
    }

    #[test]
    fn attachment_id_display_format() {
        let id = AttachmentId::new();
        assert!(id.to_string().starts_with("att_"));
    }

    #[test]
    fn parse_with_prefix() {
        let id = TicketId::new();
        let parsed: TicketId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let ulid = Ulid::new();
        let id: AttachmentId = ulid.to_string().parse().expect("should parse");
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn parse_invalid_ulid() {
        let err = "not_a_ulid".parse::<TicketId>().unwrap_err();
        assert_eq!(err.id_type, "TicketId");
    }

    #[test]
    fn ticket_ids_sort_by_creation() {
        let first = TicketId::from_ulid(Ulid::from_parts(1_000, 7));
        let second = TicketId::from_ulid(Ulid::from_parts(2_000, 3));
        assert!(first < second);
    }

    #[test]
    fn identity_id_is_opaque() {
        let id = IdentityId::new("5b0e3c1a-8d7e-4a7c-9f57-0c5a3cf1b2d4");
        assert_eq!(id.as_str(), "5b0e3c1a-8d7e-4a7c-9f57-0c5a3cf1b2d4");
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn identity_id_serializes_transparently() {
        let id = IdentityId::from("u1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"u1\"");
    }
}
