//! Attachment records and storage paths.

use chrono::{DateTime, Utc};
use luminarch_core::{AttachmentId, IdentityId, TicketId};
use serde::{Deserialize, Serialize};

/// Largest file accepted for upload: 10 MiB.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Metadata row for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub ticket_id: TicketId,
    pub user_id: IdentityId,
    /// Original file name, as shown to the user.
    pub file_name: String,
    /// Object storage path.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

/// An attachment row waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub ticket_id: TicketId,
    pub user_id: IdentityId,
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
}

/// Builds the unique part of a storage path.
///
/// `index` is the file's position in its batch, so two files with the same
/// name uploaded in the same millisecond still get different paths.
#[must_use]
pub fn unique_suffix(at: DateTime<Utc>, index: usize) -> String {
    format!("{}-{index}", at.timestamp_millis())
}

/// Builds the storage path `{identity}/{ticket}/{suffix}_{file_name}`.
///
/// Path separators inside the file name are replaced so a name can never
/// escape the ticket's folder.
#[must_use]
pub fn storage_path(
    identity_id: &IdentityId,
    ticket_id: &TicketId,
    suffix: &str,
    file_name: &str,
) -> String {
    let file_name = file_name.replace(['/', '\\'], "_");
    format!("{identity_id}/{ticket_id}/{suffix}_{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn path_has_identity_ticket_and_suffix() {
        let ticket = TicketId::new();
        let at = Utc.timestamp_millis_opt(1_760_000_000_123).unwrap();

        let path = storage_path(
            &IdentityId::new("u1"),
            &ticket,
            &unique_suffix(at, 2),
            "logo.png",
        );

        assert_eq!(path, format!("u1/{ticket}/1760000000123-2_logo.png"));
    }

    #[test]
    fn same_name_same_instant_does_not_collide() {
        let ticket = TicketId::new();
        let owner = IdentityId::new("u1");
        let at = Utc::now();

        let first = storage_path(&owner, &ticket, &unique_suffix(at, 0), "a.pdf");
        let second = storage_path(&owner, &ticket, &unique_suffix(at, 1), "a.pdf");

        assert_ne!(first, second);
    }

    #[test]
    fn separators_in_file_name_are_flattened() {
        let ticket = TicketId::new();
        let path = storage_path(&IdentityId::new("u1"), &ticket, "1-0", "../etc\\passwd");
        assert_eq!(path, format!("u1/{ticket}/1-0_.._etc_passwd"));
    }

    #[test]
    fn limit_is_ten_mebibytes() {
        assert_eq!(MAX_ATTACHMENT_BYTES, 10_485_760);
    }
}
