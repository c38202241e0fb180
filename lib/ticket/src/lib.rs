//! Support tickets and their attachments.
//!
//! This crate provides:
//!
//! - **Tickets**: request types, priorities, statuses and draft validation
//! - **Staging**: the client-local set of files waiting to be uploaded
//! - **Repository**: creating and listing tickets for one identity
//! - **Attachment pipeline**: uploading staged files to object storage and
//!   recording one metadata row per uploaded file

pub mod attachment;
pub mod error;
pub mod pipeline;
pub mod repository;
pub mod staging;
pub mod storage;
pub mod ticket;

pub use attachment::{Attachment, MAX_ATTACHMENT_BYTES, NewAttachment, storage_path};
pub use error::{StorageError, TicketError, ValidationError};
pub use pipeline::{AttachmentPipeline, FileOutcome, UploadReport};
pub use repository::{TicketRepository, TicketStore};
pub use staging::{PendingFile, PendingFileSet};
pub use storage::{ObjectStorage, SIGNED_URL_TTL};
pub use ticket::{NewTicket, Priority, RequestType, Ticket, TicketDraft, TicketStatus};
