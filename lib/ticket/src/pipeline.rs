//! Uploading staged files and recording their metadata.
//!
//! Each file is uploaded and then recorded independently of the others.
//! The per-file futures run interleaved on the caller's task; a failure in
//! one never stops the rest, and nothing is retried or rolled back.

use crate::attachment::{Attachment, NewAttachment, storage_path, unique_suffix};
use crate::error::StorageError;
use crate::repository::TicketStore;
use crate::staging::PendingFile;
use crate::storage::{ObjectStorage, SIGNED_URL_TTL};
use chrono::Utc;
use futures::future::join_all;
use luminarch_core::{IdentityId, Notifier, TicketId};
use rootcause::Report;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Uploaded and recorded.
    Recorded(Attachment),
    /// The content never reached storage; no row was inserted.
    UploadFailed { file_name: String, message: String },
    /// The content is in storage but its metadata row was not inserted.
    RecordFailed {
        file_name: String,
        path: String,
        message: String,
    },
}

impl FileOutcome {
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

/// Per-file outcomes of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    outcomes: Vec<FileOutcome>,
}

impl UploadReport {
    #[must_use]
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// Returns the attachments that were fully recorded.
    pub fn recorded(&self) -> impl Iterator<Item = &Attachment> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Recorded(attachment) => Some(attachment),
            _ => None,
        })
    }

    /// Returns the number of files that did not end up recorded.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_recorded()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Moves staged files into object storage and the attachment table.
#[derive(Clone)]
pub struct AttachmentPipeline {
    storage: Arc<dyn ObjectStorage>,
    store: Arc<dyn TicketStore>,
    signed_url_ttl: Duration,
}

impl AttachmentPipeline {
    pub fn new(storage: Arc<dyn ObjectStorage>, store: Arc<dyn TicketStore>) -> Self {
        Self {
            storage,
            store,
            signed_url_ttl: SIGNED_URL_TTL,
        }
    }

    /// Overrides the lifetime of issued download links.
    #[must_use]
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Uploads every file for `ticket_id` and records one row per upload.
    ///
    /// Failures are reported to `notifier` as they happen and collected in
    /// the returned report. Returns once every file has settled.
    #[instrument(skip(self, files, notifier), fields(ticket = %ticket_id, owner = %owner, files = files.len()))]
    pub async fn upload_all(
        &self,
        ticket_id: TicketId,
        owner: &IdentityId,
        files: &[PendingFile],
        notifier: &dyn Notifier,
    ) -> UploadReport {
        if files.is_empty() {
            return UploadReport::default();
        }

        let started = Utc::now();
        let uploads = files.iter().enumerate().map(|(index, file)| {
            let path = storage_path(owner, &ticket_id, &unique_suffix(started, index), file.name());
            self.upload_one(ticket_id, owner, file, path, notifier)
        });
        let outcomes = join_all(uploads).await;

        let report = UploadReport { outcomes };
        debug!(
            recorded = report.recorded().count(),
            failed = report.failures(),
            "attachment batch settled"
        );
        report
    }

    async fn upload_one(
        &self,
        ticket_id: TicketId,
        owner: &IdentityId,
        file: &PendingFile,
        path: String,
        notifier: &dyn Notifier,
    ) -> FileOutcome {
        let uploaded = match file.read().await {
            Ok(bytes) => {
                let size = bytes.len() as u64;
                self.storage
                    .upload(&path, bytes, file.content_type())
                    .await
                    .map(|()| size)
            }
            Err(e) => Err(e),
        };

        let file_size = match uploaded {
            Ok(size) => size,
            Err(e) => {
                error!(file = file.name(), %path, error = %e, "attachment upload failed");
                notifier.error(&format!("Upload failed: {}", file.name()));
                return FileOutcome::UploadFailed {
                    file_name: file.name().to_string(),
                    message: e.current_context().to_string(),
                };
            }
        };

        let row = NewAttachment {
            ticket_id,
            user_id: owner.clone(),
            file_name: file.name().to_string(),
            file_path: path.clone(),
            file_size,
        };

        match self.store.insert_attachment(&row).await {
            Ok(attachment) => {
                debug!(file = file.name(), attachment = %attachment.id, "attachment recorded");
                FileOutcome::Recorded(attachment)
            }
            Err(e) => {
                let message = e.current_context().message().to_string();
                warn!(file = file.name(), %path, error = %e, "uploaded file left without metadata row");
                notifier.error(&format!(
                    "Could not record attachment {}: {message}",
                    file.name()
                ));
                FileOutcome::RecordFailed {
                    file_name: file.name().to_string(),
                    path,
                    message,
                }
            }
        }
    }

    /// Issues a short-lived download link for an attachment.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the link could not be issued.
    #[instrument(skip(self, attachment), fields(attachment = %attachment.id))]
    pub async fn download_link(
        &self,
        attachment: &Attachment,
    ) -> Result<String, Report<StorageError>> {
        self.storage
            .create_signed_url(&attachment.file_path, self.signed_url_ttl)
            .await
    }
}
