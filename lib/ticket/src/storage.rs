//! The object storage seam.

use crate::error::StorageError;
use async_trait::async_trait;
use rootcause::Report;
use std::time::Duration;

/// Lifetime of download links handed to the user.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(300);

/// Bucket-scoped blob storage for attachment content.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UploadFailed` if the object was not stored.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Report<StorageError>>;

    /// Issues a time-limited URL granting read access to `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` or `StorageError::SignFailed`.
    async fn create_signed_url(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, Report<StorageError>>;
}
