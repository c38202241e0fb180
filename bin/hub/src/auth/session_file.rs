//! Session persistence between runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use luminarch_platform_access::{AuthenticationError, Session};
use rootcause::Report;
use tracing::{debug, warn};

/// A JSON file holding the current session, if any.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session.
    ///
    /// A missing file means nobody is signed in. A file that no longer
    /// parses is discarded the same way, so a format change signs the
    /// user out instead of wedging every command.
    pub async fn load(&self) -> Result<Option<Session>, Report<AuthenticationError>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthenticationError::PersistenceFailed {
                    reason: format!("{}: {e}", self.path.display()),
                }
                .into());
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), Report<AuthenticationError>> {
        let json = serde_json::to_vec_pretty(session).map_err(|e| {
            AuthenticationError::PersistenceFailed {
                reason: e.to_string(),
            }
        })?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AuthenticationError::PersistenceFailed {
                reason: format!("{}: {e}", self.path.display()),
            })?;

        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Removes the stored session. Succeeds when there is none.
    pub async fn clear(&self) -> Result<(), Report<AuthenticationError>> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthenticationError::PersistenceFailed {
                reason: format!("{}: {e}", self.path.display()),
            }
            .into()),
        }
    }
}
