//! Approval lookup and the gate built on it.

use crate::error::AuthzError;
use crate::types::ApprovalStatus;
use async_trait::async_trait;
use luminarch_core::IdentityId;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read access to the approval table.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Fetches the raw `approved` flag for an identity.
    ///
    /// Returns `None` when the identity has no profile row.
    async fn fetch_approval(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<bool>, Report<AuthzError>>;
}

/// Decides whether an identity may use ticketing features.
///
/// Every call goes to the store; results are never cached so an approval
/// granted by an administrator takes effect on the next dashboard load.
#[derive(Clone)]
pub struct ApprovalGate {
    store: Arc<dyn ApprovalStore>,
}

impl ApprovalGate {
    /// Creates a gate backed by the given store.
    pub fn new(store: Arc<dyn ApprovalStore>) -> Self {
        Self { store }
    }

    /// Checks whether the identity has been approved.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged. Callers must not treat an error
    /// as approval.
    #[instrument(skip(self), fields(identity = %identity_id))]
    pub async fn check_approval(
        &self,
        identity_id: &IdentityId,
    ) -> luminarch_core::Result<ApprovalStatus, AuthzError> {
        let flag = self.store.fetch_approval(identity_id).await?;
        let status = ApprovalStatus::from_flag(flag);

        debug!(row_present = flag.is_some(), %status, "approval check result");

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory approval table for testing.
    struct InMemoryApprovals {
        rows: HashMap<String, bool>,
        lookups: Mutex<u32>,
        fail: bool,
    }

    impl InMemoryApprovals {
        fn new(rows: &[(&str, bool)]) -> Self {
            Self {
                rows: rows.iter().map(|(id, a)| (id.to_string(), *a)).collect(),
                lookups: Mutex::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&[])
            }
        }
    }

    #[async_trait]
    impl ApprovalStore for InMemoryApprovals {
        async fn fetch_approval(
            &self,
            identity_id: &IdentityId,
        ) -> Result<Option<bool>, Report<AuthzError>> {
            *self.lookups.lock().unwrap() += 1;
            if self.fail {
                return Err(AuthzError::LookupFailed {
                    details: "connection reset".to_string(),
                }
                .into());
            }
            Ok(self.rows.get(identity_id.as_str()).copied())
        }
    }

    #[tokio::test]
    async fn missing_row_and_false_flag_both_pend() {
        let gate = ApprovalGate::new(Arc::new(InMemoryApprovals::new(&[("u2", false)])));

        let missing = gate.check_approval(&IdentityId::new("u1")).await.unwrap();
        let unapproved = gate.check_approval(&IdentityId::new("u2")).await.unwrap();

        assert_eq!(missing, ApprovalStatus::NotApproved);
        assert_eq!(unapproved, missing);
    }

    #[tokio::test]
    async fn approved_flag_grants_access() {
        let gate = ApprovalGate::new(Arc::new(InMemoryApprovals::new(&[("u1", true)])));
        let status = gate.check_approval(&IdentityId::new("u1")).await.unwrap();
        assert!(status.is_approved());
    }

    #[tokio::test]
    async fn every_check_hits_the_store() {
        let store = Arc::new(InMemoryApprovals::new(&[("u1", true)]));
        let gate = ApprovalGate::new(store.clone());

        gate.check_approval(&IdentityId::new("u1")).await.unwrap();
        gate.check_approval(&IdentityId::new("u1")).await.unwrap();

        assert_eq!(*store.lookups.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn lookup_failure_is_an_error_not_a_grant() {
        let gate = ApprovalGate::new(Arc::new(InMemoryApprovals::failing()));
        let err = gate.check_approval(&IdentityId::new("u1")).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            AuthzError::LookupFailed { .. }
        ));
    }
}
