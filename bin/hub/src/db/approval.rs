//! Approval flags stored on user profiles.

use async_trait::async_trait;
use luminarch_authz::{ApprovalStore, AuthzError};
use luminarch_core::IdentityId;
use rootcause::Report;
use sqlx::PgPool;

/// Reads `user_profiles.approved`.
pub struct PgApprovalStore {
    pool: PgPool,
}

impl PgApprovalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalStore for PgApprovalStore {
    async fn fetch_approval(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<bool>, Report<AuthzError>> {
        let approved: Option<Option<bool>> = sqlx::query_scalar(
            r#"
            SELECT approved
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(identity_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthzError::LookupFailed {
            details: e.to_string(),
        })?;

        // A NULL flag has not been granted.
        Ok(approved.map(|flag| flag.unwrap_or(false)))
    }
}
