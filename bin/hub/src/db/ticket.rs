//! Tickets and attachment metadata in Postgres.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use luminarch_core::{AttachmentId, IdentityId, TicketId};
use luminarch_ticket::{
    Attachment, NewAttachment, NewTicket, Priority, RequestType, Ticket, TicketError,
    TicketStatus, TicketStore,
};
use rootcause::Report;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

/// Row type for ticket queries.
#[derive(Debug, FromRow)]
struct TicketRow {
    id: String,
    user_id: String,
    client_name: String,
    website_url: Option<String>,
    request_type: String,
    subject: String,
    description: String,
    priority: String,
    status: String,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TicketRow {
    fn try_into_ticket(self) -> Result<Ticket, TicketError> {
        let id = TicketId::from_str(&self.id).map_err(|e| TicketError::InvalidRecord {
            details: format!("invalid ticket id '{}': {e}", self.id),
        })?;
        let request_type =
            RequestType::from_str(&self.request_type).map_err(|e| TicketError::InvalidRecord {
                details: format!("ticket {}: {e}", self.id),
            })?;
        let priority =
            Priority::from_str(&self.priority).map_err(|e| TicketError::InvalidRecord {
                details: format!("ticket {}: {e}", self.id),
            })?;

        Ok(Ticket {
            id,
            user_id: IdentityId::new(self.user_id),
            client_name: self.client_name,
            website_url: self.website_url,
            request_type,
            subject: self.subject,
            description: self.description,
            priority,
            status: TicketStatus::from(self.status),
            admin_notes: self.admin_notes,
            created_at: self.created_at,
        })
    }
}

/// Row type for attachment queries.
#[derive(Debug, FromRow)]
struct AttachmentRow {
    id: String,
    ticket_id: String,
    user_id: String,
    file_name: String,
    file_path: String,
    file_size: i64,
    created_at: DateTime<Utc>,
}

impl AttachmentRow {
    fn try_into_attachment(self) -> Result<Attachment, TicketError> {
        let invalid = |details: String| TicketError::InvalidRecord { details };

        let id = AttachmentId::from_str(&self.id)
            .map_err(|e| invalid(format!("invalid attachment id '{}': {e}", self.id)))?;
        let ticket_id = TicketId::from_str(&self.ticket_id)
            .map_err(|e| invalid(format!("attachment {}: invalid ticket id: {e}", self.id)))?;
        let file_size = u64::try_from(self.file_size)
            .map_err(|_| invalid(format!("attachment {}: negative size", self.id)))?;

        Ok(Attachment {
            id,
            ticket_id,
            user_id: IdentityId::new(self.user_id),
            file_name: self.file_name,
            file_path: self.file_path,
            file_size,
            created_at: self.created_at,
        })
    }
}

/// The server's own message for a failed statement, if it sent one.
fn db_message(e: &sqlx::Error) -> String {
    match e {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Ticket store over the `support_tickets` and `ticket_attachments` tables.
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    #[instrument(skip(self, ticket), fields(owner = %owner))]
    async fn insert_ticket(
        &self,
        owner: &IdentityId,
        client_name: &str,
        ticket: &NewTicket,
    ) -> Result<Ticket, Report<TicketError>> {
        let row: TicketRow = sqlx::query_as(
            r#"
            INSERT INTO support_tickets
                (id, user_id, client_name, website_url, request_type,
                 subject, description, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, client_name, website_url, request_type,
                      subject, description, priority, status, admin_notes, created_at
            "#,
        )
        .bind(TicketId::new().to_string())
        .bind(owner.as_str())
        .bind(client_name)
        .bind(ticket.website_url())
        .bind(ticket.request_type().as_str())
        .bind(ticket.subject())
        .bind(ticket.description())
        .bind(ticket.priority().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TicketError::StoreFailed {
            message: db_message(&e),
        })?;

        Ok(row.try_into_ticket()?)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn list_tickets(&self, owner: &IdentityId) -> Result<Vec<Ticket>, Report<TicketError>> {
        let rows: Vec<TicketRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, client_name, website_url, request_type,
                   subject, description, priority, status, admin_notes, created_at
            FROM support_tickets
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TicketError::QueryFailed {
            message: db_message(&e),
        })?;

        Ok(rows
            .into_iter()
            .map(TicketRow::try_into_ticket)
            .collect::<Result<_, _>>()?)
    }

    #[instrument(skip(self, attachment), fields(ticket_id = %attachment.ticket_id))]
    async fn insert_attachment(
        &self,
        attachment: &NewAttachment,
    ) -> Result<Attachment, Report<TicketError>> {
        let file_size = i64::try_from(attachment.file_size).map_err(|_| {
            TicketError::StoreFailed {
                message: format!("{} is too large to record", attachment.file_name),
            }
        })?;

        let row: AttachmentRow = sqlx::query_as(
            r#"
            INSERT INTO ticket_attachments
                (id, ticket_id, user_id, file_name, file_path, file_size)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, ticket_id, user_id, file_name, file_path, file_size, created_at
            "#,
        )
        .bind(AttachmentId::new().to_string())
        .bind(attachment.ticket_id.to_string())
        .bind(attachment.user_id.as_str())
        .bind(&attachment.file_name)
        .bind(&attachment.file_path)
        .bind(file_size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TicketError::StoreFailed {
            message: db_message(&e),
        })?;

        Ok(row.try_into_attachment()?)
    }

    #[instrument(skip(self), fields(tickets = ticket_ids.len()))]
    async fn list_attachments(
        &self,
        ticket_ids: &[TicketId],
    ) -> Result<Vec<Attachment>, Report<TicketError>> {
        if ticket_ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strings: Vec<String> = ticket_ids.iter().map(|id| id.to_string()).collect();
        let rows: Vec<AttachmentRow> = sqlx::query_as(
            r#"
            SELECT id, ticket_id, user_id, file_name, file_path, file_size, created_at
            FROM ticket_attachments
            WHERE ticket_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&id_strings)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TicketError::QueryFailed {
            message: db_message(&e),
        })?;

        Ok(rows
            .into_iter()
            .map(AttachmentRow::try_into_attachment)
            .collect::<Result<_, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_row() -> TicketRow {
        TicketRow {
            id: TicketId::new().to_string(),
            user_id: "u1".to_string(),
            client_name: "Ada Lovelace".to_string(),
            website_url: None,
            request_type: "bug_report".to_string(),
            subject: "Broken footer".to_string(),
            description: "Links 404".to_string(),
            priority: "urgent".to_string(),
            status: "in_review".to_string(),
            admin_notes: Some("on it".to_string()),
            created_at: Utc::now(),
        }
    }

    fn attachment_row() -> AttachmentRow {
        AttachmentRow {
            id: AttachmentId::new().to_string(),
            ticket_id: TicketId::new().to_string(),
            user_id: "u1".to_string(),
            file_name: "logo.png".to_string(),
            file_path: "u1/t/0-0_logo.png".to_string(),
            file_size: 2048,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ticket_row_converts_to_domain() {
        let ticket = ticket_row().try_into_ticket().unwrap();

        assert_eq!(ticket.request_type, RequestType::BugReport);
        assert_eq!(ticket.priority, Priority::Urgent);
        assert_eq!(ticket.status, TicketStatus::InReview);
        assert_eq!(ticket.user_id.as_str(), "u1");
    }

    #[test]
    fn unknown_request_type_is_invalid_record() {
        let row = TicketRow {
            request_type: "feature_request".to_string(),
            ..ticket_row()
        };

        assert!(matches!(
            row.try_into_ticket(),
            Err(TicketError::InvalidRecord { details }) if details.contains("feature_request")
        ));
    }

    #[test]
    fn malformed_ticket_id_is_invalid_record() {
        let row = TicketRow {
            id: "not-an-id".to_string(),
            ..ticket_row()
        };

        assert!(matches!(
            row.try_into_ticket(),
            Err(TicketError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn attachment_row_converts_to_domain() {
        let attachment = attachment_row().try_into_attachment().unwrap();
        assert_eq!(attachment.file_size, 2048);
        assert_eq!(attachment.file_name, "logo.png");
    }

    #[test]
    fn negative_file_size_is_invalid_record() {
        let row = AttachmentRow {
            file_size: -1,
            ..attachment_row()
        };

        assert!(matches!(
            row.try_into_attachment(),
            Err(TicketError::InvalidRecord { .. })
        ));
    }
}
