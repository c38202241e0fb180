//! Ticket persistence.
//!
//! `TicketStore` is the seam to the relational store. `TicketRepository`
//! adds the ordering guarantees the dashboard relies on.

use crate::attachment::{Attachment, NewAttachment};
use crate::error::TicketError;
use crate::ticket::{NewTicket, Ticket};
use async_trait::async_trait;
use luminarch_core::{IdentityId, TicketId};
use luminarch_platform_access::Identity;
use rootcause::Report;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Row-level access to tickets and attachment metadata.
///
/// Implementations are scoped by the store's own access rules; the hub
/// passes the owner explicitly on every call.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Inserts a ticket and returns it with its assigned id and timestamp.
    async fn insert_ticket(
        &self,
        owner: &IdentityId,
        client_name: &str,
        ticket: &NewTicket,
    ) -> Result<Ticket, Report<TicketError>>;

    /// Lists every ticket owned by `owner`, in any order.
    async fn list_tickets(&self, owner: &IdentityId) -> Result<Vec<Ticket>, Report<TicketError>>;

    /// Inserts one attachment metadata row.
    async fn insert_attachment(
        &self,
        attachment: &NewAttachment,
    ) -> Result<Attachment, Report<TicketError>>;

    /// Lists the attachments of all given tickets in one call, in any order.
    async fn list_attachments(
        &self,
        ticket_ids: &[TicketId],
    ) -> Result<Vec<Attachment>, Report<TicketError>>;
}

/// Creates and lists tickets for the signed-in identity.
#[derive(Clone)]
pub struct TicketRepository {
    store: Arc<dyn TicketStore>,
}

impl TicketRepository {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Creates a ticket owned by `owner`.
    ///
    /// The client name recorded on the ticket is the owner's full name, or
    /// their email when no name is known.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::StoreFailed` with the server's message.
    #[instrument(skip(self, owner, ticket), fields(owner = %owner.id(), request_type = %ticket.request_type()))]
    pub async fn create_ticket(
        &self,
        owner: &Identity,
        ticket: &NewTicket,
    ) -> Result<Ticket, Report<TicketError>> {
        let created = self
            .store
            .insert_ticket(owner.id(), &owner.client_name(), ticket)
            .await?;

        debug!(ticket = %created.id, "ticket created");
        Ok(created)
    }

    /// Lists the owner's tickets, newest first.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn list_tickets(
        &self,
        owner: &IdentityId,
    ) -> Result<Vec<Ticket>, Report<TicketError>> {
        let mut tickets = self.store.list_tickets(owner).await?;
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(count = tickets.len(), "tickets listed");
        Ok(tickets)
    }

    /// Lists the attachments of the given tickets, oldest first.
    ///
    /// No store call is made for an empty id list.
    #[instrument(skip(self, ticket_ids), fields(tickets = ticket_ids.len()))]
    pub async fn list_attachments(
        &self,
        ticket_ids: &[TicketId],
    ) -> Result<Vec<Attachment>, Report<TicketError>> {
        if ticket_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut attachments = self.store.list_attachments(ticket_ids).await?;
        attachments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        debug!(count = attachments.len(), "attachments listed");
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{Priority, TicketDraft};
    use chrono::{Duration, TimeZone, Utc};
    use luminarch_core::AttachmentId;
    use std::sync::Mutex;

    /// In-memory ticket store for testing.
    #[derive(Default)]
    struct InMemoryTickets {
        tickets: Mutex<Vec<Ticket>>,
        attachments: Mutex<Vec<Attachment>>,
        attachment_queries: Mutex<u32>,
        reject_inserts: Option<String>,
    }

    #[async_trait]
    impl TicketStore for InMemoryTickets {
        async fn insert_ticket(
            &self,
            owner: &IdentityId,
            client_name: &str,
            ticket: &NewTicket,
        ) -> Result<Ticket, Report<TicketError>> {
            if let Some(message) = &self.reject_inserts {
                return Err(TicketError::StoreFailed {
                    message: message.clone(),
                }
                .into());
            }
            let created = ticket.clone().into_ticket(
                TicketId::new(),
                owner.clone(),
                client_name.to_string(),
                Utc::now(),
            );
            self.tickets.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn list_tickets(
            &self,
            owner: &IdentityId,
        ) -> Result<Vec<Ticket>, Report<TicketError>> {
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .iter()
                .filter(|t| &t.user_id == owner)
                .cloned()
                .collect())
        }

        async fn insert_attachment(
            &self,
            attachment: &NewAttachment,
        ) -> Result<Attachment, Report<TicketError>> {
            let row = Attachment {
                id: AttachmentId::new(),
                ticket_id: attachment.ticket_id,
                user_id: attachment.user_id.clone(),
                file_name: attachment.file_name.clone(),
                file_path: attachment.file_path.clone(),
                file_size: attachment.file_size,
                created_at: Utc::now(),
            };
            self.attachments.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn list_attachments(
            &self,
            ticket_ids: &[TicketId],
        ) -> Result<Vec<Attachment>, Report<TicketError>> {
            *self.attachment_queries.lock().unwrap() += 1;
            Ok(self
                .attachments
                .lock()
                .unwrap()
                .iter()
                .filter(|a| ticket_ids.contains(&a.ticket_id))
                .cloned()
                .collect())
        }
    }

    fn owner(id: &str) -> Identity {
        Identity::new(
            IdentityId::new(id),
            format!("{id}@example.com"),
            Utc::now(),
        )
    }

    fn new_ticket(subject: &str) -> NewTicket {
        TicketDraft {
            request_type: "content_update".to_string(),
            subject: subject.to_string(),
            description: "Please update the hero copy".to_string(),
            website_url: String::new(),
            priority: Priority::Normal,
        }
        .validate()
        .unwrap()
    }

    fn stored_ticket(owner: &str, subject: &str, minutes_ago: i64) -> Ticket {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        new_ticket(subject).into_ticket(
            TicketId::new(),
            IdentityId::new(owner),
            owner.to_string(),
            base - Duration::minutes(minutes_ago),
        )
    }

    #[tokio::test]
    async fn create_records_client_name_from_email_without_full_name() {
        let store = Arc::new(InMemoryTickets::default());
        let repo = TicketRepository::new(store.clone());

        let ticket = repo
            .create_ticket(&owner("u1"), &new_ticket("Hero copy"))
            .await
            .unwrap();

        assert_eq!(ticket.client_name, "u1@example.com");
        assert_eq!(store.tickets.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_failure_carries_server_message() {
        let store = Arc::new(InMemoryTickets {
            reject_inserts: Some("permission denied for table support_tickets".to_string()),
            ..Default::default()
        });
        let repo = TicketRepository::new(store);

        let err = repo
            .create_ticket(&owner("u1"), &new_ticket("Hero copy"))
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context().message(),
            "permission denied for table support_tickets"
        );
    }

    #[tokio::test]
    async fn tickets_are_listed_newest_first_for_owner_only() {
        let store = Arc::new(InMemoryTickets::default());
        store.tickets.lock().unwrap().extend([
            stored_ticket("u1", "oldest", 30),
            stored_ticket("u2", "someone else", 5),
            stored_ticket("u1", "newest", 1),
            stored_ticket("u1", "middle", 10),
        ]);
        let repo = TicketRepository::new(store);

        let tickets = repo.list_tickets(&IdentityId::new("u1")).await.unwrap();
        let subjects: Vec<_> = tickets.iter().map(|t| t.subject.as_str()).collect();

        assert_eq!(subjects, ["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn no_tickets_is_an_empty_list() {
        let repo = TicketRepository::new(Arc::new(InMemoryTickets::default()));
        let tickets = repo.list_tickets(&IdentityId::new("u1")).await.unwrap();
        assert!(tickets.is_empty());
    }

    #[tokio::test]
    async fn empty_attachment_query_skips_the_store() {
        let store = Arc::new(InMemoryTickets::default());
        let repo = TicketRepository::new(store.clone());

        let attachments = repo.list_attachments(&[]).await.unwrap();

        assert!(attachments.is_empty());
        assert_eq!(*store.attachment_queries.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn attachments_are_listed_oldest_first_in_one_call() {
        let store = Arc::new(InMemoryTickets::default());
        let t1 = TicketId::new();
        let t2 = TicketId::new();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let row = |ticket_id: TicketId, name: &str, offset: i64| Attachment {
            id: AttachmentId::new(),
            ticket_id,
            user_id: IdentityId::new("u1"),
            file_name: name.to_string(),
            file_path: format!("u1/{ticket_id}/0-0_{name}"),
            file_size: 1,
            created_at: base + Duration::seconds(offset),
        };
        store.attachments.lock().unwrap().extend([
            row(t1, "second.png", 2),
            row(t2, "first.pdf", 1),
            row(TicketId::new(), "unrelated.txt", 0),
        ]);
        let repo = TicketRepository::new(store.clone());

        let attachments = repo.list_attachments(&[t1, t2]).await.unwrap();
        let names: Vec<_> = attachments.iter().map(|a| a.file_name.as_str()).collect();

        assert_eq!(names, ["first.pdf", "second.png"]);
        assert_eq!(*store.attachment_queries.lock().unwrap(), 1);
    }
}
