//! View models handed to the presenter.

use chrono::{DateTime, Utc};
use luminarch_platform_access::Identity;
use luminarch_ticket::{Attachment, Ticket};
use serde::Serialize;
use std::collections::HashMap;

/// What the greeting and the profile stats show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub display_name: String,
    pub email: String,
    /// Creation month, e.g. `Jan 2026`.
    pub member_since: String,
}

impl From<&Identity> for ProfileView {
    fn from(identity: &Identity) -> Self {
        Self {
            display_name: identity.display_name(),
            email: identity.email().to_string(),
            member_since: identity.member_since(),
        }
    }
}

/// Active and deployed ticket counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TicketStats {
    /// Tickets that are not deployed yet, whatever their status.
    pub active: usize,
    pub deployed: usize,
}

/// One ticket as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketCard {
    /// Position in the feed, starting at 1 for the newest ticket.
    pub number: usize,
    pub ticket: Ticket,
    pub type_label: String,
    pub status_label: String,
    pub urgent: bool,
    /// Age of the ticket, e.g. `3h ago`.
    pub age: String,
    /// Attachments of this ticket, oldest first.
    pub attachments: Vec<Attachment>,
}

/// The ticket feed with its stat counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketFeed {
    pub cards: Vec<TicketCard>,
    pub stats: TicketStats,
}

impl TicketFeed {
    /// Builds the feed from tickets (newest first) and attachments (oldest first).
    ///
    /// Attachments whose ticket is not in the list are ignored.
    #[must_use]
    pub fn build(tickets: Vec<Ticket>, attachments: Vec<Attachment>, now: DateTime<Utc>) -> Self {
        let mut by_ticket: HashMap<_, Vec<Attachment>> = HashMap::new();
        for attachment in attachments {
            by_ticket
                .entry(attachment.ticket_id)
                .or_default()
                .push(attachment);
        }

        let mut stats = TicketStats::default();
        let cards = tickets
            .into_iter()
            .enumerate()
            .map(|(index, ticket)| {
                if ticket.status.is_deployed() {
                    stats.deployed += 1;
                } else {
                    stats.active += 1;
                }
                TicketCard {
                    number: index + 1,
                    type_label: ticket.request_type.label().to_string(),
                    status_label: ticket.status.label().to_string(),
                    urgent: ticket.priority.is_urgent(),
                    age: time_ago(ticket.created_at, now),
                    attachments: by_ticket.remove(&ticket.id).unwrap_or_default(),
                    ticket,
                }
            })
            .collect();

        Self { cards, stats }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Finds an attachment anywhere in the feed.
    #[must_use]
    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.cards
            .iter()
            .flat_map(|card| &card.attachments)
            .find(|a| a.id.to_string() == id || a.id.as_ulid().to_string() == id)
    }
}

/// Formats how long ago `then` was.
///
/// Under a minute is `just now`; then minutes, hours and days up to 29;
/// anything older is shown as a short date such as `Mar 4`.
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{days}d ago");
    }
    then.format("%b %-d").to_string()
}
