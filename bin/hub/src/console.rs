//! Terminal rendering of notifications and dashboard views.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use luminarch_core::{Notifier, Severity};
use luminarch_portal::{Presenter, ProfileView, TicketCard, TicketFeed};
use luminarch_ticket::PendingFile;
use tracing::debug;

/// A shared line sink. Write errors on a terminal are not actionable, so
/// they are logged and dropped.
struct Output(Mutex<Box<dyn Write + Send>>);

impl Output {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self(Mutex::new(writer))
    }

    fn lines(&self, lines: &[String]) {
        let mut out = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        for line in lines {
            if let Err(e) = writeln!(out, "{line}") {
                debug!(error = %e, "console write failed");
                return;
            }
        }
        let _ = out.flush();
    }
}

/// Prints notifications as single prefixed lines.
pub struct ConsoleNotifier {
    out: Output,
}

impl ConsoleNotifier {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Output::new(writer),
        }
    }

    /// Notifications go to stderr so stdout stays clean for links.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let prefix = match severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Error => "error",
        };
        self.out.lines(&[format!("[{prefix}] {message}")]);
    }
}

/// Renders the dashboard as plain text.
pub struct ConsolePresenter {
    out: Output,
}

impl ConsolePresenter {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Output::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

fn size_kb(bytes: u64) -> String {
    format!("{} KB", (bytes + 512) / 1024)
}

fn card_lines(card: &TicketCard) -> Vec<String> {
    let ticket = &card.ticket;
    let urgent = if card.urgent { " [URGENT]" } else { "" };
    let mut lines = vec![format!(
        "#{}{urgent} {}  ({}, {}, {})",
        card.number, ticket.subject, card.type_label, card.status_label, card.age
    )];

    if let Some(url) = &ticket.website_url {
        lines.push(format!("    {url}"));
    }
    lines.extend(ticket.description.lines().map(|l| format!("    {l}")));
    if let Some(notes) = ticket.admin_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("    Note from Luminarch: {notes}"));
    }
    for attachment in &card.attachments {
        lines.push(format!(
            "    - {} ({})  {}",
            attachment.file_name,
            size_kb(attachment.file_size),
            attachment.id
        ));
    }
    lines
}

impl Presenter for ConsolePresenter {
    fn show_pending_approval(&self, profile: &ProfileView) {
        self.out.lines(&[
            format!("Hi {}, your account is awaiting approval.", profile.display_name),
            "We'll email you as soon as it's ready.".to_string(),
        ]);
    }

    fn show_dashboard(&self, profile: &ProfileView) {
        self.out.lines(&[format!(
            "Welcome back, {}  <{}>  member since {}",
            profile.display_name, profile.email, profile.member_since
        )]);
    }

    fn render_tickets(&self, feed: &TicketFeed) {
        let mut lines = vec![format!(
            "Active: {}  Deployed: {}",
            feed.stats.active, feed.stats.deployed
        )];
        if feed.is_empty() {
            lines.push("No requests yet.".to_string());
        }
        for card in &feed.cards {
            lines.push(String::new());
            lines.extend(card_lines(card));
        }
        self.out.lines(&lines);
    }

    fn render_pending_files(&self, files: &[PendingFile]) {
        let lines: Vec<String> = files
            .iter()
            .enumerate()
            .map(|(index, file)| format!("  [{index}] {} ({})", file.name(), size_kb(file.size())))
            .collect();
        self.out.lines(&lines);
    }

    fn set_submit_enabled(&self, enabled: bool) {
        debug!(enabled, "submit control toggled");
    }

    fn reset_new_ticket_form(&self) {
        debug!("new-ticket form reset");
    }

    fn collapse_new_ticket_form(&self) {
        debug!("new-ticket form collapsed");
    }

    fn redirect_to_entry(&self) {
        self.out
            .lines(&["You are signed out. Run `luminarch-hub login` to sign in.".to_string()]);
    }
}
