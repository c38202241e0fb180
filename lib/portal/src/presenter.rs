//! The presentation seam.

use crate::view::{ProfileView, TicketFeed};
use luminarch_ticket::PendingFile;

/// Receives coarse UI updates from the controller.
///
/// Calls are fire-and-forget and never fail. A web page would toggle
/// regions of the DOM; the command-line client prints.
pub trait Presenter: Send + Sync {
    /// Shows the "awaiting approval" view instead of the dashboard.
    fn show_pending_approval(&self, profile: &ProfileView);

    /// Reveals the dashboard for an approved identity.
    fn show_dashboard(&self, profile: &ProfileView);

    /// Replaces the ticket feed and the stat counters.
    fn render_tickets(&self, feed: &TicketFeed);

    /// Replaces the list of staged files.
    fn render_pending_files(&self, files: &[PendingFile]);

    /// Enables or disables the submit control.
    fn set_submit_enabled(&self, enabled: bool);

    /// Clears the new-ticket form fields and collapses it.
    fn reset_new_ticket_form(&self);

    /// Collapses the new-ticket form without clearing its fields.
    fn collapse_new_ticket_form(&self);

    /// Sends the user back to the sign-in entry point.
    fn redirect_to_entry(&self);
}
