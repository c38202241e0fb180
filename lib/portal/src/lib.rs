//! The client dashboard.
//!
//! `DashboardController` ties the session, the approval gate, the ticket
//! repository and the attachment pipeline together. It never draws anything
//! itself: every visible change goes through the [`Presenter`] and every
//! message for the user through a `Notifier`.
//!
//! # Example
//!
//! ```ignore
//! let controller = DashboardController::new(services);
//! controller.run(sessions.subscribe()).await;
//! ```

mod controller;
mod presenter;
mod state;
mod view;

pub use controller::{DashboardController, PortalServices, SubmitOutcome};
pub use presenter::Presenter;
pub use state::DashboardState;
pub use view::{ProfileView, TicketCard, TicketFeed, TicketStats, time_ago};
