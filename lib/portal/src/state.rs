//! Dashboard lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the dashboard is in its lifecycle.
///
/// ```text
/// Unresolved ──► PendingApproval
///     │     └──► Active
///     └──────────────┴──► Unauthenticated
/// ```
///
/// `Unauthenticated` is terminal for a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardState {
    /// The session has not been resolved yet.
    #[default]
    Unresolved,
    /// Signed in, waiting for an administrator's approval.
    PendingApproval,
    /// Signed in and approved.
    Active,
    /// No session; the user was sent back to the entry page.
    Unauthenticated,
}

impl DashboardState {
    /// Returns true once no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Unauthenticated, _) => false,
            (_, Self::Unauthenticated) => true,
            (Self::Unresolved, Self::PendingApproval | Self::Active) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DashboardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unresolved => "unresolved",
            Self::PendingApproval => "pending_approval",
            Self::Active => "active",
            Self::Unauthenticated => "unauthenticated",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_resolves_once() {
        let state = DashboardState::Unresolved;
        assert!(state.can_transition_to(DashboardState::Active));
        assert!(state.can_transition_to(DashboardState::PendingApproval));
        assert!(!DashboardState::Active.can_transition_to(DashboardState::PendingApproval));
        assert!(!DashboardState::PendingApproval.can_transition_to(DashboardState::Active));
    }

    #[test]
    fn any_live_state_can_sign_out() {
        for state in [
            DashboardState::Unresolved,
            DashboardState::PendingApproval,
            DashboardState::Active,
        ] {
            assert!(state.can_transition_to(DashboardState::Unauthenticated));
        }
    }

    #[test]
    fn unauthenticated_is_terminal() {
        let state = DashboardState::Unauthenticated;
        assert!(state.is_terminal());
        assert!(!state.can_transition_to(DashboardState::Active));
        assert!(!state.can_transition_to(DashboardState::Unauthenticated));
    }
}
