//! Session change notifications.
//!
//! The identity provider reports sign-in, sign-out and token refresh as
//! discrete events. Every subscriber sees each event exactly once, in the
//! order it was emitted. Nothing orders these events against an in-flight
//! `SessionStore::current_session` call, so consumers must tolerate a
//! `SignedIn` for an identity they already resolved.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::identity::Identity;

/// Buffered events per subscriber before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 16;

/// A change in the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An identity signed in (password, magic link callback, sign-up).
    SignedIn(Identity),
    /// The session was invalidated.
    SignedOut,
    /// The access token was refreshed for the same identity.
    TokenRefreshed(Identity),
}

impl SessionEvent {
    /// Returns a short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
        }
    }
}

/// Fans session events out to subscribers.
#[derive(Debug, Clone)]
pub struct SessionBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBroadcaster {
    /// Creates a broadcaster with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a broadcaster buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emits an event to all current subscribers.
    pub fn emit(&self, event: SessionEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "session event emitted"),
            Err(_) => debug!(event = name, "session event emitted with no subscribers"),
        }
    }

    /// Subscribes to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription to session events.
#[derive(Debug)]
pub struct SessionEvents {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionEvents {
    /// Waits for the next event.
    ///
    /// Returns `None` once the broadcaster is gone. If this subscriber fell
    /// behind, the skipped events are logged and the next retained one is
    /// returned.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next event if one is already buffered.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "session event subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use luminarch_core::IdentityId;

    fn identity() -> Identity {
        Identity::new(IdentityId::new("u1"), "u1@example.com".to_string(), Utc::now())
    }

    #[tokio::test]
    async fn each_subscriber_sees_each_event_once() {
        let broadcaster = SessionBroadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.emit(SessionEvent::SignedIn(identity()));
        broadcaster.emit(SessionEvent::SignedOut);

        assert_eq!(first.next().await, Some(SessionEvent::SignedIn(identity())));
        assert_eq!(first.next().await, Some(SessionEvent::SignedOut));
        assert_eq!(first.try_next(), None);

        assert_eq!(second.next().await, Some(SessionEvent::SignedIn(identity())));
        assert_eq!(second.next().await, Some(SessionEvent::SignedOut));
    }

    #[tokio::test]
    async fn subscription_ends_when_broadcaster_dropped() {
        let broadcaster = SessionBroadcaster::new();
        let mut events = broadcaster.subscribe();
        drop(broadcaster);

        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_retained_events() {
        let broadcaster = SessionBroadcaster::with_capacity(2);
        let mut events = broadcaster.subscribe();

        broadcaster.emit(SessionEvent::TokenRefreshed(identity()));
        broadcaster.emit(SessionEvent::TokenRefreshed(identity()));
        broadcaster.emit(SessionEvent::SignedOut);

        assert_eq!(
            events.next().await,
            Some(SessionEvent::TokenRefreshed(identity()))
        );
        assert_eq!(events.next().await, Some(SessionEvent::SignedOut));
    }

    #[test]
    fn emit_without_subscribers_is_harmless() {
        let broadcaster = SessionBroadcaster::new();
        broadcaster.emit(SessionEvent::SignedOut);
    }
}
