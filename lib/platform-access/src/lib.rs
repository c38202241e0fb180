//! Identity and session lifecycle for the Luminarch client hub.
//!
//! This crate provides:
//! - The `Identity` record handed out by the identity provider
//! - `Session` tokens and their expiry
//! - The `SessionStore` seam (current identity, change events, sign-out)
//! - The `Authenticator` seam (password, magic link and sign-up flows)
//! - Identity provider configuration and authentication error types
//!
//! # Example
//!
//! ```
//! use luminarch_platform_access::{Identity, SessionBroadcaster, SessionEvent};
//! use chrono::Utc;
//!
//! let identity = Identity::new("u1".into(), "ada@example.com".to_string(), Utc::now())
//!     .with_full_name(Some("Ada Lovelace".to_string()));
//! assert_eq!(identity.display_name(), "Ada Lovelace");
//!
//! let broadcaster = SessionBroadcaster::new();
//! let _events = broadcaster.subscribe();
//! broadcaster.emit(SessionEvent::SignedIn(identity));
//! ```

pub mod auth;
pub mod error;
pub mod events;
pub mod identity;
pub mod provider;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use auth::{Authenticator, SignUpOutcome, SignUpRequest};
pub use error::AuthenticationError;
pub use events::{SessionBroadcaster, SessionEvent, SessionEvents};
pub use identity::Identity;
pub use provider::ProviderConfig;
pub use session::Session;
pub use store::SessionStore;
