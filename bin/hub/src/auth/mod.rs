//! Authentication against the hosted identity provider.
//!
//! This module provides:
//! - A REST client for the provider's `/auth/v1` endpoints
//! - File-backed session persistence between runs
//! - [`ProviderClient`], implementing both [`SessionStore`] and
//!   [`Authenticator`] on top of the two
//!
//! [`SessionStore`]: luminarch_platform_access::SessionStore
//! [`Authenticator`]: luminarch_platform_access::Authenticator

pub mod api;
pub mod client;
pub mod session_file;

pub use api::AuthApi;
pub use client::ProviderClient;
pub use session_file::SessionFile;
