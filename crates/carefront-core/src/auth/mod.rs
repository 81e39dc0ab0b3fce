//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `SessionStore`: persistent key/value session storage with a
//!   sign-in/sign-out broadcast channel
//! - `CredentialStore`: secure OS-level credential storage via keyring
//!
//! Sessions are persisted to `session.json` under the data directory
//! using the same key names as the web portals.

pub mod credentials;
pub mod store;

pub use credentials::CredentialStore;
pub use store::{SessionState, SessionStore};
