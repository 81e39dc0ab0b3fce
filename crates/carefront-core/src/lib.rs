//! Core library for the Carefront telehealth platform clients.
//!
//! This crate carries everything the patient, doctor, pharmacist and
//! admin portals share:
//!
//! - `api`: the session-aware `ApiClient` with transparent token refresh
//! - `auth`: persistent session storage and OS-keychain credentials
//! - `models`: typed request/response payloads for the Carefront API
//! - `config`: application configuration and storage locations

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, SessionState, SessionStore};
pub use config::Config;
