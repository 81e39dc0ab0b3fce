//! REST API client module for the Carefront backend.
//!
//! This module provides the `ApiClient` used by every portal to talk to
//! the Carefront API: profile, appointments, prescriptions and auth.
//!
//! The API uses JWT bearer token authentication. The client attaches the
//! stored access token to every non-exempt request and transparently
//! refreshes it once when the server answers 401.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
