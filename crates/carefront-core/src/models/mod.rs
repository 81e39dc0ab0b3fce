//! Data models for Carefront entities.
//!
//! This module contains the data structures shared by the portals:
//!
//! - `Profile`, `UserType`: account identity and role
//! - `Appointment`, `BookAppointmentRequest`: visit scheduling
//! - `Prescription`: medication and refill tracking
//! - `ApiEnvelope`, `Paged`: the response envelope and pagination wrapper
//! - `CareSummary`: the client-assembled dashboard aggregate

pub mod appointment;
pub mod envelope;
pub mod prescription;
pub mod summary;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, BookAppointmentRequest};
pub use envelope::{ApiEnvelope, Paged};
pub use prescription::{Prescription, PrescriptionStatus};
pub use summary::CareSummary;
pub use user::{Profile, ProfileUpdate, UserType};
