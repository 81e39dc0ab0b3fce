use crate::models::{Appointment, Prescription, Profile};

/// Dashboard aggregate assembled client-side from three endpoints.
#[derive(Debug, Clone)]
pub struct CareSummary {
    pub profile: Profile,
    pub upcoming_appointments: Vec<Appointment>,
    pub active_prescriptions: Vec<Prescription>,
}
