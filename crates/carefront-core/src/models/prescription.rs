use chrono::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrescriptionStatus {
    Active,
    RefillRequested,
    Expired,
    Cancelled,
    Unknown,
}

impl std::fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrescriptionStatus::Active => write!(f, "Active"),
            PrescriptionStatus::RefillRequested => write!(f, "Refill Requested"),
            PrescriptionStatus::Expired => write!(f, "Expired"),
            PrescriptionStatus::Cancelled => write!(f, "Cancelled"),
            PrescriptionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(default)]
    pub id: i64,
    pub medication: String,
    pub dosage: Option<String>,
    pub instructions: Option<String>,
    #[serde(rename = "prescribedBy")]
    pub prescribed_by: Option<String>,
    #[serde(rename = "issuedAt")]
    pub issued_at: Option<String>,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<String>,
    #[serde(rename = "refillsRemaining", default)]
    pub refills_remaining: i32,
    pub status: Option<String>,
    pub pharmacy: Option<String>,
}

impl Prescription {
    pub fn status(&self) -> PrescriptionStatus {
        match self.status.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("active") => PrescriptionStatus::Active,
            Some(s)
                if s.eq_ignore_ascii_case("refillrequested")
                    || s.eq_ignore_ascii_case("refill_requested") =>
            {
                PrescriptionStatus::RefillRequested
            }
            Some(s) if s.eq_ignore_ascii_case("expired") => PrescriptionStatus::Expired,
            Some(s) if s.eq_ignore_ascii_case("cancelled") => PrescriptionStatus::Cancelled,
            _ => PrescriptionStatus::Unknown,
        }
    }

    pub fn can_request_refill(&self) -> bool {
        self.status() == PrescriptionStatus::Active && self.refills_remaining > 0
    }

    pub fn formatted_issued(&self) -> String {
        match &self.issued_at {
            Some(date) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                    dt.format("%b %d, %Y").to_string()
                } else {
                    date.chars().take(10).collect()
                }
            }
            None => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prescription(status: Option<&str>, refills: i32) -> Prescription {
        Prescription {
            id: 1,
            medication: "Lisinopril".to_string(),
            dosage: Some("10mg".to_string()),
            instructions: None,
            prescribed_by: Some("Dr. Osei".to_string()),
            issued_at: Some("2026-01-10T09:00:00Z".to_string()),
            expires_at: None,
            refills_remaining: refills,
            status: status.map(String::from),
            pharmacy: None,
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            prescription(Some("active"), 1).status(),
            PrescriptionStatus::Active
        );
        assert_eq!(
            prescription(Some("refillRequested"), 0).status(),
            PrescriptionStatus::RefillRequested
        );
        assert_eq!(prescription(None, 0).status(), PrescriptionStatus::Unknown);
    }

    #[test]
    fn test_can_request_refill() {
        assert!(prescription(Some("active"), 2).can_request_refill());
        assert!(!prescription(Some("active"), 0).can_request_refill());
        assert!(!prescription(Some("expired"), 2).can_request_refill());
    }

    #[test]
    fn test_formatted_issued() {
        assert_eq!(prescription(Some("active"), 1).formatted_issued(), "Jan 10, 2026");
    }
}
