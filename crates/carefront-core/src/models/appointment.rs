use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    Unknown,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "Requested"),
            AppointmentStatus::Confirmed => write!(f, "Confirmed"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::NoShow => write!(f, "No Show"),
            AppointmentStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "scheduledStart")]
    pub scheduled_start: Option<String>,
    #[serde(rename = "durationMinutes", default)]
    pub duration_minutes: Option<i32>,
    pub status: Option<String>,
    #[serde(rename = "doctorName")]
    pub doctor_name: Option<String>,
    pub specialty: Option<String>,
    // "video" or "inPerson"
    #[serde(rename = "visitType")]
    pub visit_type: Option<String>,
    #[serde(rename = "videoLink")]
    pub video_link: Option<String>,
    pub reason: Option<String>,
}

impl Appointment {
    pub fn status(&self) -> AppointmentStatus {
        match self.status.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("requested") => AppointmentStatus::Requested,
            Some(s) if s.eq_ignore_ascii_case("confirmed") => AppointmentStatus::Confirmed,
            Some(s) if s.eq_ignore_ascii_case("completed") => AppointmentStatus::Completed,
            Some(s) if s.eq_ignore_ascii_case("cancelled") => AppointmentStatus::Cancelled,
            Some(s) if s.eq_ignore_ascii_case("noshow") || s.eq_ignore_ascii_case("no_show") => {
                AppointmentStatus::NoShow
            }
            _ => AppointmentStatus::Unknown,
        }
    }

    pub fn start_datetime(&self) -> Option<DateTime<chrono::FixedOffset>> {
        self.scheduled_start
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    /// In the future and still happening.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        if matches!(
            self.status(),
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow
        ) {
            return false;
        }
        self.start_datetime().map(|start| start > now).unwrap_or(false)
    }

    pub fn is_video_visit(&self) -> bool {
        self.visit_type.as_deref() == Some("video")
    }

    pub fn formatted_start(&self) -> String {
        match &self.scheduled_start {
            Some(date) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                    dt.format("%b %d, %Y @ %I:%M %p").to_string()
                } else {
                    date.chars().take(16).collect()
                }
            }
            None => "TBD".to_string(),
        }
    }
}

/// Payload for booking a new appointment.
#[derive(Debug, Clone, Serialize)]
pub struct BookAppointmentRequest {
    #[serde(rename = "doctorId")]
    pub doctor_id: i64,
    #[serde(rename = "scheduledStart")]
    pub scheduled_start: String,
    #[serde(rename = "visitType")]
    pub visit_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn appointment(scheduled_start: Option<&str>, status: Option<&str>) -> Appointment {
        Appointment {
            id: 1,
            scheduled_start: scheduled_start.map(String::from),
            duration_minutes: Some(30),
            status: status.map(String::from),
            doctor_name: Some("Dr. Osei".to_string()),
            specialty: None,
            visit_type: Some("video".to_string()),
            video_link: None,
            reason: None,
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            appointment(None, Some("confirmed")).status(),
            AppointmentStatus::Confirmed
        );
        assert_eq!(
            appointment(None, Some("CANCELLED")).status(),
            AppointmentStatus::Cancelled
        );
        assert_eq!(
            appointment(None, Some("noShow")).status(),
            AppointmentStatus::NoShow
        );
        assert_eq!(appointment(None, None).status(), AppointmentStatus::Unknown);
    }

    #[test]
    fn test_is_upcoming() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert!(appointment(Some("2026-03-02T09:00:00Z"), Some("confirmed")).is_upcoming(now));
        assert!(!appointment(Some("2026-02-01T09:00:00Z"), Some("confirmed")).is_upcoming(now));
        assert!(!appointment(Some("2026-03-02T09:00:00Z"), Some("cancelled")).is_upcoming(now));
        assert!(!appointment(None, Some("confirmed")).is_upcoming(now));
    }

    #[test]
    fn test_formatted_start_falls_back() {
        assert_eq!(appointment(None, None).formatted_start(), "TBD");
        assert_eq!(
            appointment(Some("sometime soon"), None).formatted_start(),
            "sometime soon"
        );
    }
}
