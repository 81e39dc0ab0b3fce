use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Patient,
    Doctor,
    Pharmacist,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Patient => "patient",
            UserType::Doctor => "doctor",
            UserType::Pharmacist => "pharmacist",
            UserType::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<UserType> {
        match value.to_ascii_lowercase().as_str() {
            "patient" => Some(UserType::Patient),
            "doctor" => Some(UserType::Doctor),
            "pharmacist" => Some(UserType::Pharmacist),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Patient => write!(f, "Patient"),
            UserType::Doctor => write!(f, "Doctor"),
            UserType::Pharmacist => write!(f, "Pharmacist"),
            UserType::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.user_type.as_deref().and_then(UserType::parse)
    }
}

/// Partial profile update; unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "dateOfBirth", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}
