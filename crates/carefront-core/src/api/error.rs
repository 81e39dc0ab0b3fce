use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// No response arrived at all. The message is the fixed string the
    /// portals show in their connectivity toast.
    #[error("Failed to connect to the server")]
    Connectivity(#[source] reqwest::Error),

    #[error("Unauthorized - access token was rejected")]
    Unauthorized,

    /// The credential refresh failed and the session has been cleared.
    #[error("Session expired - please sign in again")]
    SessionTerminated,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP-level success whose envelope reported `isSuccess: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            s => ApiError::Http {
                status: s,
                body: truncated,
            },
        }
    }
}
