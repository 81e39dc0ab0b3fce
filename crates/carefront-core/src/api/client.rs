//! Session-aware API client for the Carefront backend.
//!
//! This module provides the `ApiClient` struct used by every portal for
//! authenticated API requests. Bearer credentials come from the shared
//! `SessionStore`; when the server rejects an access token with 401 the
//! client refreshes the credential once and replays the request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::SessionStore;
use crate::config::Config;
use crate::models::{
    ApiEnvelope, Appointment, BookAppointmentRequest, CareSummary, Paged, Prescription,
    PrescriptionStatus, Profile, ProfileUpdate,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Sign-in endpoint. Never carries a bearer header.
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Token refresh endpoint. Never carries a bearer header.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh-token";

/// The allowlist of paths that authenticate by payload, not bearer token.
const AUTH_EXEMPT_PATHS: [&str; 2] = [LOGIN_PATH, REFRESH_PATH];

const PROFILE_PATH: &str = "/api/v1/profile";
const APPOINTMENTS_PATH: &str = "/api/v1/appointments";
const PRESCRIPTIONS_PATH: &str = "/api/v1/prescriptions";

/// HTTP request timeout in seconds.
/// Matches the fetch timeout the web portals use.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// API client for the Carefront backend.
/// Clone is cheap - the HTTP pool, session store and refresh gate are shared,
/// so concurrent 401s across clones still coalesce into one refresh.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new API client over a shared session store
    pub fn new(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    // ===== Request pipeline =====

    /// Clear any previous Authorization value, then attach the stored
    /// bearer token when the path allows it and the session flag is set.
    /// Returns the token that was attached.
    fn apply_auth(&self, headers: &mut header::HeaderMap, path: &str) -> Option<String> {
        headers.remove(header::AUTHORIZATION);

        if is_auth_exempt(path) || !self.session.is_logged_in() {
            return None;
        }
        let token = self.session.access_token()?;
        match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Stored access token is not header-safe, sending without it");
                None
            }
        }
    }

    /// Send a request, refreshing the session and replaying the request
    /// at most once if the server rejects the access token.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut refreshed = false;

        loop {
            let mut headers = header::HeaderMap::new();
            let sent_token = self.apply_auth(&mut headers, path);

            let mut request = self.http.request(method.clone(), &url).headers(headers);
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, path, "Sending request");
            let response = request.send().await.map_err(ApiError::Connectivity)?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !is_auth_exempt(path) && !refreshed {
                debug!(path, "Access token rejected, refreshing session");
                self.refresh_session(sent_token.as_deref()).await?;
                refreshed = true;
                continue;
            }

            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &body_text));
            }
            return Ok(response);
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Only one task refreshes at a time; late arrivals re-check the
    /// stored token after the gate and skip the exchange when a peer
    /// already rotated it. Any refresh failure ends the session.
    async fn refresh_session(&self, sent_token: Option<&str>) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let current = self.session.access_token();
        if current.is_none() && sent_token.is_some() {
            // A concurrent refresh already failed and tore the session down.
            return Err(ApiError::SessionTerminated);
        }
        if current.as_deref() != sent_token {
            debug!("Session already refreshed by a concurrent request");
            return Ok(());
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            warn!("No refresh token in storage, ending session");
            self.session.end_session();
            return Err(ApiError::SessionTerminated);
        };

        match self.request_refresh(refresh_token.trim()).await {
            Ok(grant) => {
                self.session.set_access_token(&grant.access_token);
                if let Some(rotated) = grant.refresh_token {
                    self.session.set_refresh_token(&rotated);
                }
                info!("Session refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, ending session");
                self.session.end_session();
                Err(ApiError::SessionTerminated)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<RefreshGrant, ApiError> {
        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let body = serde_json::json!({ "refreshToken": refresh_token });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::Connectivity)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response body: {e}")))?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &text));
        }

        // Try parsing as a bare grant first, then as the response envelope
        if let Ok(grant) = serde_json::from_str::<RefreshGrant>(&text) {
            return Ok(grant);
        }
        decode_envelope(&text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path, None).await?;
        read_envelope(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path, Some(body)).await?;
        read_envelope(response).await
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::PUT, path, Some(body)).await?;
        read_envelope(response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::DELETE, path, None).await?;
        read_envelope(response).await
    }

    // ===== Authentication =====

    /// Sign in and open a session. The login request itself is
    /// bearer-exempt regardless of any stored session state.
    pub async fn login(&self, username: &str, password: &str) -> Result<Profile> {
        let body = serde_json::json!({ "username": username, "password": password });
        let grant: LoginGrant = self.post_json(LOGIN_PATH, &body).await?;

        self.session
            .sign_in(&grant.access_token, &grant.refresh_token, &grant.user_type);
        info!(role = %grant.user_type, "Signed in");
        Ok(grant.user)
    }

    /// Close the session locally. The backend keeps no session state
    /// beyond the tokens, so there is nothing to call.
    pub fn logout(&self) {
        self.session.end_session();
        info!("Signed out");
    }

    // ===== Profile =====

    /// Fetch the signed-in user's profile
    pub async fn fetch_profile(&self) -> Result<Profile> {
        Ok(self.get_json(PROFILE_PATH).await?)
    }

    /// Update the signed-in user's profile; unset fields are untouched
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        let body = serde_json::to_value(update).context("Failed to encode profile update")?;
        Ok(self.put_json(PROFILE_PATH, &body).await?)
    }

    // ===== Appointments =====

    /// Fetch one page of the user's appointments (pages are 1-based)
    pub async fn fetch_appointments(&self, page: u32) -> Result<Paged<Appointment>> {
        let path = format!(
            "{}?page={}&pageSize={}",
            APPOINTMENTS_PATH, page, DEFAULT_PAGE_SIZE
        );
        Ok(self.get_json(&path).await?)
    }

    /// Fetch a single appointment
    pub async fn fetch_appointment(&self, id: i64) -> Result<Appointment> {
        let path = format!("{}/{}", APPOINTMENTS_PATH, id);
        Ok(self.get_json(&path).await?)
    }

    /// Book a new appointment
    pub async fn book_appointment(&self, request: &BookAppointmentRequest) -> Result<Appointment> {
        let body = serde_json::to_value(request).context("Failed to encode booking request")?;
        Ok(self.post_json(APPOINTMENTS_PATH, &body).await?)
    }

    /// Cancel an appointment, returning it with its updated status
    pub async fn cancel_appointment(&self, id: i64) -> Result<Appointment> {
        let path = format!("{}/{}", APPOINTMENTS_PATH, id);
        Ok(self.delete_json(&path).await?)
    }

    // ===== Prescriptions =====

    /// Fetch one page of the user's prescriptions (pages are 1-based)
    pub async fn fetch_prescriptions(&self, page: u32) -> Result<Paged<Prescription>> {
        let path = format!(
            "{}?page={}&pageSize={}",
            PRESCRIPTIONS_PATH, page, DEFAULT_PAGE_SIZE
        );
        Ok(self.get_json(&path).await?)
    }

    /// Ask the prescribing doctor for a refill
    pub async fn request_refill(&self, prescription_id: i64) -> Result<Prescription> {
        let path = format!("{}/{}/refill-request", PRESCRIPTIONS_PATH, prescription_id);
        Ok(self.post_json(&path, &serde_json::json!({})).await?)
    }

    // ===== Dashboard =====

    /// Assemble the dashboard summary from three endpoints in parallel.
    /// A 401 raced by all three still refreshes the session only once.
    pub async fn fetch_care_summary(&self) -> Result<CareSummary> {
        let (profile, appointments, prescriptions) = futures::try_join!(
            self.fetch_profile(),
            self.fetch_appointments(1),
            self.fetch_prescriptions(1),
        )?;

        let now = Utc::now();
        Ok(CareSummary {
            profile,
            upcoming_appointments: appointments
                .items
                .into_iter()
                .filter(|a| a.is_upcoming(now))
                .collect(),
            active_prescriptions: prescriptions
                .items
                .into_iter()
                .filter(|p| p.status() == PrescriptionStatus::Active)
                .collect(),
        })
    }
}

/// Whether a path authenticates by payload instead of bearer token.
/// Matches exact paths, with or without a query string.
fn is_auth_exempt(path: &str) -> bool {
    AUTH_EXEMPT_PATHS.iter().any(|exempt| {
        path == *exempt
            || path
                .strip_prefix(exempt)
                .is_some_and(|rest| rest.starts_with('?'))
    })
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response body: {e}")))?;
    decode_envelope(&text)
}

/// Unwrap the standard `{ isSuccess, data, message }` envelope.
fn decode_envelope<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidResponse(format!("Undecodable response body: {e}")))?;

    if !envelope.is_success {
        let message = envelope
            .message
            .unwrap_or_else(|| "Request rejected by the server".to_string());
        return Err(ApiError::Rejected(message));
    }
    envelope
        .data
        .ok_or_else(|| ApiError::InvalidResponse("Response envelope carried no data".to_string()))
}

// ============================================================================
// Internal API response types for parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginGrant {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    #[serde(rename = "userType")]
    user_type: String,
    user: Profile,
}

#[derive(Debug, Deserialize)]
struct RefreshGrant {
    #[serde(rename = "accessToken")]
    access_token: String,
    // Rotation is server-controlled; absent means keep the current one.
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
}
