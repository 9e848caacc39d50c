//! API client for the vaccination schedule service.
//!
//! `ApiClient` holds no token of its own: callers pass the token read from
//! their `SessionStore` on every authenticated call.

use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::models::{Doctor, Immunization, Patient, PatientSchedule, Vaccine};

use super::{AuthError, FetchError};

// ============================================================================
// Constants
// ============================================================================

const TOKEN_PATH: &str = "/auth/token";
const PATIENTS_PATH: &str = "/patients/";
const CURRENT_DOCTOR_PATH: &str = "/doctors/me";
const VACCINES_PATH: &str = "/vaccines/";
const HEALTH_PATH: &str = "/health";

/// Maximum number of retries for rate-limited (429) reads.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// API client for the vaccination schedule service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` with the default request timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(&config.api_base_url, config.request_timeout())
    }

    /// Override the first rate-limit backoff delay; later delays double it.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Authentication =====

    /// Exchange credentials for a bearer token.
    ///
    /// The token is returned, not stored; persisting it is the caller's job.
    /// No retries are attempted.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let url = self.url(TOKEN_PATH);
        debug!(username, "Requesting token");

        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, "Token request rejected");
            return Err(AuthError::from_status(status, &text));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::InvalidResponse("Empty access token".to_string()));
        }

        info!(username, "Token issued");
        Ok(parsed.access_token)
    }

    // ===== Request helpers =====

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, FetchError> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status.as_u16() == 429 {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::from_status(status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, FetchError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            FetchError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    /// Authenticated GET with the bearer token attached once per attempt.
    async fn get<T: DeserializeOwned>(&self, token: Option<&str>, path: &str) -> Result<T, FetchError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(FetchError::MissingToken)?;
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self.client.get(&url).bearer_auth(token).send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::decode(response, &url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(FetchError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch all patients, in the order the server returns them.
    pub async fn list_patients(&self, token: Option<&str>) -> Result<Vec<Patient>, FetchError> {
        let patients: Vec<Patient> = self.get(token, PATIENTS_PATH).await?;
        debug!(count = patients.len(), "Patients fetched");
        Ok(patients)
    }

    /// Fetch the doctor the token was issued to
    pub async fn current_doctor(&self, token: Option<&str>) -> Result<Doctor, FetchError> {
        self.get(token, CURRENT_DOCTOR_PATH).await
    }

    /// Fetch the vaccine catalog
    pub async fn list_vaccines(&self, token: Option<&str>) -> Result<Vec<Vaccine>, FetchError> {
        let vaccines: Vec<Vaccine> = self.get(token, VACCINES_PATH).await?;
        debug!(count = vaccines.len(), "Vaccines fetched");
        Ok(vaccines)
    }

    /// Fetch given and missing mandatory vaccines for a patient
    pub async fn patient_schedule(
        &self,
        token: Option<&str>,
        patient_id: i64,
    ) -> Result<PatientSchedule, FetchError> {
        self.get(token, &format!("/schedule/{}", patient_id)).await
    }

    /// Fetch immunizations recorded for a patient
    pub async fn patient_immunizations(
        &self,
        token: Option<&str>,
        patient_id: i64,
    ) -> Result<Vec<Immunization>, FetchError> {
        self.get(token, &format!("/immunizations/patient/{}", patient_id))
            .await
    }

    /// Unauthenticated liveness check. Returns the reported status string.
    pub async fn health(&self) -> Result<String, FetchError> {
        let url = self.url(HEALTH_PATH);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status, &body));
        }
        let health: HealthResponse = Self::decode(response, &url).await?;
        Ok(health.status)
    }
}
