//! PeerFlow REST API client.
//!
//! Thin HTTP wrapper over the orchestrator's assignment endpoint and the auth
//! service's login endpoint. Response parsing lives in pure functions so it
//! can be tested without a server.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, non-2xx statuses and bodies that do not match the
//! domain model are reported as distinct `ApiError` variants, but callers
//! treat them alike: nothing is retried here and tokens are never refreshed.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::HttpTimeouts;
use crate::model::{AssignmentDetails, LoginResponse};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by API client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("API request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status.
    #[error("API response error: status {status}{}", format_detail(.detail.as_deref()))]
    Status { status: u16, detail: Option<String> },

    /// The response body did not match the expected payload.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

fn format_detail(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// HTTP status for `Status` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wrap an already configured `reqwest::Client`.
    #[must_use]
    pub fn from_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// `GET {base_url}/api/v1/assignments/{assignment_id}`.
    ///
    /// The bearer header is omitted when `access_token` is `None`; the API
    /// rejects such requests and the rejection surfaces as `ApiError::Status`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a payload
    /// that does not match [`AssignmentDetails`].
    pub async fn fetch_assignment_details(
        &self,
        base_url: &str,
        assignment_id: &str,
        access_token: Option<&str>,
    ) -> Result<AssignmentDetails, ApiError> {
        let mut request = self
            .http
            .get(assignment_endpoint(base_url, assignment_id))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let (status, text) = read_response(response).await?;
        check_status(status, &text)?;
        parse_assignment_details(&text)
    }

    /// `POST {auth_base_url}/authentication/login` with an OAuth2 password form.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, rejected credentials, or a
    /// payload that does not match [`LoginResponse`].
    pub async fn login(&self, auth_base_url: &str, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(login_endpoint(auth_base_url))
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let (status, text) = read_response(response).await?;
        check_status(status, &text)?;
        parse_login_response(&text)
    }
}

async fn read_response(response: reqwest::Response) -> Result<(u16, String), ApiError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    Ok((status, text))
}

// =============================================================================
// PURE HELPERS
// =============================================================================

pub(crate) fn assignment_endpoint(base_url: &str, assignment_id: &str) -> String {
    format!("{}/api/v1/assignments/{assignment_id}", base_url.trim_end_matches('/'))
}

pub(crate) fn login_endpoint(auth_base_url: &str) -> String {
    format!("{}/authentication/login", auth_base_url.trim_end_matches('/'))
}

fn check_status(status: u16, body: &str) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(ApiError::Status { status, detail: error_detail(body) })
}

/// Extract `detail` from the services' `{"detail": "..."}` error bodies.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub(crate) fn parse_assignment_details(text: &str) -> Result<AssignmentDetails, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

pub(crate) fn parse_login_response(text: &str) -> Result<LoginResponse, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
