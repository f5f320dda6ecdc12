//! HTTP layer shared by the forge and registry clients.
//!
//! This is the only place that interprets status codes. Callers get either a
//! decoded body or a [`PinError`]:
//!
//! - 2xx → body
//! - 403/429 with an `x-ratelimit-reset` header → [`PinError::RateLimited`]
//! - any other status → [`PinError::HttpStatus`]
//! - transport failure → [`PinError::Network`]
//!
//! Requests are sequential and carry no timeout or retry; a stalled upstream
//! stalls the run, and Ctrl-C is the only way out.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::{RATE_LIMIT_RESET_HEADER, USER_AGENT as USER_AGENT_VALUE};
use crate::core::PinError;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Thin wrapper over a [`reqwest::Client`] holding the optional forge token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpClient {
    /// Build a client. The token, if any, is only attached to forge API calls.
    pub fn new(token: Option<String>) -> Result<Self, PinError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| PinError::Network {
                url: String::new(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            token,
        })
    }

    /// Whether forge API calls are authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// GET a forge API resource and decode it.
    pub async fn get_api_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PinError> {
        debug!(url = %url, authenticated = self.is_authenticated(), "forge API request");
        let mut request = self.client.get(url).header(ACCEPT, GITHUB_JSON);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = self.send(url, request).await?;
        decode_json(url, response).await
    }

    /// GET a public JSON resource (no credentials) and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PinError> {
        debug!(url = %url, "JSON request");
        let response = self.send(url, self.client.get(url)).await?;
        decode_json(url, response).await
    }

    /// Download a resource fully into memory.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, PinError> {
        debug!(url = %url, "downloading");
        let response = self.send(url, self.client.get(url)).await?;
        let bytes = response.bytes().await.map_err(|e| PinError::Network {
            url: url.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;
        debug!(url = %url, bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PinError> {
        let response = request.send().await.map_err(|e| PinError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        debug!(url = %url, status = status.as_u16(), "upstream returned an error status");
        if let Some(reset_at) = rate_limit_reset(status, response.headers()) {
            return Err(PinError::RateLimited {
                reset_at,
                authenticated: self.is_authenticated(),
            });
        }

        Err(PinError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

async fn decode_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, PinError> {
    let text = response.text().await.map_err(|e| PinError::Network {
        url: url.to_string(),
        message: format!("failed to read response body: {e}"),
    })?;
    serde_json::from_str(&text).map_err(|e| PinError::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Reset time of a throttled response, if this response is one.
///
/// Only 403 and 429 responses that carry a parseable `x-ratelimit-reset`
/// header count as throttling; every other error stays a plain HTTP error.
#[must_use]
pub fn rate_limit_reset(status: StatusCode, headers: &HeaderMap) -> Option<DateTime<Utc>> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    let seconds: i64 = headers.get(RATE_LIMIT_RESET_HEADER)?.to_str().ok()?.trim().parse().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Lowercase hex SHA-256 of some bytes.
#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
