//! Normalized response returned by every API call.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

/// Body of the synthetic response for an upstream status error.
pub const API_ERROR_BODY: &str = "API error";
/// Body of the synthetic response for a transport failure.
pub const NETWORK_ERROR_BODY: &str = "Network error";
/// Body of the synthetic response for any other failure.
pub const UNEXPECTED_ERROR_BODY: &str = "Unexpected error";

/// Status, body and headers of a completed call.
///
/// The status code is always populated, whether the response came from the
/// upstream server or was synthesized after a failure.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Synthetic response for an upstream status error; keeps the upstream status.
    pub fn api_error(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), API_ERROR_BODY)
    }

    /// Synthetic 500 response for DNS, connect, timeout and URL scheme failures.
    pub fn network_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            NETWORK_ERROR_BODY,
        )
    }

    /// Synthetic 500 response for anything else.
    pub fn unexpected_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            UNEXPECTED_ERROR_BODY,
        )
    }

    /// Reads a live `reqwest` response to the end.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, body.to_vec()))
    }

    /// Returns the HTTP status, upstream or synthetic.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status as a plain integer.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the upstream headers; empty for synthetic responses.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the response, returning the body bytes.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).context("Failed to parse JSON response body")
    }
}
