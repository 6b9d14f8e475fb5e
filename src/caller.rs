//! The API caller: one GET, retried with backoff, always answered with a response.

use futures_util::FutureExt;
use log::{debug, error};
use std::panic::AssertUnwindSafe;

use crate::endpoints::Endpoint;
use crate::error::CallError;
use crate::http::{ClientOptions, ReqwestTransport, Transport};
use crate::response::ApiResponse;
use crate::retry::{BackoffPolicy, with_backoff};

/// Client settings plus retry policy.
#[derive(Debug, Clone, Default)]
pub struct CallerConfig {
    pub client: ClientOptions,
    pub backoff: BackoffPolicy,
}

/// Issues GET requests and normalizes every outcome into an [`ApiResponse`].
///
/// Holds configuration only. Each call builds and releases its own
/// connection, so a caller can be shared between tasks freely.
pub struct ApiCaller<T = ReqwestTransport> {
    transport: T,
    backoff: BackoffPolicy,
}

impl ApiCaller<ReqwestTransport> {
    /// Creates a caller with the default headers, 5 s timeout and 5 s retry budget.
    pub fn new() -> Self {
        Self::with_config(CallerConfig::default())
    }

    /// Creates a caller over a `reqwest` transport built from `config`.
    pub fn with_config(config: CallerConfig) -> Self {
        Self {
            transport: ReqwestTransport::new(config.client),
            backoff: config.backoff,
        }
    }
}

impl Default for ApiCaller<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ApiCaller<T> {
    /// Creates a caller over any [`Transport`] implementation.
    pub fn with_transport(transport: T, backoff: BackoffPolicy) -> Self {
        Self { transport, backoff }
    }

    /// Returns the retry policy applied to each call.
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// GETs `endpoint` relative to `base_url`, with `params` as the query string.
    ///
    /// Upstream status errors and transport failures are retried until the
    /// backoff budget runs out. Failures come back as synthetic responses:
    /// the upstream status with body `"API error"`, or 500 with
    /// `"Network error"` or `"Unexpected error"`. A panic inside the
    /// transport counts as unexpected and is not retried.
    #[tracing::instrument(skip(self, params))]
    pub async fn call(
        &self,
        base_url: &str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> ApiResponse {
        let params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let transport = &self.transport;
        let query = &params;
        let result = with_backoff(
            "API call",
            &self.backoff,
            move || {
                AssertUnwindSafe(async move { transport.get(base_url, endpoint, query).await })
                    .catch_unwind()
                    .map(|outcome| outcome.unwrap_or_else(|panic| Err(CallError::from_panic(panic))))
            },
            CallError::is_transient,
        )
        .await;

        match result {
            Ok(response) => {
                log_body(&response);
                response
            }
            Err(e) => normalize(e),
        }
    }

    /// Same as [`ApiCaller::call`], with the path taken from a known [`Endpoint`].
    pub async fn call_endpoint(
        &self,
        base_url: &str,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> ApiResponse {
        self.call(base_url, endpoint.path(), params).await
    }
}

/// Calls `endpoint` with the default client settings and retry policy.
pub async fn call_api_endpoint(
    base_url: &str,
    endpoint: &str,
    params: &[(&str, &str)],
) -> ApiResponse {
    ApiCaller::new().call(base_url, endpoint, params).await
}

fn log_body(response: &ApiResponse) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    match response.json::<serde_json::Value>() {
        Ok(json) => debug!("Response JSON: {}", json),
        Err(_) => debug!("Response text: {}", response.text()),
    }
}

fn normalize(error: CallError) -> ApiResponse {
    match &error {
        CallError::UpstreamHttp { status, .. } => {
            error!("Request error occurred: {}", error);
            ApiResponse::api_error(*status)
        }
        CallError::Transport(_) => {
            error!("Request error occurred: {}", error);
            ApiResponse::network_error()
        }
        CallError::Unexpected(e) => {
            error!("Unexpected error occurred: {:?}", e);
            ApiResponse::unexpected_error()
        }
    }
}
