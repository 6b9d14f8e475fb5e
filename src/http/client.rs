//! A single GET attempt over a freshly built `reqwest` client.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url, redirect};
use std::time::Duration;

use crate::error::CallError;
use crate::response::ApiResponse;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_ACCEPT: &str = "application/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Performs one GET attempt against `base_url` + `endpoint`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        base_url: &str,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<ApiResponse, CallError>;
}

/// Settings for the per-call HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub accept: String,
    /// Applies to each attempt separately.
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Transport that builds a new `reqwest::Client` for every attempt and drops
/// it, with its connection pool, before returning.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    options: ClientOptions,
}

impl ReqwestTransport {
    /// Creates a transport that builds its clients from `options`.
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    /// Returns the client settings.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn build_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.options.user_agent).context("Invalid User-Agent header")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&self.options.accept).context("Invalid Accept header")?,
        );

        Client::builder()
            .default_headers(headers)
            .redirect(redirect::Policy::limited(self.options.max_redirects))
            .timeout(self.options.timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, params))]
    async fn get(
        &self,
        base_url: &str,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<ApiResponse, CallError> {
        let url = resolve_url(base_url, endpoint)?;
        let client = self.build_client()?;

        debug!("base_url: {}, api_endpoint: {}", base_url, endpoint);

        let mut request = client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await?.error_for_status()?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(CallError::upstream(status));
        }

        Ok(ApiResponse::from_reqwest(response).await?)
    }
}

/// Joins `endpoint` onto `base_url`, keeping any path prefix of the base.
///
/// An endpoint that is already an absolute URL is used as is. A URL with no
/// scheme, or with a scheme other than `http`/`https`, is a transport error;
/// one that cannot be parsed at all is unexpected.
pub fn resolve_url(base_url: &str, endpoint: &str) -> Result<Url, CallError> {
    if let Ok(url) = Url::parse(endpoint) {
        if url.has_host() {
            return check_scheme(url);
        }
    }

    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    match Url::parse(&joined) {
        Ok(url) => check_scheme(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Err(CallError::transport(anyhow!(
            "Request URL is missing an 'http://' or 'https://' protocol: {}",
            joined
        ))),
        Err(e) => Err(CallError::Unexpected(
            anyhow::Error::from(e).context(format!("Invalid request URL: {}", joined)),
        )),
    }
}

fn check_scheme(url: Url) -> Result<Url, CallError> {
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(CallError::transport(anyhow!(
            "Request URL has an unsupported protocol '{}://': {}",
            scheme,
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_url_plain_host() {
        let url = resolve_url("http://localhost:8000", "/v0/players/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/v0/players/");
    }

    #[test]
    fn test_resolve_url_trailing_slash_base() {
        let url = resolve_url("http://localhost:8000/", "/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_resolve_url_keeps_base_path() {
        let url = resolve_url("https://api.example.com/prefix/", "v0/teams/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/prefix/v0/teams/");
    }

    #[test]
    fn test_resolve_url_absolute_endpoint() {
        let url = resolve_url("http://localhost:8000", "http://other.example/x").unwrap();
        assert_eq!(url.as_str(), "http://other.example/x");
    }

    #[test]
    fn test_resolve_url_missing_scheme_is_transport() {
        let err = resolve_url("not a url", "/v0/counts/").unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "{:?}", err);
        assert!(err.to_string().contains("missing an 'http://'"));

        let err = resolve_url("localhost", "/v0/counts/").unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "{:?}", err);
    }

    #[test]
    fn test_resolve_url_unsupported_scheme_is_transport() {
        let err = resolve_url("ftp://example.test", "/v0/teams/").unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "{:?}", err);
        assert!(err.to_string().contains("ftp"));

        let err = resolve_url("http://localhost:8000", "ftp://example.test/x").unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "{:?}", err);
    }

    #[test]
    fn test_resolve_url_malformed_is_unexpected() {
        let err = resolve_url("http://localhost:99999", "/").unwrap_err();
        assert!(matches!(err, CallError::Unexpected(_)), "{:?}", err);

        let err = resolve_url("http://exa mple.test", "/").unwrap_err();
        assert!(matches!(err, CallError::Unexpected(_)), "{:?}", err);
    }

    #[test]
    fn test_build_client_rejects_invalid_header() {
        let transport = ReqwestTransport::new(ClientOptions {
            user_agent: "bad\nagent".to_string(),
            ..ClientOptions::default()
        });
        assert!(transport.build_client().is_err());
    }

    #[tokio::test]
    async fn test_get_success_sends_fixed_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/counts/")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"league_count": 5}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let response = transport
            .get(&server.url(), "/v0/counts/", &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), r#"{"league_count": 5}"#);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_get_sends_exact_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/players/")
            .match_query(Matcher::Exact("skip=0&limit=50".to_string()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let response = transport
            .get(
                &server.url(),
                "/v0/players/",
                &params(&[("skip", "0"), ("limit", "50")]),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status_code(), 200);
    }

    #[tokio::test]
    async fn test_get_follows_redirects() {
        let mut server = mockito::Server::new_async().await;
        let redirect = server
            .mock("GET", "/v0/teams")
            .with_status(307)
            .with_header("location", "/v0/teams/")
            .create_async()
            .await;
        let target = server
            .mock("GET", "/v0/teams/")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let response = transport.get(&server.url(), "/v0/teams", &[]).await.unwrap();

        redirect.assert_async().await;
        target.assert_async().await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body(), b"[]");
    }

    #[tokio::test]
    async fn test_get_status_error_is_upstream() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v0/weeks/")
            .with_status(404)
            .with_body("missing")
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let err = transport
            .get(&server.url(), "/v0/weeks/", &[])
            .await
            .unwrap_err();

        match err {
            CallError::UpstreamHttp { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("Expected UpstreamHttp, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_connection_refused_is_transport() {
        let transport = ReqwestTransport::default();
        let err = transport
            .get("http://127.0.0.1:1", "/", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Transport(_)));
    }

    #[tokio::test]
    async fn test_get_malformed_base_url_is_unexpected() {
        let transport = ReqwestTransport::default();
        let err = transport
            .get("http://localhost:99999", "/", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_get_unsupported_scheme_is_transport() {
        let transport = ReqwestTransport::default();
        let err = transport
            .get("ftp://example.test", "/v0/teams/", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Transport(_)));

        let err = transport.get("not a url", "/v0/teams/", &[]).await.unwrap_err();
        assert!(matches!(err, CallError::Transport(_)));
    }
}
