//! Error kinds produced by a single API call attempt.

use reqwest::StatusCode;
use std::any::Any;

/// Failure of one request attempt, classified for retry and normalization.
#[derive(Debug)]
pub enum CallError {
    /// The upstream server answered with a status code >= 400.
    UpstreamHttp {
        status: StatusCode,
        source: Option<reqwest::Error>,
    },
    /// DNS, connect, timeout or body read failure, or a request URL without
    /// an `http`/`https` scheme.
    Transport(anyhow::Error),
    /// Anything else, e.g. a malformed URL or a panic inside the transport.
    Unexpected(anyhow::Error),
}

impl CallError {
    /// Builds an upstream error from a bare status code.
    pub fn upstream(status: StatusCode) -> Self {
        CallError::UpstreamHttp {
            status,
            source: None,
        }
    }

    /// Builds a transport error that did not come from `reqwest`.
    pub fn transport(error: impl Into<anyhow::Error>) -> Self {
        CallError::Transport(error.into())
    }

    /// Turns the payload of a caught panic into an unexpected error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        CallError::Unexpected(anyhow::anyhow!("panic during request: {}", message))
    }

    /// Whether the retry policy should try again after this error.
    ///
    /// Unexpected errors are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CallError::UpstreamHttp { .. } | CallError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for CallError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            return CallError::Unexpected(anyhow::Error::from(error));
        }
        match error.status() {
            Some(status) => CallError::UpstreamHttp {
                status,
                source: Some(error),
            },
            None => CallError::Transport(anyhow::Error::from(error)),
        }
    }
}

impl From<anyhow::Error> for CallError {
    fn from(error: anyhow::Error) -> Self {
        CallError::Unexpected(error)
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::UpstreamHttp {
                source: Some(source),
                ..
            } => write!(f, "HTTP status error: {}", source),
            CallError::UpstreamHttp { status, .. } => {
                write!(f, "HTTP status error: {}", status)
            }
            CallError::Transport(e) => write!(f, "Transport error: {:#}", e),
            CallError::Unexpected(e) => write!(f, "Unexpected error: {:#}", e),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::UpstreamHttp { source, .. } => source
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            CallError::Transport(e) => Some(&**e),
            CallError::Unexpected(e) => Some(&**e),
        }
    }
}
