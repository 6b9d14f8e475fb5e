//! HTTP transport: per-call client construction, URL resolution and error classification.

mod client;

pub use client::{
    ClientOptions, DEFAULT_ACCEPT, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    ReqwestTransport, Transport, resolve_url,
};

#[cfg(test)]
pub use client::MockTransport;
