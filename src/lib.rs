pub mod caller;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod response;
pub mod retry;

pub use caller::{ApiCaller, CallerConfig, call_api_endpoint};
pub use endpoints::Endpoint;
pub use error::CallError;
pub use response::ApiResponse;
pub use retry::{BackoffPolicy, Jitter};
