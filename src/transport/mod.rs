//! Wire-level plumbing: canonical query strings, retry decisions and the
//! retrying HTTP transport.

pub mod http;
pub mod query;
pub mod retry;

pub use http::{Authenticator, BearerAuth, HttpResponse, HttpTransport, PendingRequest};
pub use query::{canonical_query_string, url_encode};
pub use retry::{DefaultRetryPolicy, RetryPolicy};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
