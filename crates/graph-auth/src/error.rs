//! Error types for identity and Graph calls

use host::HostError;

/// Transport and decoding failures.
///
/// Identity-service rejections of an exchange are not errors here; they are
/// returned as `ExchangeResponse::Failed`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("downstream API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Result alias for identity and Graph calls.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for HostError {
    fn from(err: Error) -> Self {
        HostError::Unclassified(err.to_string())
    }
}
