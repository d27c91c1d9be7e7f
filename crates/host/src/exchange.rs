//! Result of trading a bootstrap token for downstream access

use serde::{Deserialize, Serialize};

use crate::token::AccessToken;

/// Outcome of one exchange call.
///
/// The three cases are mutually exclusive. A claims challenge is a normal
/// protocol step, not a failure.
#[derive(Debug, Clone)]
pub enum ExchangeResponse {
    /// Access token scoped to the downstream API
    Success { access_token: AccessToken },
    /// The identity service demands step-up authentication
    ChallengeRequired { claims: String },
    /// The identity service rejected the exchange
    Failed(AadError),
}

impl ExchangeResponse {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeResponse::Success { .. } => "success",
            ExchangeResponse::ChallengeRequired { .. } => "challenge_required",
            ExchangeResponse::Failed(_) => "failed",
        }
    }
}

/// Error body returned by the identity service.
///
/// These arrive inside a well-formed response rather than as a transport
/// failure, so they are data, not `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadError {
    pub error: String,
    #[serde(default)]
    pub error_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_codes: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl AadError {
    pub fn new(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_description: description.into(),
            ..Default::default()
        }
    }

    /// Whether the description or code list mentions the given `AADSTS` code.
    pub fn has_code(&self, code: u64) -> bool {
        self.error_codes.contains(&code)
            || self
                .error_description
                .contains(&format!("AADSTS{code}"))
    }
}
