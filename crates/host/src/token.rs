//! Token values and bootstrap token request options

use common::Secret;
use std::fmt;

/// Options for a bootstrap token request.
///
/// The first request of a flow uses [`TokenOptions::initial`]. The step-up
/// request after a claims challenge uses [`TokenOptions::challenge`], which
/// carries the claims and nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Permit the host to show interactive sign-in UI
    pub allow_sign_in_prompt: bool,
    /// Request a token that can be exchanged for downstream access
    pub for_downstream_access: bool,
    /// Claims demanding additional authentication factors
    pub auth_challenge: Option<String>,
}

impl TokenOptions {
    pub fn initial() -> Self {
        Self {
            allow_sign_in_prompt: true,
            for_downstream_access: true,
            auth_challenge: None,
        }
    }

    pub fn challenge(claims: impl Into<String>) -> Self {
        Self {
            allow_sign_in_prompt: false,
            for_downstream_access: false,
            auth_challenge: Some(claims.into()),
        }
    }

    /// Whether the host may interact with the user to satisfy this request.
    pub fn is_interactive(&self) -> bool {
        self.allow_sign_in_prompt || self.auth_challenge.is_some()
    }
}

/// Short-lived token identifying the signed-in user to the exchange service.
#[derive(Clone)]
pub struct BootstrapToken(Secret<String>);

impl BootstrapToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl fmt::Debug for BootstrapToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BootstrapToken({:?})", self.0)
    }
}

/// Token scoped to the downstream API.
#[derive(Clone)]
pub struct AccessToken(Secret<String>);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({:?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_options_allow_prompt_and_downstream() {
        let options = TokenOptions::initial();
        assert!(options.allow_sign_in_prompt);
        assert!(options.for_downstream_access);
        assert!(options.auth_challenge.is_none());
        assert!(options.is_interactive());
    }

    #[test]
    fn challenge_options_carry_only_claims() {
        let options = TokenOptions::challenge("C1");
        assert!(!options.allow_sign_in_prompt);
        assert!(!options.for_downstream_access);
        assert_eq!(options.auth_challenge.as_deref(), Some("C1"));
        assert!(options.is_interactive());
    }

    #[test]
    fn default_options_are_silent() {
        assert!(!TokenOptions::default().is_interactive());
    }

    #[test]
    fn tokens_are_redacted_in_debug() {
        let bootstrap = BootstrapToken::new("T1");
        let access = AccessToken::new("A1");
        assert_eq!(format!("{bootstrap:?}"), "BootstrapToken([REDACTED])");
        assert_eq!(format!("{access:?}"), "AccessToken([REDACTED])");
        assert_eq!(bootstrap.expose(), "T1");
        assert_eq!(access.expose(), "A1");
    }
}
