//! Errors raised by collaborators

use thiserror::Error;

/// Office host error codes reported by bootstrap token requests.
pub mod codes {
    /// No user is signed in and the request did not allow a prompt
    pub const NOT_SIGNED_IN: &str = "13001";
    /// The user dismissed sign-in or consent
    pub const USER_ABORTED: &str = "13002";
    /// The signed-in account type is not supported
    pub const UNSUPPORTED_USER_TYPE: &str = "13003";
    /// Consent has not been granted for the requested scopes
    pub const INVALID_GRANT: &str = "13005";
    /// Host-side client error; usually cleared by signing in again
    pub const CLIENT_ERROR: &str = "13006";
    /// The host could not obtain a token
    pub const TOKEN_UNAVAILABLE: &str = "13007";
    /// A previous token request is still in progress
    pub const OPERATION_IN_PROGRESS: &str = "13008";
    /// Browser security zone configuration blocks sign-in
    pub const ZONE_CONFIGURATION: &str = "13010";
}

/// Coded error raised locally, usually by the host's sign-in machinery.
///
/// `code` is whatever the host reports: Office hosts use numeric codes in
/// the 13000 range, other hosts may use strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("client error {code}: {message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
}

impl ClientError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error returned by any collaborator call.
///
/// The flow routes on the variant: coded errors go to the client error
/// handler, everything else is shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{0}")]
    Unclassified(String),
}

impl HostError {
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_display_includes_code() {
        let err = ClientError::new("13002", "User aborted");
        assert_eq!(err.to_string(), "client error 13002: User aborted");
    }

    #[test]
    fn host_error_from_client_error_is_transparent() {
        let err: HostError = ClientError::new("E1", "denied").into();
        assert!(matches!(err, HostError::Client(ref c) if c.code == "E1"));
        assert_eq!(err.to_string(), "client error E1: denied");
    }

    #[test]
    fn unclassified_display_is_raw_message() {
        let err = HostError::unclassified("connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }
}
