//! Default error handlers that report through the Notifier

use std::sync::Arc;

use host::{AadError, AadErrorHandler, ClientError, ClientErrorHandler, Notifier, codes};
use tracing::warn;

/// Expired or not-yet-valid assertion in the exchange
const AADSTS_EXPIRED_ASSERTION: u64 = 500133;

/// Consent missing for the downstream scopes
const AADSTS_CONSENT_REQUIRED: u64 = 65001;

/// Message for a coded client error.
pub fn client_error_message(error: &ClientError) -> String {
    match error.code.as_str() {
        codes::NOT_SIGNED_IN => "No one is signed in. Sign in and try again.".to_string(),
        codes::USER_ABORTED => {
            "You can't use this feature until you sign in and grant consent.".to_string()
        }
        codes::UNSUPPORTED_USER_TYPE => {
            "Sign in with a work or school account to use this feature.".to_string()
        }
        codes::CLIENT_ERROR => "Please save your work, sign out, and sign in again.".to_string(),
        codes::OPERATION_IN_PROGRESS => {
            "Please try that operation again after the current operation has finished."
                .to_string()
        }
        codes::ZONE_CONFIGURATION => {
            "Follow the instructions to change your browser's zone configuration.".to_string()
        }
        code => format!("Authentication failed ({code}): {}", error.message),
    }
}

/// Message for an error reported by the identity service.
pub fn aad_error_message(error: &AadError) -> String {
    if error.has_code(AADSTS_EXPIRED_ASSERTION) {
        return "Your sign-in has expired. Please try again.".to_string();
    }
    if error.has_code(AADSTS_CONSENT_REQUIRED) {
        return "Consent is required for the requested permissions. Ask an administrator to grant consent, then try again.".to_string();
    }
    let serialized = serde_json::to_string(error).unwrap_or_else(|_| error.error.clone());
    format!("AAD ERROR: {serialized}")
}

/// Shows client errors to the user.
pub struct NotifyingClientErrorHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyingClientErrorHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl ClientErrorHandler for NotifyingClientErrorHandler {
    fn handle(&self, error: &ClientError) {
        warn!(code = %error.code, message = %error.message, "client-side authentication error");
        self.notifier.show(&client_error_message(error));
    }
}

/// Shows identity-service errors to the user.
pub struct NotifyingAadErrorHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyingAadErrorHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl AadErrorHandler for NotifyingAadErrorHandler {
    fn handle(&self, error: &AadError) {
        warn!(
            error = %error.error,
            codes = ?error.error_codes,
            correlation_id = error.correlation_id.as_deref().unwrap_or(""),
            "identity service rejected the exchange"
        );
        self.notifier.show(&aad_error_message(error));
    }
}
