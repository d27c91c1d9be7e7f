//! Device authorization grant standing in for the host's sign-in
//!
//! A terminal has no host runtime to issue bootstrap tokens, so the public
//! client signs the user in with the device code flow and uses the resulting
//! `access_as_user` token as the bootstrap token. A step-up request forwards
//! the claims from the challenge so the identity service prompts for the
//! missing factors.
//!
//! Failures are reported with the same codes an Office host would use, so
//! the client error handler treats both hosts alike.

use std::sync::Arc;
use std::time::Duration;

use host::{
    BootstrapToken, BoxFuture, ClientError, HostAuthProvider, HostError, Notifier, TokenOptions,
    codes,
};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::constants::{DEVICE_CODE_GRANT_TYPE, device_code_endpoint, token_endpoint};

/// Extra delay the identity service asks for with `slow_down`
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Upper bound on a single sign-in, independent of the code's own expiry
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(900);

/// Hard ceiling for `with_max_wait`
pub const MAX_SIGN_IN_WAIT: Duration = Duration::from_secs(3600);

/// Response from the device code endpoint.
#[derive(Debug, Deserialize)]
struct DeviceAuthorization {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
    #[serde(default)]
    message: Option<String>,
}

fn default_interval() -> u64 {
    5
}

/// One poll of the token endpoint.
#[derive(Debug, Deserialize)]
struct PollBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: String,
}

/// HostAuthProvider backed by the device authorization grant.
///
/// The sign-in instruction (URL and user code) goes to `prompt`.
pub struct DeviceCodeHostAuth {
    client: reqwest::Client,
    prompt: Arc<dyn Notifier>,
    authority: String,
    tenant: String,
    client_id: String,
    scope: String,
    max_wait: Duration,
}

impl DeviceCodeHostAuth {
    pub fn new(
        client: reqwest::Client,
        prompt: Arc<dyn Notifier>,
        authority: impl Into<String>,
        tenant: impl Into<String>,
        client_id: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompt,
            authority: authority.into(),
            tenant: tenant.into(),
            client_id: client_id.into(),
            scope: scope.into(),
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Bound a single sign-in. Values above `MAX_SIGN_IN_WAIT` are clamped.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait.min(MAX_SIGN_IN_WAIT);
        self
    }

    async fn sign_in(&self, options: &TokenOptions) -> host::Result<BootstrapToken> {
        if !options.is_interactive() {
            return Err(ClientError::new(
                codes::NOT_SIGNED_IN,
                "no signed-in user and the request does not allow a sign-in prompt",
            )
            .into());
        }

        let authorization = self
            .request_device_code(options.auth_challenge.as_deref())
            .await?;

        let prompt = authorization.message.clone().unwrap_or_else(|| {
            format!(
                "To sign in, open {} and enter the code {}",
                authorization.verification_uri, authorization.user_code
            )
        });
        self.prompt.show(&prompt);
        info!(
            verification_uri = %authorization.verification_uri,
            step_up = options.auth_challenge.is_some(),
            "waiting for device sign-in"
        );

        self.poll_for_token(&authorization).await
    }

    async fn request_device_code(&self, claims: Option<&str>) -> host::Result<DeviceAuthorization> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("scope", self.scope.as_str()),
        ];
        if let Some(claims) = claims {
            form.push(("claims", claims));
        }

        let response = self
            .client
            .post(device_code_endpoint(&self.authority, &self.tenant))
            .form(&form)
            .send()
            .await
            .map_err(|e| unavailable(format!("device code request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(unavailable(format!(
                "device code endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<DeviceAuthorization>()
            .await
            .map_err(|e| unavailable(format!("invalid device code response: {e}")))
    }

    async fn poll_for_token(
        &self,
        authorization: &DeviceAuthorization,
    ) -> host::Result<BootstrapToken> {
        let deadline =
            Instant::now() + Duration::from_secs(authorization.expires_in).min(self.max_wait);
        let mut interval = Duration::from_secs(authorization.interval);
        let endpoint = token_endpoint(&self.authority, &self.tenant);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(unavailable("device sign-in timed out"));
            }

            let response = self
                .client
                .post(&endpoint)
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT_TYPE),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", authorization.device_code.as_str()),
                ])
                .send()
                .await
                .map_err(|e| unavailable(format!("device token poll failed: {e}")))?;

            // Pending and terminal states both arrive as 400 with a JSON body
            let body: PollBody = response
                .json()
                .await
                .map_err(|e| unavailable(format!("invalid device token response: {e}")))?;

            if let Some(token) = body.access_token {
                info!("device sign-in completed");
                return Ok(BootstrapToken::new(token));
            }

            match body.error.as_deref() {
                Some("authorization_pending") => {
                    debug!("device sign-in pending");
                }
                Some("slow_down") => {
                    interval += SLOW_DOWN_STEP;
                    debug!(interval_secs = interval.as_secs(), "identity service asked to slow down");
                }
                Some("authorization_declined") => {
                    return Err(ClientError::new(
                        codes::USER_ABORTED,
                        "the user declined the sign-in request",
                    )
                    .into());
                }
                Some("expired_token") => {
                    return Err(unavailable("the sign-in code expired before it was used"));
                }
                Some("invalid_grant") => {
                    return Err(ClientError::new(codes::INVALID_GRANT, body.error_description).into());
                }
                Some(other) => {
                    warn!(error = other, "device sign-in failed");
                    return Err(unavailable(format!("{other}: {}", body.error_description)));
                }
                None => {
                    return Err(unavailable(
                        "device token response has neither access_token nor error",
                    ));
                }
            }

            // Never sleep past the deadline
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(interval.min(remaining)).await;
        }
    }
}

fn unavailable(message: impl Into<String>) -> HostError {
    ClientError::new(codes::TOKEN_UNAVAILABLE, message).into()
}

impl HostAuthProvider for DeviceCodeHostAuth {
    fn get_access_token<'a>(
        &'a self,
        options: &'a TokenOptions,
    ) -> BoxFuture<'a, host::Result<BootstrapToken>> {
        Box::pin(self.sign_in(options))
    }
}
