//! On-behalf-of token exchange
//!
//! The bootstrap token names the add-in's own API as its audience. The
//! confidential client trades it at the tenant's token endpoint for a token
//! scoped to Microsoft Graph.
//!
//! The identity service reports rejections in the JSON body, sometimes with
//! a success status, so the body decides the outcome and the status is only
//! used for diagnostics. A body carrying non-empty `claims` is a step-up
//! challenge whatever else it holds: the user has to satisfy additional
//! factors and the caller should fetch a new bootstrap token with those
//! claims.

use common::Secret;
use host::{AadError, AccessToken, BootstrapToken, ExchangeResponse};
use serde::Deserialize;
use tracing::debug;

use crate::constants::{OBO_GRANT_TYPE, token_endpoint};
use crate::error::{Error, Result};

/// Confidential client registration used for the exchange.
#[derive(Debug, Clone)]
pub struct ConfidentialClient {
    pub authority: String,
    pub tenant: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Downstream scopes, space-joined on the wire
    pub scopes: Vec<String>,
}

impl ConfidentialClient {
    pub fn token_endpoint(&self) -> String {
        token_endpoint(&self.authority, &self.tenant)
    }
}

/// Raw token endpoint body. Success and error fields share one shape.
#[derive(Debug, Deserialize)]
struct TokenEndpointBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    claims: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: String,
    #[serde(default)]
    error_codes: Vec<u64>,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    trace_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Exchange a bootstrap token for a Graph-scoped access token.
pub async fn exchange_on_behalf_of(
    client: &reqwest::Client,
    app: &ConfidentialClient,
    bootstrap: &BootstrapToken,
) -> Result<ExchangeResponse> {
    let scope = app.scopes.join(" ");
    let response = client
        .post(app.token_endpoint())
        .form(&[
            ("grant_type", OBO_GRANT_TYPE),
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.expose().as_str()),
            ("assertion", bootstrap.expose()),
            ("requested_token_use", "on_behalf_of"),
            ("scope", scope.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading token exchange response: {e}")))?;

    let parsed = parse_exchange_body(&body).map_err(|e| {
        Error::TokenExchange(format!("token endpoint returned {status}: {e}"))
    })?;
    debug!(%status, outcome = parsed.kind(), "on-behalf-of exchange completed");
    Ok(parsed)
}

/// Classify a token endpoint body.
pub fn parse_exchange_body(body: &str) -> Result<ExchangeResponse> {
    let body: TokenEndpointBody = serde_json::from_str(body)
        .map_err(|e| Error::InvalidResponse(format!("token endpoint body is not JSON: {e}")))?;

    // Claims outrank both error and access_token
    if let Some(claims) = body.claims.filter(|c| !c.is_empty()) {
        return Ok(ExchangeResponse::ChallengeRequired { claims });
    }

    if let Some(error) = body.error {
        return Ok(ExchangeResponse::Failed(AadError {
            error,
            error_description: body.error_description,
            error_codes: body.error_codes,
            correlation_id: body.correlation_id,
            trace_id: body.trace_id,
            timestamp: body.timestamp,
        }));
    }

    match body.access_token {
        Some(token) => Ok(ExchangeResponse::Success {
            access_token: AccessToken::new(token),
        }),
        None => Err(Error::InvalidResponse(
            "token endpoint body has neither access_token nor error".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn app(authority: &str) -> ConfidentialClient {
        ConfidentialClient {
            authority: authority.to_string(),
            tenant: "contoso".into(),
            client_id: "middle-tier".into(),
            client_secret: Secret::from("s3cret"),
            scopes: vec!["https://graph.microsoft.com/Files.Read.All".into()],
        }
    }

    #[test]
    fn parses_access_token() {
        let parsed = parse_exchange_body(
            r#"{"token_type":"Bearer","expires_in":3599,"access_token":"A1"}"#,
        )
        .unwrap();
        match parsed {
            ExchangeResponse::Success { access_token } => assert_eq!(access_token.expose(), "A1"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn error_with_claims_is_challenge() {
        let parsed = parse_exchange_body(
            r#"{"error":"interaction_required","error_description":"AADSTS50076: MFA required","claims":"{\"access_token\":{\"polids\":{\"essential\":true}}}"}"#,
        )
        .unwrap();
        match parsed {
            ExchangeResponse::ChallengeRequired { claims } => {
                assert!(claims.contains("polids"), "claims passed through: {claims}")
            }
            other => panic!("expected challenge, got {other:?}"),
        }
    }

    #[test]
    fn claims_without_error_is_challenge() {
        let parsed = parse_exchange_body(r#"{"claims":"C1"}"#).unwrap();
        match parsed {
            ExchangeResponse::ChallengeRequired { claims } => assert_eq!(claims, "C1"),
            other => panic!("expected challenge, got {other:?}"),
        }
    }

    #[test]
    fn claims_take_precedence_over_access_token() {
        let parsed = parse_exchange_body(r#"{"access_token":"A1","claims":"C1"}"#).unwrap();
        assert_eq!(parsed.kind(), "challenge_required");
    }

    #[test]
    fn error_with_empty_claims_is_failure() {
        let parsed =
            parse_exchange_body(r#"{"error":"invalid_grant","claims":""}"#).unwrap();
        assert!(matches!(parsed, ExchangeResponse::Failed(ref e) if e.error == "invalid_grant"));
    }

    #[test]
    fn error_without_claims_is_failure_with_details() {
        let parsed = parse_exchange_body(
            r#"{"error":"invalid_grant","error_description":"AADSTS500133: expired","error_codes":[500133],"correlation_id":"c-1"}"#,
        )
        .unwrap();
        match parsed {
            ExchangeResponse::Failed(err) => {
                assert_eq!(err.error_codes, vec![500133]);
                assert_eq!(err.correlation_id.as_deref(), Some("c-1"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_json_and_empty_bodies() {
        assert!(matches!(
            parse_exchange_body("<html>bad gateway</html>"),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_exchange_body("{}"),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn posts_on_behalf_of_form() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/contoso/oauth2/v2.0/token"))
            .and(matchers::body_string_contains("requested_token_use=on_behalf_of"))
            .and(matchers::body_string_contains("assertion=T1"))
            .and(matchers::body_string_contains("client_id=middle-tier"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "token_type": "Bearer",
                    "access_token": "A1"
                })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let parsed = exchange_on_behalf_of(&client, &app(&server.uri()), &BootstrapToken::new("T1"))
            .await
            .unwrap();
        assert_eq!(parsed.kind(), "success");
    }

    #[tokio::test]
    async fn error_status_with_aad_body_is_data_not_err() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "AADSTS65001: consent required",
                "error_codes": [65001]
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let parsed = exchange_on_behalf_of(&client, &app(&server.uri()), &BootstrapToken::new("T1"))
            .await
            .unwrap();
        assert!(matches!(parsed, ExchangeResponse::Failed(ref e) if e.has_code(65001)));
    }

    #[tokio::test]
    async fn garbage_body_is_token_exchange_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let result =
            exchange_on_behalf_of(&client, &app(&server.uri()), &BootstrapToken::new("T1")).await;
        match result {
            Err(Error::TokenExchange(msg)) => assert!(msg.contains("502"), "got: {msg}"),
            other => panic!("expected TokenExchange error, got {other:?}"),
        }
    }
}
