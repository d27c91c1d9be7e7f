//! TokenExchangeService over the on-behalf-of flow and Microsoft Graph

use host::{AccessToken, BootstrapToken, BoxFuture, ExchangeResponse, TokenExchangeService};

use crate::graph::{self, GraphEndpoint};
use crate::obo::{self, ConfidentialClient};

/// Exchanges bootstrap tokens as a confidential client and calls Graph with the result.
pub struct GraphTokenService {
    client: reqwest::Client,
    app: ConfidentialClient,
    endpoint: GraphEndpoint,
}

impl GraphTokenService {
    pub fn new(client: reqwest::Client, app: ConfidentialClient, endpoint: GraphEndpoint) -> Self {
        Self {
            client,
            app,
            endpoint,
        }
    }
}

impl TokenExchangeService for GraphTokenService {
    fn exchange<'a>(
        &'a self,
        bootstrap: &'a BootstrapToken,
    ) -> BoxFuture<'a, host::Result<ExchangeResponse>> {
        Box::pin(async move {
            Ok(obo::exchange_on_behalf_of(&self.client, &self.app, bootstrap).await?)
        })
    }

    fn call_api<'a>(
        &'a self,
        access_token: &'a AccessToken,
    ) -> BoxFuture<'a, host::Result<serde_json::Value>> {
        Box::pin(async move { Ok(graph::fetch(&self.client, &self.endpoint, access_token).await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Secret;
    use host::HostError;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn service(server: &MockServer) -> GraphTokenService {
        GraphTokenService::new(
            reqwest::Client::new(),
            ConfidentialClient {
                authority: server.uri(),
                tenant: "common".into(),
                client_id: "middle-tier".into(),
                client_secret: Secret::from("s3cret"),
                scopes: vec!["https://graph.microsoft.com/Files.Read.All".into()],
            },
            GraphEndpoint {
                base_url: format!("{}/v1.0", server.uri()),
                query: "/me/drive/root/children?$select=name&$top=10".into(),
            },
        )
    }

    #[tokio::test]
    async fn exchange_then_call_api() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A1"
            })))
            .mount(&server)
            .await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/v1.0/me/drive/root/children"))
            .and(matchers::header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rows": [1, 2, 3]
            })))
            .mount(&server)
            .await;

        let service = service(&server);
        let access_token = match service.exchange(&BootstrapToken::new("T1")).await.unwrap() {
            ExchangeResponse::Success { access_token } => access_token,
            other => panic!("expected success, got {other:?}"),
        };
        let data = service.call_api(&access_token).await.unwrap();
        assert_eq!(data, serde_json::json!({"rows": [1, 2, 3]}));
    }

    #[tokio::test]
    async fn api_failure_is_unclassified() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let err = service(&server)
            .call_api(&AccessToken::new("A1"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HostError::Unclassified("downstream API returned 503: busy".into())
        );
    }
}
