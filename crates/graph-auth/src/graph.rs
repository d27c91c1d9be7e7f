//! Microsoft Graph call with an exchanged access token

use host::AccessToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Where the downstream call goes.
#[derive(Debug, Clone)]
pub struct GraphEndpoint {
    pub base_url: String,
    /// Path and query appended to `base_url`
    pub query: String,
}

impl GraphEndpoint {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.query)
    }
}

/// GET the configured Graph resource. The JSON body is returned unmodified.
pub async fn fetch(
    client: &reqwest::Client,
    endpoint: &GraphEndpoint,
    token: &AccessToken,
) -> Result<serde_json::Value> {
    let url = endpoint.url();
    let response = client
        .get(&url)
        .bearer_auth(token.expose())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::Http(format!("graph request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    debug!(%status, url, "graph call succeeded");
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("graph body is not JSON: {e}")))
}
