//! Microsoft identity platform and Graph constants
//!
//! Endpoints are built from an authority and tenant so tests and sovereign
//! clouds can point elsewhere. Defaults target the public cloud.

/// Public cloud authority host
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Microsoft Graph v1.0 root
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// First ten item names in the user's OneDrive root
pub const DEFAULT_GRAPH_QUERY: &str = "/me/drive/root/children?$select=name&$top=10";

/// Downstream scope requested by the on-behalf-of exchange
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/Files.Read.All";

/// Grant type for the on-behalf-of flow
pub const OBO_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Grant type for polling the device authorization grant
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// `{authority}/{tenant}/oauth2/v2.0/token`
pub fn token_endpoint(authority: &str, tenant: &str) -> String {
    format!("{}/{tenant}/oauth2/v2.0/token", authority.trim_end_matches('/'))
}

/// `{authority}/{tenant}/oauth2/v2.0/devicecode`
pub fn device_code_endpoint(authority: &str, tenant: &str) -> String {
    format!(
        "{}/{tenant}/oauth2/v2.0/devicecode",
        authority.trim_end_matches('/')
    )
}

/// Scope a public client requests to obtain a bootstrap token for its own API.
pub fn access_as_user_scope(client_id: &str) -> String {
    format!("api://{client_id}/access_as_user")
}
