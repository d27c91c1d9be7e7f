//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The confidential client secret is loaded from the AAD_CLIENT_SECRET env
//! var or `client_secret_file`, never from the TOML itself.

use common::Secret;
use graph_auth::{
    DEFAULT_AUTHORITY, DEFAULT_GRAPH_QUERY, DEFAULT_GRAPH_SCOPE, GRAPH_BASE_URL, MAX_SIGN_IN_WAIT,
    access_as_user_scope,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var carrying the confidential client secret
pub const CLIENT_SECRET_ENV: &str = "AAD_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub aad: AadConfig,
    #[serde(default)]
    pub addin: AddinConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    pub document: DocumentConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Confidential client used for the on-behalf-of exchange
#[derive(Debug, Deserialize)]
pub struct AadConfig {
    pub tenant: String,
    pub client_id: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to AAD_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
}

/// Public client that signs the user in and receives the bootstrap token
#[derive(Debug, Deserialize)]
pub struct AddinConfig {
    /// Defaults to the AAD client id
    #[serde(default)]
    pub client_id: Option<String>,
    /// Defaults to `api://<client_id>/access_as_user`
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_sign_in_timeout")]
    pub sign_in_timeout_secs: u64,
}

/// Downstream API call
#[derive(Debug, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_graph_query")]
    pub query: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where the payload is written
#[derive(Debug, Deserialize)]
pub struct DocumentConfig {
    pub path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus textfile written after each run
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_GRAPH_SCOPE.to_string()]
}

fn default_graph_base_url() -> String {
    GRAPH_BASE_URL.to_string()
}

fn default_graph_query() -> String {
    DEFAULT_GRAPH_QUERY.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_sign_in_timeout() -> u64 {
    900
}

impl Default for AddinConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            scope: None,
            sign_in_timeout_secs: default_sign_in_timeout(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            query: default_graph_query(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then resolve the client secret.
    ///
    /// Client secret resolution order:
    /// 1. AAD_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| common::Error::io(path, e))?;
        let mut config: Config = toml::from_str(&contents)?;

        config.validate()?;

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            config.aad.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.aad.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.aad.client_secret = Some(Secret::new(secret));
            }
        }

        if config.aad.client_secret.is_none() {
            return Err(common::Error::Config(format!(
                "no client secret: set {CLIENT_SECRET_ENV} or aad.client_secret_file"
            )));
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.aad.tenant.trim().is_empty() {
            return Err(common::Error::Config("aad.tenant must not be empty".into()));
        }
        if self.aad.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "aad.client_id must not be empty".into(),
            ));
        }
        if self.aad.scopes.is_empty() {
            return Err(common::Error::Config(
                "aad.scopes must list at least one scope".into(),
            ));
        }
        for (field, url) in [
            ("aad.authority", &self.aad.authority),
            ("graph.base_url", &self.graph.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{field} must start with http:// or https://, got: {url}"
                )));
            }
        }
        if self.graph.timeout_secs == 0 {
            return Err(common::Error::Config(
                "graph.timeout_secs must be greater than 0".into(),
            ));
        }
        let max_sign_in = MAX_SIGN_IN_WAIT.as_secs();
        if !(1..=max_sign_in).contains(&self.addin.sign_in_timeout_secs) {
            return Err(common::Error::Config(format!(
                "addin.sign_in_timeout_secs must be between 1 and {max_sign_in}, got: {}",
                self.addin.sign_in_timeout_secs
            )));
        }
        Ok(())
    }

    /// Public client id used for sign-in.
    pub fn addin_client_id(&self) -> &str {
        self.addin.client_id.as_deref().unwrap_or(&self.aad.client_id)
    }

    /// Scope of the bootstrap token.
    pub fn addin_scope(&self) -> String {
        self.addin
            .scope
            .clone()
            .unwrap_or_else(|| access_as_user_scope(self.addin_client_id()))
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("graph-data.toml")
    }
}
