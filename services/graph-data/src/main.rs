//! graph-data
//!
//! Single-shot terminal client that:
//! 1. Signs the user in (device code) to obtain a bootstrap token
//! 2. Exchanges it on-behalf-of the user for a Microsoft Graph token,
//!    following one claims challenge with a step-up sign-in
//! 3. Calls Graph and appends the result to the configured document
//! 4. Reports the outcome on stderr and through the exit code

mod config;
mod document;
mod metrics;
mod notify;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use graph_auth::{ConfidentialClient, DeviceCodeHostAuth, GraphEndpoint, GraphTokenService};
use host::Notifier;
use token_flow::{
    Collaborators, NotifyingAadErrorHandler, NotifyingClientErrorHandler, Outcome,
    TokenExchangeFlow,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::document::FileDocumentWriter;
use crate::notify::ConsoleNotifier;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // JSON logs on stderr, LOG_LEVEL / RUST_LOG filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    info!("starting graph-data");

    let prometheus_handle = metrics::install_recorder()?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        tenant = %config.aad.tenant,
        authority = %config.aad.authority,
        graph_url = %config.graph.base_url,
        document = %config.document.path.display(),
        "configuration loaded"
    );

    let flow = build_flow(&config)?;
    let outcome = flow.execute().await;

    if let Some(ref textfile) = config.metrics.textfile {
        if let Err(e) = metrics::write_textfile(&prometheus_handle, textfile) {
            warn!(error = %e, "failed to write metrics textfile");
        }
    }

    Ok(match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Wire the Microsoft identity collaborators, the document file and the
/// console into one flow.
fn build_flow(config: &Config) -> Result<TokenExchangeFlow> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.graph.timeout_secs))
        .build()
        .context("building HTTP client")?;

    let client_secret = config
        .aad
        .client_secret
        .clone()
        .context("client secret was not resolved")?;

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

    let auth = DeviceCodeHostAuth::new(
        client.clone(),
        notifier.clone(),
        config.aad.authority.clone(),
        config.aad.tenant.clone(),
        config.addin_client_id(),
        config.addin_scope(),
    )
    .with_max_wait(Duration::from_secs(config.addin.sign_in_timeout_secs));

    let exchange = GraphTokenService::new(
        client,
        ConfidentialClient {
            authority: config.aad.authority.clone(),
            tenant: config.aad.tenant.clone(),
            client_id: config.aad.client_id.clone(),
            client_secret,
            scopes: config.aad.scopes.clone(),
        },
        GraphEndpoint {
            base_url: config.graph.base_url.clone(),
            query: config.graph.query.clone(),
        },
    );

    Ok(TokenExchangeFlow::new(Collaborators {
        auth: Arc::new(auth),
        exchange: Arc::new(exchange),
        document: Arc::new(FileDocumentWriter::new(config.document.path.clone())),
        notifier: notifier.clone(),
        aad_errors: Arc::new(NotifyingAadErrorHandler::new(notifier.clone())),
        client_errors: Arc::new(NotifyingClientErrorHandler::new(notifier)),
    }))
}
