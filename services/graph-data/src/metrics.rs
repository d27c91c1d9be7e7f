//! Prometheus metrics export
//!
//! The binary runs once per invocation, so there is no scrape endpoint.
//! When `[metrics].textfile` is configured the rendered exposition is
//! written there for a node_exporter textfile collector.

use std::path::Path;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use token_flow::metrics::DURATION_SECONDS;
use tracing::debug;

/// Flow duration buckets, 50ms to 15 minutes (device sign-in included)
const DURATION_BUCKETS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0,
];

fn builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DURATION_SECONDS.to_string()), DURATION_BUCKETS)
        .context("setting histogram buckets")
}

/// Install the global recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let recorder = builder()?.build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|_| anyhow::anyhow!("a metrics recorder is already installed"))?;
    Ok(handle)
}

/// Write the current exposition to `path` atomically (temp file + rename).
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp_path = dir.join(format!(".graph-data.prom.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, handle.render())
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming metrics textfile to {}", path.display()))?;

    debug!(path = %path.display(), "wrote metrics textfile");
    Ok(())
}
