//! Prometheus metrics recorder and textfile export.
//!
//! A runner process lives for a single invocation, so there is no scrape
//! endpoint. The recorder is installed without an HTTP listener and the
//! rendered exposition is written to a file at the end of the run, in the
//! format expected by the node-exporter textfile collector.
//!
//! # Usage
//!
//! ```ignore
//! let handle = install_metrics_recorder()?;
//! // ... run ...
//! write_textfile(&handle, Path::new("/var/lib/node_exporter/sift.prom")).await?;
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use sift_core::metrics as m;

/// Install the global metrics recorder.
///
/// This function should be called once per process.
/// After calling this, all `metrics::counter!()` and `metrics::histogram!()`
/// macros will record to the Prometheus format.
///
/// # Errors
///
/// - Global recorder is already installed
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(m::INGEST_RUN_DURATION_SECONDS.to_owned()),
            &m::RUN_DURATION_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("invalid histogram buckets: {}", e))?
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    // Register metric descriptions
    m::describe_all();

    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Render the current metrics and write them to `path`.
///
/// The file is written to a temporary sibling first and renamed into place,
/// so a collector never reads a partially written file.
pub async fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    let rendered = handle.render();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, rendered)
        .await
        .with_context(|| format!("failed to write {}", Path::new(&tmp).display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to rename into {}", path.display()))?;

    tracing::debug!(path = %path.display(), "metrics textfile written");
    Ok(())
}
