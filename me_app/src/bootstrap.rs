use me_http::BootstrapOutcome;
use me_http::HttpClientConfig;
use me_http::IndexClient;
use me_http::IndexTarget;
use tracing::error;
use tracing::info;

use crate::errors::Result;

/// Whether records go to the indexing backend or are printed locally.
///
/// Decided once at startup and handed to each component; it never changes for
/// the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexingMode {
    Enabled(IndexTarget),
    Disabled,
}

impl IndexingMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, IndexingMode::Enabled(_))
    }
}

/// Runs the one-time index check.
///
/// Any failure talking to the backend disables indexing instead of aborting
/// startup; no bootstrap request is ever retried.
pub async fn resolve(target: Option<IndexTarget>) -> IndexingMode {
    let Some(target) = target else {
        info!("No indexing backend configured, records will be printed locally");
        return IndexingMode::Disabled;
    };

    let client = match IndexClient::with_config(target.clone(), HttpClientConfig::bootstrap()) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to create bootstrap client for {}: {err}", target.base_url());
            return IndexingMode::Disabled;
        }
    };

    match client.ensure_index().await {
        Ok(BootstrapOutcome::Existing) => IndexingMode::Enabled(target),
        Ok(BootstrapOutcome::Created { probe, created }) => {
            info!("Index {} bootstrapped (probe {probe}, create {created})", target.index());
            IndexingMode::Enabled(target)
        }
        Err(err) => {
            error!("Index bootstrap against {} failed: {err}. Indexing disabled, records will be printed locally", target.base_url());
            IndexingMode::Disabled
        }
    }
}

/// [`resolve`] on a throwaway single-threaded runtime
pub fn resolve_blocking(target: Option<IndexTarget>) -> Result<IndexingMode> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(resolve(target)))
}
