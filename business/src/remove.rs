//! Batch removal.

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::catalog::{CatalogError, FileCatalog};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveFailureReason {
    /// The server answered but did not confirm the removal.
    NotAcknowledged,
    Catalog(CatalogError),
}

impl std::fmt::Display for RemoveFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAcknowledged => f.write_str("not acknowledged"),
            Self::Catalog(error) => write!(f, "{error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveFailure {
    pub id: String,
    pub reason: RemoveFailureReason,
}

/// Settled result of one `remove_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(String),
    Failed(RemoveFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} of {} removals failed: {}", .failures.len(), .total, summarize(.failures))]
pub struct RemoveError {
    pub total: usize,
    pub failures: Vec<RemoveFailure>,
}

fn summarize(failures: &[RemoveFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.id, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Removes every id concurrently.
///
/// Every call is awaited. The batch fails if any call errored or came back
/// unacknowledged; calls that did succeed are not rolled back.
#[instrument(skip_all, name = "remove_all", fields(count = ids.len()))]
pub async fn remove_all<C: FileCatalog>(ids: Vec<String>, catalog: &C) -> Result<(), RemoveError> {
    if ids.is_empty() {
        return Ok(());
    }

    let total = ids.len();
    let outcomes = join_all(ids.into_iter().map(|id| remove_one(catalog, id))).await;

    let failures: Vec<RemoveFailure> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            RemoveOutcome::Removed(_) => None,
            RemoveOutcome::Failed(failure) => Some(failure),
        })
        .collect();

    if failures.is_empty() {
        debug!(total, "batch_removed");
        Ok(())
    } else {
        warn!(total, failed = failures.len(), "batch_remove_failed");
        Err(RemoveError { total, failures })
    }
}

async fn remove_one<C: FileCatalog>(catalog: &C, id: String) -> RemoveOutcome {
    let reason = match catalog.remove_file(&id).await {
        Ok(true) => return RemoveOutcome::Removed(id),
        Ok(false) => RemoveFailureReason::NotAcknowledged,
        Err(error) => RemoveFailureReason::Catalog(error),
    };
    warn!(%id, %reason, "remove_failed");
    RemoveOutcome::Failed(RemoveFailure { id, reason })
}
