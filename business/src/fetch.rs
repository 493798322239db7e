//! Batch content retrieval for a snapshot of selected ids.
//!
//! Names are resolved for the whole batch before the first request goes
//! out. Every `get_content` call then runs concurrently and is awaited to
//! settlement; the batch succeeds only if every call did.

use std::future::Future;

use futures::future::join_all;
use tracing::{Instrument as _, debug, info_span, warn};

use crate::archive::ArchiveError;
use crate::catalog::{CatalogError, FileCatalog};

/// Base64 content of one selected file, paired with its download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub id: String,
    pub name: String,
    pub base64_content: String,
}

/// A failed content fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub id: String,
    pub name: String,
    pub error: CatalogError,
}

/// Settled result of one `get_content` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(FetchedContent),
    Failed(FetchFailure),
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Selected file {0} is not in the current listing")]
    UnknownFile(String),

    #[error("{} of {} downloads failed: {}", .failures.len(), .total, summarize(.failures))]
    Fetch {
        total: usize,
        failures: Vec<FetchFailure>,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

fn summarize(failures: &[FetchFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.name, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fetches the content of every id in `ids`.
///
/// `resolve` maps an id to its download name and is consulted immediately,
/// before this function returns, so the batch is fixed at call time. The
/// returned items are in the order of `ids`.
pub fn fetch_all<'a, C: FileCatalog>(
    ids: &[String],
    catalog: &'a C,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> impl Future<Output = Result<Vec<FetchedContent>, BatchError>> + Send + use<'a, C> {
    let plan: Result<Vec<(String, String)>, BatchError> = ids
        .iter()
        .map(|id| {
            resolve(id)
                .map(|name| (id.clone(), name))
                .ok_or_else(|| BatchError::UnknownFile(id.clone()))
        })
        .collect();
    let span = info_span!("fetch_all", count = ids.len());

    async move {
        let plan = plan?;
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let total = plan.len();
        let outcomes = join_all(
            plan.into_iter()
                .map(|(id, name)| fetch_one(catalog, id, name)),
        )
        .await;

        let mut fetched = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Fetched(content) => fetched.push(content),
                FetchOutcome::Failed(failure) => failures.push(failure),
            }
        }

        if failures.is_empty() {
            debug!(total, "batch_fetched");
            Ok(fetched)
        } else {
            warn!(total, failed = failures.len(), "batch_fetch_failed");
            Err(BatchError::Fetch { total, failures })
        }
    }
    .instrument(span)
}

async fn fetch_one<C: FileCatalog>(catalog: &C, id: String, name: String) -> FetchOutcome {
    match catalog.get_content(&id).await {
        Ok(base64_content) => FetchOutcome::Fetched(FetchedContent {
            id,
            name,
            base64_content,
        }),
        Err(error) => {
            warn!(%id, %error, "fetch_failed");
            FetchOutcome::Failed(FetchFailure { id, name, error })
        }
    }
}
