//! The file manager session: listing, selection and the user-facing
//! operations that act on them.
//!
//! Batch operations read the selection synchronously when they are called
//! and carry that snapshot into the returned future. Toggles issued while a
//! batch is in flight change what the *next* batch sees, never the current
//! one.
//!
//! Any error from the listing query or from a download or remove batch puts
//! the view into [`LoadState::Failed`]; [`FileManager::refresh`] is the retry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use filebox_states::{LoadState, SelectionSet};
use tracing::{debug, error, info, instrument};

use crate::archive::{self, DirectorySink, DownloadSink, SaveOutcome};
use crate::catalog::{CatalogError, FileCatalog, FileRecord, GraphqlCatalog};
use crate::config::ClientConfig;
use crate::fetch::{self, BatchError};
use crate::http::HttpError;
use crate::remove::{self, RemoveError};
use crate::upload::{self, DroppedFile, UploadReport};

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Failed to load files: {0}")]
    Listing(CatalogError),

    #[error("File {0} is not in the current listing")]
    UnknownFile(String),

    #[error("Download failed: {0}")]
    Download(#[from] BatchError),

    #[error("Remove failed: {0}")]
    Remove(#[from] RemoveError),
}

#[derive(Default)]
struct Session {
    /// Last listing fetched successfully. `None` until the first refresh.
    listing: Option<Vec<FileRecord>>,
    failure: Option<String>,
    selection: SelectionSet,
}

/// A file manager bound to one catalog and one download sink.
pub struct FileManager<C, S> {
    catalog: C,
    sink: S,
    session: RwLock<Session>,
}

impl FileManager<GraphqlCatalog, DirectorySink> {
    /// Manager talking to the configured endpoint and saving into the
    /// configured download directory.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpError> {
        let catalog = GraphqlCatalog::from_config(config)?;
        Ok(Self::new(catalog, DirectorySink::new(config.download_dir())))
    }
}

impl<C: FileCatalog, S: DownloadSink> FileManager<C, S> {
    pub fn new(catalog: C, sink: S) -> Self {
        Self {
            catalog,
            sink,
            session: RwLock::new(Session::default()),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, message: String) {
        error!(%message, "file_manager_failed");
        self.write().failure = Some(message);
    }

    /// What the file view should show.
    pub fn view(&self) -> LoadState<Vec<FileRecord>> {
        let session = self.read();
        match (&session.failure, &session.listing) {
            (Some(message), _) => LoadState::Failed(message.clone()),
            (None, Some(listing)) => LoadState::Ready(listing.clone()),
            (None, None) => LoadState::Loading,
        }
    }

    pub fn selection(&self) -> SelectionSet {
        self.read().selection.clone()
    }

    /// Reloads the listing and drops selected ids that are no longer listed.
    ///
    /// Returns the number of listed files.
    #[instrument(skip_all, name = "refresh")]
    pub async fn refresh(&self) -> Result<usize, ManagerError> {
        match self.catalog.list_files().await {
            Ok(listing) => {
                let count = listing.len();
                let mut session = self.write();
                session.selection = session
                    .selection
                    .retain_listed(listing.iter().map(|r| r.id.as_str()));
                session.listing = Some(listing);
                session.failure = None;
                debug!(count, "listing_loaded");
                Ok(count)
            }
            Err(e) => {
                self.fail(format!("Failed to load files: {e}"));
                Err(ManagerError::Listing(e))
            }
        }
    }

    /// Checks or unchecks `id` and returns the new selection.
    pub fn toggle(&self, id: &str) -> Result<SelectionSet, ManagerError> {
        let mut session = self.write();
        let listed = session
            .listing
            .as_ref()
            .is_some_and(|listing| listing.iter().any(|r| r.id == id));
        if !listed && !session.selection.contains(id) {
            return Err(ManagerError::UnknownFile(id.to_owned()));
        }
        session.selection = session.selection.toggle(id);
        Ok(session.selection.clone())
    }

    /// Downloads the currently selected files.
    ///
    /// The selection and file names are captured before this returns. One
    /// selected file is saved under its own name; several are saved as a
    /// single archive.
    pub fn download_selected(
        &self,
    ) -> impl Future<Output = Result<SaveOutcome, ManagerError>> + Send + '_ {
        let (ids, names) = {
            let session = self.read();
            let names: HashMap<String, String> = session
                .listing
                .iter()
                .flatten()
                .map(|r| (r.id.clone(), r.name.clone()))
                .collect();
            (session.selection.ids(), names)
        };
        info!(count = ids.len(), "download_started");
        let fetch = fetch::fetch_all(&ids, &self.catalog, &|id| names.get(id).cloned());

        async move {
            let result = match fetch.await {
                Ok(items) => archive::build_and_save(items, &self.sink)
                    .await
                    .map_err(BatchError::from),
                Err(e) => Err(e),
            };
            result.map_err(|e| {
                self.fail(format!("Download failed: {e}"));
                ManagerError::Download(e)
            })
        }
    }

    /// Removes the currently selected files.
    ///
    /// On success the selection is cleared and the listing reloaded. On
    /// failure the selection is kept and no reload happens. An empty
    /// selection is a no-op. Returns the number of files removed.
    pub fn remove_selected(&self) -> impl Future<Output = Result<usize, ManagerError>> + Send + '_ {
        let ids = self.read().selection.ids();

        async move {
            if ids.is_empty() {
                debug!("nothing_selected");
                return Ok(0);
            }
            let count = ids.len();
            info!(count, "remove_started");

            if let Err(e) = remove::remove_all(ids, &self.catalog).await {
                self.fail(format!("Remove failed: {e}"));
                return Err(ManagerError::Remove(e));
            }

            let cleared = self.read().selection.clear();
            self.write().selection = cleared;
            self.refresh().await?;
            Ok(count)
        }
    }

    /// Uploads dropped files one by one, then reloads the listing.
    ///
    /// Per-file failures are reported, not raised. Only a failed reload
    /// fails the call.
    #[instrument(skip_all, name = "drop_upload", fields(count = files.len()))]
    pub async fn drop_upload(&self, files: Vec<DroppedFile>) -> Result<UploadReport, ManagerError> {
        let report = upload::ingest(files, &self.catalog).await;
        self.refresh().await?;
        Ok(report)
    }
}
