//! Client-side business logic for filebox.
//!
//! The heart of the crate is the download pipeline: a snapshot of selected
//! file ids is fetched concurrently from a [`FileCatalog`], then saved as a
//! single file or bundled into one zip archive. Around it sit drop-to-upload
//! intake, batch removal and the [`FileManager`] session that ties them to
//! the listing and the selection.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use filebox_business::{ClientConfig, FileManager};
//!
//! let config = ClientConfig::from_env()?;
//! let manager = FileManager::from_config(&config)?;
//! manager.refresh().await?;
//! manager.toggle("some-id")?;
//! manager.download_selected().await?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod fetch;
pub mod http;
pub mod manager;
pub mod remove;
pub mod upload;

mod test_utils;

pub use archive::{DirectorySink, DownloadSink, MemorySink, SaveOutcome};
pub use catalog::{CatalogError, FileCatalog, FileRecord, GraphqlCatalog, MockCatalog};
pub use codec::{Blob, CodecError};
pub use config::ClientConfig;
pub use filebox_states::{LoadState, SelectionSet};
pub use manager::{FileManager, ManagerError};
pub use upload::{DroppedFile, UploadReport};
