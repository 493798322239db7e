//! Drop-to-upload intake.
//!
//! Dropped files are processed one at a time: read to bytes, encoded, and
//! created against the catalog before the next file is touched. A failure
//! is recorded against its file and the rest of the drop carries on.

use std::path::PathBuf;

use tracing::{debug, instrument, warn};

use crate::catalog::{CatalogError, FileCatalog};
use crate::codec;

/// Where a dropped file's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropSource {
    /// A file on the local filesystem (desktop drop).
    Path(PathBuf),
    /// Bytes already in memory (web drop).
    Bytes(Vec<u8>),
}

/// A file dropped onto the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub source: DropSource,
}

impl DroppedFile {
    /// Names the file after the last component of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: DropSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: DropSource::Bytes(bytes),
        }
    }

    async fn read(self) -> std::io::Result<Vec<u8>> {
        match self.source {
            DropSource::Path(path) => tokio::fs::read(path).await,
            DropSource::Bytes(bytes) => Ok(bytes),
        }
    }
}

/// A dropped file, encoded and ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub name: String,
    pub base64_content: String,
}

impl UploadItem {
    pub fn new(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            base64_content: codec::encode(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadErrorKind {
    #[error("Failed to read file: {0}")]
    LocalRead(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub name: String,
    pub kind: UploadErrorKind,
}

/// A file the catalog accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFile {
    pub name: String,
    pub id: String,
}

/// Settled result for one dropped file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created(CreatedFile),
    Failed(UploadFailure),
}

/// Per-file results of one drop, in drop order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub created: Vec<CreatedFile>,
    pub failed: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_processed(&self) -> usize {
        self.created.len() + self.failed.len()
    }

    fn record(&mut self, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Created(created) => self.created.push(created),
            UploadOutcome::Failed(failure) => self.failed.push(failure),
        }
    }
}

/// Uploads `files` sequentially and reports each one's outcome.
#[instrument(skip_all, name = "ingest", fields(count = files.len()))]
pub async fn ingest<C: FileCatalog>(files: Vec<DroppedFile>, catalog: &C) -> UploadReport {
    let mut report = UploadReport::new();
    for file in files {
        let outcome = upload_one(file, catalog).await;
        report.record(outcome);
    }

    if report.all_succeeded() {
        debug!(created = report.created.len(), "upload_finished");
    } else {
        warn!(
            created = report.created.len(),
            failed = report.failed.len(),
            "upload_finished_with_failures"
        );
    }
    report
}

async fn upload_one<C: FileCatalog>(file: DroppedFile, catalog: &C) -> UploadOutcome {
    let name = file.name.clone();
    let bytes = match file.read().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(%name, error = %e, "upload_read_failed");
            return UploadOutcome::Failed(UploadFailure {
                name,
                kind: UploadErrorKind::LocalRead(e.to_string()),
            });
        }
    };

    let item = UploadItem::new(name, &bytes);
    match catalog.create_file(&item.name, &item.base64_content).await {
        Ok(id) => {
            debug!(name = %item.name, %id, "file_created");
            UploadOutcome::Created(CreatedFile {
                name: item.name,
                id,
            })
        }
        Err(error) => {
            warn!(name = %item.name, %error, "upload_create_failed");
            UploadOutcome::Failed(UploadFailure {
                name: item.name,
                kind: error.into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalog;

    #[tokio::test]
    async fn test_uploads_in_drop_order() {
        let catalog = MockCatalog::new();
        let files = vec![
            DroppedFile::from_bytes("b.txt", b"second".to_vec()),
            DroppedFile::from_bytes("a.txt", b"first".to_vec()),
        ];

        let report = ingest(files, &catalog).await;

        assert!(report.all_succeeded());
        assert_eq!(catalog.calls().create, vec!["b.txt", "a.txt"]);
        let stored = catalog.get_content(&report.created[0].id).await.unwrap();
        assert_eq!(codec::decode_bytes(&stored).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_reads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.md");
        std::fs::write(&path, "# notes").unwrap();

        let catalog = MockCatalog::new();
        let report = ingest(vec![DroppedFile::from_path(&path)], &catalog).await;

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].name, "notes.md");
        assert_eq!(catalog.records()[0].file_size, 7);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = MockCatalog::new();
        catalog.fail_create("rejected.txt", CatalogError::Graphql("quota".to_owned()));
        let files = vec![
            DroppedFile::from_path(tmp.path().join("missing.txt")),
            DroppedFile::from_bytes("rejected.txt", b"x".to_vec()),
            DroppedFile::from_bytes("kept.txt", b"y".to_vec()),
        ];

        let report = ingest(files, &catalog).await;

        assert_eq!(report.total_processed(), 3);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].name, "kept.txt");
        assert_eq!(report.failed[0].name, "missing.txt");
        assert!(matches!(report.failed[0].kind, UploadErrorKind::LocalRead(_)));
        assert_eq!(
            report.failed[1].kind,
            UploadErrorKind::Catalog(CatalogError::Graphql("quota".to_owned()))
        );
        // the unreadable file never reached the catalog
        assert_eq!(catalog.calls().create, vec!["rejected.txt", "kept.txt"]);
    }

    #[tokio::test]
    async fn test_empty_drop() {
        let catalog = MockCatalog::new();
        let report = ingest(Vec::new(), &catalog).await;

        assert_eq!(report, UploadReport::new());
        assert_eq!(catalog.calls().total(), 0);
    }

    #[test]
    fn test_upload_item_encodes() {
        let item = UploadItem::new("hello.txt", b"Hello");
        assert_eq!(item.base64_content, "SGVsbG8=");
    }
}
