//! Destinations for finished downloads.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::AsyncWriteExt as _;
use tracing::debug;

use crate::codec::Blob;

/// Receives each finished download, standing in for a browser's save-as.
pub trait DownloadSink: Send + Sync {
    /// Stores `blob` under `name` and returns where it ended up.
    fn save(&self, name: &str, blob: Blob) -> impl Future<Output = io::Result<PathBuf>> + Send;
}

/// Writes downloads into a directory, creating it on first use.
///
/// An existing file is never overwritten: a second `report.txt` is saved as
/// `report (1).txt`, then `report (2).txt`, and so on.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

const MAX_RENAME_ATTEMPTS: usize = 1000;

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Keeps only the final path component so server-supplied names cannot
/// escape the download directory.
fn file_name_of(name: &str) -> io::Result<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name:?} is not a usable file name"),
            )
        })
}

fn numbered(file_name: &str, n: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{file_name} ({n})"),
    }
}

impl DownloadSink for DirectorySink {
    async fn save(&self, name: &str, blob: Blob) -> io::Result<PathBuf> {
        let file_name = file_name_of(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        for attempt in 0..MAX_RENAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                file_name.clone()
            } else {
                numbered(&file_name, attempt)
            };
            let path = self.dir.join(candidate);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            file.write_all(&blob.bytes).await?;
            file.flush().await?;
            debug!(path = %path.display(), bytes = blob.len(), "wrote_download");
            return Ok(path);
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("No free file name for {file_name} in {}", self.dir.display()),
        ))
    }
}

/// One save recorded by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBlob {
    pub name: String,
    pub blob: Blob,
}

/// Keeps downloads in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    saved: Arc<Mutex<Vec<SavedBlob>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, oldest first.
    pub fn saved(&self) -> Vec<SavedBlob> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DownloadSink for MemorySink {
    async fn save(&self, name: &str, blob: Blob) -> io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SavedBlob {
                name: name.to_owned(),
                blob,
            });
        Ok(PathBuf::from(name))
    }
}
