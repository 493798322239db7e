//! Turns fetched contents into one saved download.
//!
//! A single item is saved as-is under its own name. Two or more items are
//! bundled into a zip archive saved as [`ARCHIVE_NAME`]. The base64 text of
//! each entry is decoded chunk by chunk straight into the archive writer.
//!
//! File names are not unique. When several items share a name the archive
//! holds one entry for it, at the position of the first such item and with
//! the content of the last.

mod sink;

use std::collections::HashMap;
use std::io::{Cursor, Write as _};

use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub use sink::{DirectorySink, DownloadSink, MemorySink, SavedBlob};

use crate::codec::{self, Blob, CodecError, DEFAULT_CONTENT_TYPE};
use crate::fetch::FetchedContent;

/// File name used for multi-file downloads.
pub const ARCHIVE_NAME: &str = "download.zip";

pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// What [`build_and_save`] handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Empty batch; the sink was not called.
    Nothing,
    Single { name: String, bytes: usize },
    Archive {
        name: String,
        entries: usize,
        bytes: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Failed to decode {name}: {source}")]
    Decode { name: String, source: CodecError },

    #[error("Failed to write archive: {0}")]
    Zip(String),

    #[error("Failed to save {name}: {source}")]
    Save {
        name: String,
        source: std::io::Error,
    },
}

/// Saves `items` through `sink` as one file or one archive.
#[instrument(skip_all, name = "build_and_save", fields(count = items.len()))]
pub async fn build_and_save<S: DownloadSink>(
    items: Vec<FetchedContent>,
    sink: &S,
) -> Result<SaveOutcome, ArchiveError> {
    let (name, blob, outcome) = match items.as_slice() {
        [] => {
            debug!("nothing_to_save");
            return Ok(SaveOutcome::Nothing);
        }
        [item] => {
            let blob = codec::decode(&item.base64_content, DEFAULT_CONTENT_TYPE).map_err(
                |source| ArchiveError::Decode {
                    name: item.name.clone(),
                    source,
                },
            )?;
            let outcome = SaveOutcome::Single {
                name: item.name.clone(),
                bytes: blob.len(),
            };
            (item.name.clone(), blob, outcome)
        }
        many => {
            let entries = merge_by_name(many);
            let bytes = write_archive(&entries)?;
            let outcome = SaveOutcome::Archive {
                name: ARCHIVE_NAME.to_owned(),
                entries: entries.len(),
                bytes: bytes.len(),
            };
            (
                ARCHIVE_NAME.to_owned(),
                Blob::new(ARCHIVE_CONTENT_TYPE, bytes),
                outcome,
            )
        }
    };

    match sink.save(&name, blob).await {
        Ok(location) => {
            info!(%name, location = %location.display(), "download_saved");
            Ok(outcome)
        }
        Err(source) => {
            warn!(%name, %source, "download_save_failed");
            Err(ArchiveError::Save { name, source })
        }
    }
}

/// Serializes `items` into an in-memory zip, one entry per distinct name.
pub fn build_archive(items: &[FetchedContent]) -> Result<Vec<u8>, ArchiveError> {
    write_archive(&merge_by_name(items))
}

/// Collapses items sharing a name: the first one fixes the position, the
/// last one supplies the content.
fn merge_by_name(items: &[FetchedContent]) -> Vec<&FetchedContent> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    let mut entries: Vec<&FetchedContent> = Vec::with_capacity(items.len());
    for item in items {
        match position.get(item.name.as_str()) {
            Some(&index) => {
                warn!(name = %item.name, id = %item.id, "archive_entry_replaced");
                entries[index] = item;
            }
            None => {
                position.insert(item.name.as_str(), entries.len());
                entries.push(item);
            }
        }
    }
    entries
}

fn write_archive(entries: &[&FetchedContent]) -> Result<Vec<u8>, ArchiveError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for item in entries {
        writer
            .start_file(item.name.as_str(), options)
            .map_err(|e| ArchiveError::Zip(e.to_string()))?;

        for chunk in codec::decode_stream(&item.base64_content) {
            let chunk = chunk.map_err(|source| ArchiveError::Decode {
                name: item.name.clone(),
                source,
            })?;
            writer
                .write_all(&chunk)
                .map_err(|e| ArchiveError::Zip(e.to_string()))?;
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| ArchiveError::Zip(e.to_string()))?;
    Ok(cursor.into_inner())
}
