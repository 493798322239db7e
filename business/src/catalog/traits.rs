//! Catalog trait.

use super::types::{CatalogError, FileRecord};
use std::future::Future;

/// Operations the client needs from the remote catalog.
///
/// File contents cross this boundary as base64 text, exactly as the wire
/// carries them; decoding happens where the bytes are consumed.
///
/// Every call reports failures as [`CatalogError`] so the batch layers can
/// tag and aggregate outcomes without knowing the transport.
///
/// See [module documentation](super) for the provided implementations.
pub trait FileCatalog: Clone + Send + Sync + 'static {
    /// Full listing, no pagination.
    fn list_files(&self) -> impl Future<Output = Result<Vec<FileRecord>, CatalogError>> + Send;

    /// Base64 content of one file.
    fn get_content(&self, id: &str) -> impl Future<Output = Result<String, CatalogError>> + Send;

    /// Stores a new file and returns its server-assigned id. Names need not
    /// be unique.
    fn create_file(
        &self,
        name: &str,
        base64_content: &str,
    ) -> impl Future<Output = Result<String, CatalogError>> + Send;

    /// Returns whether the server acknowledged the removal.
    fn remove_file(&self, id: &str) -> impl Future<Output = Result<bool, CatalogError>> + Send;
}
