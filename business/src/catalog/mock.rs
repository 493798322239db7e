//! Mock catalog for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use super::traits::FileCatalog;
use super::types::{CatalogError, FileRecord};
use crate::codec;

const MOCK_CREATE_DATE: &str = "Thu, 15 Oct 2026 09:30:00 +0000";

/// In-memory implementation of [`FileCatalog`] for testing.
///
/// Besides storing files it can inject failures per id, delay individual
/// calls to force a completion order, and records every call it receives.
#[derive(Clone, Default)]
pub struct MockCatalog {
    inner: Arc<RwLock<MockState>>,
    next_id: Arc<AtomicU64>,
}

#[derive(Default)]
struct MockState {
    files: Vec<MockStoredFile>,
    content_failures: HashMap<String, CatalogError>,
    remove_failures: HashMap<String, CatalogError>,
    remove_rejections: Vec<String>,
    create_failures: HashMap<String, CatalogError>,
    listing_failure: Option<CatalogError>,
    latency: HashMap<String, Duration>,
    calls: MockCalls,
}

#[derive(Clone)]
struct MockStoredFile {
    record: FileRecord,
    content: String,
}

/// Calls received by a [`MockCatalog`], in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub list: usize,
    pub get_content: Vec<String>,
    pub create: Vec<String>,
    pub remove: Vec<String>,
}

impl MockCalls {
    pub fn total(&self) -> usize {
        self.list + self.get_content.len() + self.create.len() + self.remove.len()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MockState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MockState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_id(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("file-{id}")
    }

    /// Seeds a file under a caller-chosen id.
    pub fn with_file(self, id: &str, name: &str, base64_content: &str) -> Self {
        self.insert(id.to_owned(), name, base64_content);
        self
    }

    fn insert(&self, id: String, name: &str, base64_content: &str) {
        let file_size = codec::decode_bytes(base64_content)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or_default();
        let stored = MockStoredFile {
            record: FileRecord::new(id, name, file_size, MOCK_CREATE_DATE),
            content: base64_content.to_owned(),
        };
        self.write().files.push(stored);
    }

    pub fn fail_content(&self, id: &str, error: CatalogError) {
        self.write().content_failures.insert(id.to_owned(), error);
    }

    pub fn fail_remove(&self, id: &str, error: CatalogError) {
        self.write().remove_failures.insert(id.to_owned(), error);
    }

    /// Makes `remove_file(id)` answer `Ok(false)`.
    pub fn reject_remove(&self, id: &str) {
        self.write().remove_rejections.push(id.to_owned());
    }

    /// Fails every create call for files named `name`.
    pub fn fail_create(&self, name: &str, error: CatalogError) {
        self.write().create_failures.insert(name.to_owned(), error);
    }

    pub fn fail_listing(&self, error: CatalogError) {
        self.write().listing_failure = Some(error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.write();
        state.content_failures.clear();
        state.remove_failures.clear();
        state.remove_rejections.clear();
        state.create_failures.clear();
        state.listing_failure = None;
    }

    /// Delays `get_content` and `remove_file` for `id`.
    pub fn set_latency(&self, id: &str, delay: Duration) {
        self.write().latency.insert(id.to_owned(), delay);
    }

    pub fn calls(&self) -> MockCalls {
        self.read().calls.clone()
    }

    pub fn len(&self) -> usize {
        self.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<FileRecord> {
        self.read().files.iter().map(|f| f.record.clone()).collect()
    }

    async fn delay_for(&self, id: &str) {
        let delay = self.read().latency.get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl FileCatalog for MockCatalog {
    async fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let mut state = self.write();
        state.calls.list += 1;
        if let Some(error) = &state.listing_failure {
            return Err(error.clone());
        }
        Ok(state.files.iter().map(|f| f.record.clone()).collect())
    }

    async fn get_content(&self, id: &str) -> Result<String, CatalogError> {
        self.write().calls.get_content.push(id.to_owned());
        self.delay_for(id).await;

        let state = self.read();
        if let Some(error) = state.content_failures.get(id) {
            return Err(error.clone());
        }
        state
            .files
            .iter()
            .find(|f| f.record.id == id)
            .map(|f| f.content.clone())
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))
    }

    async fn create_file(&self, name: &str, base64_content: &str) -> Result<String, CatalogError> {
        {
            let mut state = self.write();
            state.calls.create.push(name.to_owned());
            if let Some(error) = state.create_failures.get(name) {
                return Err(error.clone());
            }
        }
        codec::decode_bytes(base64_content)
            .map_err(|e| CatalogError::Graphql(format!("Invalid contents: {e}")))?;

        let id = self.generate_id();
        self.insert(id.clone(), name, base64_content);
        Ok(id)
    }

    async fn remove_file(&self, id: &str) -> Result<bool, CatalogError> {
        self.write().calls.remove.push(id.to_owned());
        self.delay_for(id).await;

        let mut state = self.write();
        if let Some(error) = state.remove_failures.get(id) {
            return Err(error.clone());
        }
        if state.remove_rejections.iter().any(|r| r == id) {
            return Ok(false);
        }
        let before = state.files.len();
        state.files.retain(|f| f.record.id != id);
        Ok(state.files.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_list() {
        let catalog = MockCatalog::new();

        let first = catalog.create_file("a.txt", "YQ==").await.unwrap();
        let second = catalog.create_file("a.txt", "Yg==").await.unwrap();

        assert_ne!(first, second, "duplicate names get fresh ids");
        let listing = catalog.list_files().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "a.txt");
        assert_eq!(listing[0].file_size, 1);
    }

    #[tokio::test]
    async fn test_get_content_missing_is_not_found() {
        let catalog = MockCatalog::new();
        let err = catalog.get_content("nope").await.unwrap_err();
        assert_eq!(err, CatalogError::NotFound("nope".to_owned()));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let catalog = MockCatalog::new().with_file("a", "a.txt", "YQ==");

        assert!(catalog.remove_file("a").await.unwrap());
        assert!(!catalog.remove_file("a").await.unwrap());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let catalog = MockCatalog::new().with_file("a", "a.txt", "YQ==");
        catalog.fail_content("a", CatalogError::Network("timeout".to_owned()));
        catalog.reject_remove("a");

        assert!(catalog.get_content("a").await.is_err());
        assert!(!catalog.remove_file("a").await.unwrap());
        assert_eq!(catalog.len(), 1);

        catalog.clear_failures();
        assert_eq!(catalog.get_content("a").await.unwrap(), "YQ==");
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let catalog = MockCatalog::new().with_file("a", "a.txt", "YQ==");

        catalog.list_files().await.unwrap();
        catalog.get_content("a").await.unwrap();
        catalog.remove_file("a").await.unwrap();

        let calls = catalog.calls();
        assert_eq!(calls.list, 1);
        assert_eq!(calls.get_content, vec!["a"]);
        assert_eq!(calls.remove, vec!["a"]);
        assert_eq!(calls.total(), 3);
    }
}
