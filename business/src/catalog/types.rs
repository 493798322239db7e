//! Catalog types.

use serde::{Deserialize, Serialize};

/// One entry of the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub file_size: u64,
    pub create_date: String,
}

impl FileRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        file_size: u64,
        create_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            file_size,
            create_date: create_date.into(),
        }
    }
}

/// Error type for catalog calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
