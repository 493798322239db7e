//! Catalog client for the file storage GraphQL endpoint.
//!
//! Every operation is a single POST of `{ query, variables }` to the
//! endpoint root. Errors reported in the GraphQL `errors` array are mapped
//! to [`CatalogError`]; the server reports a missing file with a message of
//! the form `No file found for id = …`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use super::traits::FileCatalog;
use super::types::{CatalogError, FileRecord};
use crate::config::ClientConfig;
use crate::http::{HttpClient, HttpError};

const LIST_FILES: &str = "query ListFiles { listFiles { id name fileSize createDate } }";
const GET_FILE: &str = "query GetFile($id: String) { getFile(id: $id) }";
const PUT_FILE: &str =
    "mutation PutFile($name: String!, $contents: String!) { putFile(name: $name, contents: $contents) }";
const REMOVE_FILE: &str = "mutation RemoveFile($id: String!) { removeFile(id: $id) }";

const NOT_FOUND_PREFIX: &str = "No file found";

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

// `data` stays untyped until `errors` has been checked: a failed field can
// leave a null where the typed shape expects a value.
#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
    #[serde(default)]
    extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Deserialize)]
struct GraphqlErrorExtensions {
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesData {
    list_files: Vec<FileRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetFileData {
    get_file: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutFileData {
    put_file: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveFileData {
    remove_file: bool,
}

/// [`FileCatalog`] backed by the GraphQL file storage API.
#[derive(Debug, Clone)]
pub struct GraphqlCatalog {
    http: HttpClient,
    endpoint: String,
}

impl GraphqlCatalog {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Builds the HTTP client from `config` and points at its endpoint.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpError> {
        let http = HttpClient::new(config.timeout())?;
        Ok(Self::new(http, config.endpoint()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, CatalogError> {
        let request = self
            .http
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables })
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to encode request: {e}")))?;

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.message))?;

        if !response.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_owned());
            warn!(status = response.status, "graphql_http_error");
            return Err(CatalogError::Network(format!(
                "HTTP {} from {}: {}",
                response.status, self.endpoint, body
            )));
        }

        let envelope: GraphqlResponse = response
            .json()
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        if !envelope.errors.is_empty() {
            return Err(map_errors(envelope.errors));
        }

        let data = envelope
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| CatalogError::InvalidResponse("Response carried no data".to_owned()))?;
        serde_json::from_value(data)
            .map_err(|e| CatalogError::InvalidResponse(format!("Unexpected data shape: {e}")))
    }
}

fn map_errors(errors: Vec<GraphqlErrorEntry>) -> CatalogError {
    let not_found = errors.iter().find(|e| {
        e.message.starts_with(NOT_FOUND_PREFIX)
            || e.extensions
                .as_ref()
                .and_then(|ext| ext.code.as_deref())
                .is_some_and(|code| code == "NOT_FOUND")
    });
    if let Some(entry) = not_found {
        return CatalogError::NotFound(entry.message.clone());
    }

    let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
    CatalogError::Graphql(messages.join("; "))
}

impl FileCatalog for GraphqlCatalog {
    #[instrument(skip_all, name = "graphql_list_files")]
    async fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let data: ListFilesData = self.execute(LIST_FILES, json!({})).await?;
        debug!(count = data.list_files.len(), "listed_files");
        Ok(data.list_files)
    }

    #[instrument(skip_all, name = "graphql_get_file", fields(id = %id))]
    async fn get_content(&self, id: &str) -> Result<String, CatalogError> {
        let data: GetFileData = self.execute(GET_FILE, json!({ "id": id })).await?;
        Ok(data.get_file)
    }

    #[instrument(skip_all, name = "graphql_put_file", fields(name = %name, bytes = base64_content.len()))]
    async fn create_file(&self, name: &str, base64_content: &str) -> Result<String, CatalogError> {
        let data: PutFileData = self
            .execute(PUT_FILE, json!({ "name": name, "contents": base64_content }))
            .await?;
        Ok(data.put_file)
    }

    #[instrument(skip_all, name = "graphql_remove_file", fields(id = %id))]
    async fn remove_file(&self, id: &str) -> Result<bool, CatalogError> {
        let data: RemoveFileData = self.execute(REMOVE_FILE, json!({ "id": id })).await?;
        Ok(data.remove_file)
    }
}
