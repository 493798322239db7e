//! JSON-over-POST client with Send-safe, fully buffered responses.
//!
//! The client is built once and handed to the catalog; nothing here reaches
//! for a process-wide client. The whole body is read before `send` returns.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Result<String, std::str::Utf8Error> {
        std::str::from_utf8(&self.body).map(str::to_owned)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP error: {message}")]
pub struct HttpError {
    pub message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> HttpResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { inner })
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            client: self.inner.clone(),
            url: url.into(),
            body: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    url: String,
    body: Vec<u8>,
}

impl RequestBuilder {
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = serde_json::to_vec(value)?;
        Ok(self)
    }

    /// POST the JSON body and buffer the whole response.
    pub async fn send(self) -> HttpResult<Response> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(self.body)
            .send()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}
