use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, bail};
use serde::Deserialize;
use tracing::info;

const DEFAULT_ENDPOINT: &str = "http://localhost:5000/";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    endpoint: String,
    download_dir: PathBuf,
    timeout: Duration,
}

// Raw shape of the `FILEBOX_*` environment variables.
#[derive(Deserialize)]
struct RawConfig {
    filebox_endpoint: Option<String>,
    filebox_download_dir: Option<PathBuf>,
    filebox_timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            download_dir: download_dir.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `FILEBOX_ENDPOINT`, `FILEBOX_DOWNLOAD_DIR` and
    /// `FILEBOX_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let raw: RawConfig = serde_env::from_iter(std::env::vars())
            .context("Failed to read FILEBOX_* environment variables")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            filebox_endpoint,
            filebox_download_dir,
            filebox_timeout_secs,
        } = raw;

        let endpoint = filebox_endpoint.unwrap_or_else(|| {
            info!("FILEBOX_ENDPOINT not set, defaulting to {DEFAULT_ENDPOINT}");
            DEFAULT_ENDPOINT.to_owned()
        });
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            bail!("FILEBOX_ENDPOINT must be an http(s) URL, got {endpoint:?}");
        }

        let download_dir =
            filebox_download_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

        let timeout_secs = filebox_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("FILEBOX_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            endpoint,
            download_dir,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_DOWNLOAD_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn defaults_apply_when_unset() {
        let raw: RawConfig =
            from_iter(Vec::<(&str, &str)>::new()).expect("RawConfig should deserialize");

        let config = ClientConfig::from_raw(raw).expect("empty env should build");
        assert_eq!(config.endpoint(), "http://localhost:5000/");
        assert_eq!(config.download_dir(), Path::new("downloads"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn explicit_values_are_used() {
        let raw: RawConfig = from_iter(vec![
            ("FILEBOX_ENDPOINT", "https://files.example.com/graphql"),
            ("FILEBOX_DOWNLOAD_DIR", "/tmp/filebox"),
            ("FILEBOX_TIMEOUT_SECS", "5"),
        ])
        .expect("RawConfig should deserialize");

        let config = ClientConfig::from_raw(raw).expect("config should build");
        assert_eq!(config.endpoint(), "https://files.example.com/graphql");
        assert_eq!(config.download_dir(), Path::new("/tmp/filebox"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let raw: RawConfig = from_iter(vec![("FILEBOX_ENDPOINT", "ftp://files.example.com")])
            .expect("RawConfig should deserialize");

        let err = ClientConfig::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("FILEBOX_ENDPOINT"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let raw: RawConfig = from_iter(vec![("FILEBOX_TIMEOUT_SECS", "0")])
            .expect("RawConfig should deserialize");

        let err = ClientConfig::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("FILEBOX_TIMEOUT_SECS"));
    }
}
