//! Readiness probe for the Ollama backend.
//!
//! The service does not spawn or preload Ollama; it only reports whether the
//! configured endpoint answers `GET /api/version`.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::time::{Instant, sleep};
use url::Url;

use crate::memory::core::errors::{MemoryError, MemoryResult};

/// Connect timeout for probe requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Overall timeout for a single probe request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Delay between attempts in [`OllamaProbe::wait_until_ready`].
const RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

/// HTTP probe against an Ollama server.
pub struct OllamaProbe {
    client: Client,
    version_url: Url,
}

impl OllamaProbe {
    /// Create a probe for the given base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> MemoryResult<Self> {
        let version_url = Url::parse(base_url)?.join("/api/version")?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(probe_error)?;
        Ok(Self {
            client,
            version_url,
        })
    }

    /// Fetch the server version.
    ///
    /// # Errors
    /// Returns an error if the server is unreachable or answers with a failure.
    pub async fn version(&self) -> MemoryResult<String> {
        let response = self
            .client
            .get(self.version_url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(probe_error)?;
        let body: VersionResponse = response.json().await.map_err(probe_error)?;
        Ok(body.version)
    }

    /// Poll until the server answers or `timeout` elapses.
    ///
    /// # Errors
    /// Returns the last probe error if the deadline passes.
    pub async fn wait_until_ready(&self, timeout: Duration) -> MemoryResult<String> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.version().await {
                Ok(version) => return Ok(version),
                Err(err) if Instant::now() + RETRY_DELAY >= deadline => return Err(err),
                Err(_) => sleep(RETRY_DELAY).await,
            }
        }
    }
}

fn probe_error(err: reqwest::Error) -> MemoryError {
    MemoryError::Probe(err.to_string())
}

impl std::fmt::Debug for OllamaProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProbe")
            .field("version_url", &self.version_url.as_str())
            .finish_non_exhaustive()
    }
}
