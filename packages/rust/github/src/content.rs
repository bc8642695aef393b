//! Raw file content retrieval.

use prdocs_shared::{PrDocsError, Result, Settings, build_client};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// Maximum raw content size we accept (10 MB).
const MAX_CONTENT_SIZE: u64 = 10 * 1024 * 1024;

/// Downloads the current text of a changed file from its raw URL.
#[derive(Debug, Clone)]
pub struct ContentRetriever {
    client: Client,
    token: String,
    api_host: Option<String>,
    max_bytes: u64,
}

impl ContentRetriever {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings)?,
            token: settings.github_token.clone(),
            api_host: settings.github_api_base.host_str().map(str::to_owned),
            max_bytes: MAX_CONTENT_SIZE,
        })
    }

    /// Override the size cap.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Fetch the text at `raw_url`. Failures are scoped to this one file.
    #[instrument(skip_all, fields(url = %raw_url))]
    pub async fn fetch(&self, raw_url: &Url) -> Result<String> {
        let mut request = self.client.get(raw_url.as_str());
        if self.is_github_host(raw_url) {
            request = request.bearer_auth(&self.token);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| PrDocsError::content(raw_url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrDocsError::content(raw_url.as_str(), format!("HTTP {status}")));
        }

        // Counted per chunk: chunked responses carry no Content-Length.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PrDocsError::content(raw_url.as_str(), format!("body read failed: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(PrDocsError::content(
                    raw_url.as_str(),
                    format!("content too large (max {} bytes)", self.max_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(bytes = body.len(), "fetched raw content");
        Ok(body)
    }

    /// Private repositories need the token on raw URLs; other hosts never see it.
    fn is_github_host(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                host == "github.com"
                    || host.ends_with(".githubusercontent.com")
                    || self.api_host.as_deref() == Some(host)
            }
            None => false,
        }
    }
}
