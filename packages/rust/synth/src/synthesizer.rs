//! The generation call and its failure translation.

use prdocs_shared::{
    DocumentArtifact, PrDocsError, Result, Settings, build_client, header_name, header_value,
};
use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::prompt::{build_prompt, placeholder};
use crate::protocol::{GenerateRequest, GenerateResponse};

/// Outcome of synthesizing one document.
///
/// Both variants carry an artifact that is safe to persist; callers decide
/// whether a placeholder should be surfaced as a failure.
#[derive(Debug)]
pub enum Synthesis {
    Generated(DocumentArtifact),
    Placeholder {
        artifact: DocumentArtifact,
        error: PrDocsError,
    },
}

impl Synthesis {
    pub fn artifact(&self) -> &DocumentArtifact {
        match self {
            Self::Generated(artifact) | Self::Placeholder { artifact, .. } => artifact,
        }
    }

    pub fn into_artifact(self) -> DocumentArtifact {
        match self {
            Self::Generated(artifact) | Self::Placeholder { artifact, .. } => artifact,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }

    pub fn error(&self) -> Option<&PrDocsError> {
        match self {
            Self::Generated(_) => None,
            Self::Placeholder { error, .. } => Some(error),
        }
    }
}

/// Sends one generation request per file to the configured endpoint.
#[derive(Debug, Clone)]
pub struct DocSynthesizer {
    client: Client,
    endpoint: Url,
    api_key: HeaderValue,
    api_key_header: HeaderName,
    max_content_chars: usize,
}

impl DocSynthesizer {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings)?,
            endpoint: settings.ai_endpoint.clone(),
            api_key: header_value(&settings.ai_api_key, "AI service API key")?,
            api_key_header: header_name(&settings.ai_api_key_header, "ai.api_key_header")?,
            max_content_chars: settings.max_content_chars,
        })
    }

    /// Produce a document for `filename`. Never fails: errors become a placeholder.
    #[instrument(skip_all, fields(filename = %filename))]
    pub async fn synthesize(&self, code: &str, filename: &str) -> Synthesis {
        match self.generate(code, filename).await {
            Ok(text) => Synthesis::Generated(DocumentArtifact::new(text)),
            Err(error) => {
                warn!(error = %error, "generation failed, substituting placeholder");
                Synthesis::Placeholder {
                    artifact: placeholder(filename, &error),
                    error,
                }
            }
        }
    }

    /// Make the raw generation call, surfacing errors.
    pub async fn generate(&self, code: &str, filename: &str) -> Result<String> {
        let prompt = build_prompt(code, filename, self.max_content_chars);

        let response = self
            .client
            .post(self.endpoint.as_str())
            .header(self.api_key_header.clone(), self.api_key.clone())
            .json(&GenerateRequest::single(&prompt))
            .send()
            .await
            .map_err(|e| PrDocsError::ServiceError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrDocsError::ServiceError(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PrDocsError::ServiceError(format!("body read failed: {e}")))?;

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| PrDocsError::MalformedAiResponse(format!("invalid JSON: {e}")))?;

        let text = parsed.into_text()?;
        debug!(chars = text.len(), "generation complete");
        Ok(text)
    }
}
