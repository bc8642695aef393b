//! Wire types for the `generateContent` request/response.

use serde::{Deserialize, Serialize};

use prdocs_shared::{PrDocsError, Result};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestContent<'a> {
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestPart<'a> {
    pub text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    /// A single-turn request carrying one text part.
    pub fn single(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`.
    pub fn into_text(self) -> Result<String> {
        self.candidates
            .into_iter()
            .next()
            .ok_or_else(|| PrDocsError::MalformedAiResponse("response has no candidates".into()))?
            .content
            .ok_or_else(|| PrDocsError::MalformedAiResponse("first candidate has no content".into()))?
            .parts
            .into_iter()
            .next()
            .and_then(|part| part.text)
            .ok_or_else(|| {
                PrDocsError::MalformedAiResponse("first candidate has no text part".into())
            })
    }
}
