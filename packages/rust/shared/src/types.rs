//! Core domain types for the pull-request documentation pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{PrDocsError, Result};

// ---------------------------------------------------------------------------
// PullRequestRef
// ---------------------------------------------------------------------------

/// Identifies one pull request: `owner/name` plus its number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Full repository name, e.g. `octocat/hello-world`.
    pub repository: String,
    /// Pull-request number within the repository.
    pub number: u64,
}

impl PullRequestRef {
    /// Build a validated reference. Both parts are required and non-empty.
    pub fn new(repository: impl Into<String>, number: u64) -> Result<Self> {
        let repository = repository.into();
        if !is_owner_and_name(&repository) {
            return Err(PrDocsError::validation(format!(
                "repository must look like owner/name, got {repository:?}"
            )));
        }
        if number == 0 {
            return Err(PrDocsError::validation("pull request number must be > 0"));
        }
        Ok(Self { repository, number })
    }
}

/// Exactly one `/`, with two non-empty segments that are not `.` or `..`.
///
/// Character rules are left to GitHub; enterprise accounts allow `_` in owners.
fn is_owner_and_name(repository: &str) -> bool {
    let mut parts = repository.split('/');
    let (Some(owner), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    [owner, name]
        .iter()
        .all(|s| !s.trim().is_empty() && *s != "." && *s != "..")
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

// ---------------------------------------------------------------------------
// ChangedFile
// ---------------------------------------------------------------------------

/// Change status reported by the provider for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    #[serde(other)]
    Other,
}

/// A file touched by a pull request, as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root; doubles as the document key.
    pub filename: String,
    /// Where the file's current raw content can be fetched.
    pub raw_url: Url,
    pub status: FileStatus,
    /// Unified diff hunk, when the provider includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

// ---------------------------------------------------------------------------
// DocumentArtifact
// ---------------------------------------------------------------------------

/// A document ready to persist: synthesized text or a failure placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentArtifact {
    pub body: String,
}

impl DocumentArtifact {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one batch (one accepted event), used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generate a new time-sortable batch identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of processing one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A document was written. `degraded` marks a placeholder body.
    Success {
        filename: String,
        path: PathBuf,
        degraded: bool,
    },
    /// The file could not be documented; siblings are unaffected.
    Failure { filename: String, reason: String },
}

impl FileOutcome {
    pub fn filename(&self) -> &str {
        match self {
            Self::Success { filename, .. } | Self::Failure { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregated outcome of one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: BatchId,
    /// Per-file outcomes, in change-set order.
    pub outcomes: Vec<FileOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Number of documents written (including placeholders).
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of files that could not be documented.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }

    /// Number of documents written with a placeholder body.
    pub fn degraded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Success { degraded: true, .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
