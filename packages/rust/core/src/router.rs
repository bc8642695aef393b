//! Inbound webhook classification and dispatch.

use serde::Deserialize;
use tracing::{debug, info, instrument};

use prdocs_shared::{BatchReport, PrDocsError, PullRequestRef, Result};

use crate::pipeline::{Pipeline, SilentProgress};

/// The `x-github-event` value this bot reacts to.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Pull-request actions that trigger a documentation batch.
pub const TRIGGER_ACTIONS: [&str; 2] = ["closed", "synchronize"];

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PullRequestPayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    repository: Option<RepositoryField>,
    #[serde(default)]
    pull_request: Option<PullRequestField>,
}

#[derive(Debug, Deserialize)]
struct RepositoryField {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestField {
    number: Option<u64>,
}

/// A raw inbound webhook: the event header plus the undecoded JSON body.
#[derive(Debug, Clone)]
pub struct InboundEvent<'a> {
    pub event_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// What to do with an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not a pull-request event.
    Ignored,
    /// A pull-request event whose action does not trigger documentation.
    Skipped { action: String },
    /// Proceed to the pipeline for this pull request.
    Accepted(PullRequestRef),
}

impl InboundEvent<'_> {
    /// Classify the event without side effects.
    ///
    /// The body is only decoded for pull-request events, so unrelated events
    /// with arbitrary payloads are always ignored.
    pub fn classify(&self) -> Result<Disposition> {
        if self.event_type != Some(PULL_REQUEST_EVENT) {
            return Ok(Disposition::Ignored);
        }

        let payload: PullRequestPayload = serde_json::from_slice(self.body)
            .map_err(|e| PrDocsError::validation(format!("invalid pull_request payload: {e}")))?;

        let action = payload.action.unwrap_or_default();
        if !TRIGGER_ACTIONS.contains(&action.as_str()) {
            return Ok(Disposition::Skipped { action });
        }

        let repository = payload
            .repository
            .and_then(|r| r.full_name)
            .ok_or_else(|| PrDocsError::validation("payload is missing repository.full_name"))?;
        let number = payload
            .pull_request
            .and_then(|p| p.number)
            .ok_or_else(|| PrDocsError::validation("payload is missing pull_request.number"))?;

        Ok(Disposition::Accepted(PullRequestRef::new(repository, number)?))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Result of routing one event.
#[derive(Debug)]
pub enum RouteOutcome {
    Ignored,
    Skipped { action: String },
    Completed(BatchReport),
}

/// Entry point for inbound events: classify, then run at most one batch.
#[derive(Debug, Clone)]
pub struct EventRouter {
    pipeline: Pipeline,
}

impl EventRouter {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Route one event.
    ///
    /// `Err` is either a `Validation` error (unreadable payload) or the batch
    /// abort from a failed change-set listing.
    #[instrument(skip_all, fields(event = event.event_type.unwrap_or("<none>")))]
    pub async fn route(&self, event: &InboundEvent<'_>) -> Result<RouteOutcome> {
        match event.classify()? {
            Disposition::Ignored => {
                debug!("ignoring non pull_request event");
                Ok(RouteOutcome::Ignored)
            }
            Disposition::Skipped { action } => {
                debug!(%action, "pull_request action needs no docs");
                Ok(RouteOutcome::Skipped { action })
            }
            Disposition::Accepted(pr) => {
                info!(%pr, "pull request accepted for documentation");
                let report = self.pipeline.run_for_pull_request(&pr, &SilentProgress).await?;
                Ok(RouteOutcome::Completed(report))
            }
        }
    }
}
