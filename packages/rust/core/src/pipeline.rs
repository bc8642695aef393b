//! End-to-end batch: pull request → change set → (content → synthesis → persist) per file.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, info_span, instrument, warn};

use prdocs_github::{ChangeSetFetcher, ContentRetriever};
use prdocs_shared::{
    BatchId, BatchReport, ChangedFile, FileOutcome, PullRequestRef, Result, Settings,
};
use prdocs_synth::DocSynthesizer;

use crate::persist::DocPersister;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for batch processing.
pub trait BatchProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each file's outcome is collected, in change-set order.
    fn file_finished(&self, outcome: &FileOutcome, current: usize, total: usize);
}

/// No-op progress reporter for the webhook server and tests.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_finished(&self, _outcome: &FileOutcome, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The per-file stages, shared read-only by every file task.
#[derive(Debug)]
struct FileStages {
    retriever: ContentRetriever,
    synthesizer: DocSynthesizer,
    persister: DocPersister,
}

/// Orchestrates one batch per accepted pull-request event.
#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: ChangeSetFetcher,
    stages: Arc<FileStages>,
    concurrency: usize,
}

impl Pipeline {
    /// Build every component from resolved settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::from_parts(
            ChangeSetFetcher::new(settings)?,
            ContentRetriever::new(settings)?,
            DocSynthesizer::new(settings)?,
            DocPersister::new(&settings.docs_dir),
            settings.concurrency,
        ))
    }

    pub fn from_parts(
        fetcher: ChangeSetFetcher,
        retriever: ContentRetriever,
        synthesizer: DocSynthesizer,
        persister: DocPersister,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            stages: Arc::new(FileStages {
                retriever,
                synthesizer,
                persister,
            }),
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch the change set for `pr` once and document every file in it.
    ///
    /// Fails only if the listing fails; per-file failures land in the report.
    #[instrument(skip_all, fields(pr = %pr))]
    pub async fn run_for_pull_request(
        &self,
        pr: &PullRequestRef,
        progress: &dyn BatchProgress,
    ) -> Result<BatchReport> {
        progress.phase("Fetching changed files");

        let files = self.fetcher.fetch(pr).await.inspect_err(|e| {
            error!(error = %e, "change set listing failed, aborting batch");
        })?;

        Ok(self.process_files(files, progress).await)
    }

    /// Document each changed file, at most `concurrency` at a time.
    pub async fn process_files(
        &self,
        files: Vec<ChangedFile>,
        progress: &dyn BatchProgress,
    ) -> BatchReport {
        let batch_id = BatchId::new();
        let started_at = Utc::now();
        let total = files.len();

        info!(%batch_id, files = total, concurrency = self.concurrency, "starting batch");
        progress.phase("Generating documentation");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(total);

        for file in files {
            let filename = file.filename.clone();
            let stages = self.stages.clone();
            let sem = semaphore.clone();
            let span = info_span!("file", %batch_id, filename = %file.filename);

            let handle = tokio::spawn(
                async move {
                    let Ok(_permit) = sem.acquire_owned().await else {
                        return FileOutcome::Failure {
                            filename: file.filename,
                            reason: "concurrency gate closed".into(),
                        };
                    };
                    process_file(&stages, file).await
                }
                .instrument(span),
            );
            handles.push((filename, handle));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (i, (filename, handle)) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(%filename, error = %e, "file task did not complete");
                    FileOutcome::Failure {
                        filename,
                        reason: format!("task failed: {e}"),
                    }
                }
            };
            progress.file_finished(&outcome, i + 1, total);
            outcomes.push(outcome);
        }

        let report = BatchReport {
            batch_id,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %batch_id,
            written = report.written(),
            degraded = report.degraded(),
            failed = report.failed(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "batch complete"
        );

        report
    }
}

/// Run content → synthesis → persist for one file. Never aborts siblings.
async fn process_file(stages: &FileStages, file: ChangedFile) -> FileOutcome {
    let content = match stages.retriever.fetch(&file.raw_url).await {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "content retrieval failed");
            return FileOutcome::Failure {
                filename: file.filename,
                reason: e.to_string(),
            };
        }
    };

    let synthesis = stages.synthesizer.synthesize(&content, &file.filename).await;
    let degraded = synthesis.is_placeholder();

    match stages
        .persister
        .persist(synthesis.artifact(), &file.filename)
        .await
    {
        Ok(path) => FileOutcome::Success {
            filename: file.filename,
            path,
            degraded,
        },
        Err(e) => {
            warn!(error = %e, "persisting document failed");
            FileOutcome::Failure {
                filename: file.filename,
                reason: e.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
