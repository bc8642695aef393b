//! GitHub access for the documentation pipeline.
//!
//! This crate provides:
//! - [`ChangeSetFetcher`]: lists the files changed by a pull request
//! - [`ContentRetriever`]: downloads a changed file's raw content

mod changeset;
mod content;

pub use changeset::ChangeSetFetcher;
pub use content::ContentRetriever;
