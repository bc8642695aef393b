//! Shared types, error model, and configuration for prdocs.
//!
//! This crate is the foundation depended on by all other prdocs crates.
//! It provides:
//! - [`PrDocsError`]: the unified error type
//! - Domain types ([`ChangedFile`], [`DocumentArtifact`], [`FileOutcome`], [`BatchReport`])
//! - Configuration ([`AppConfig`], [`Settings`], config loading)
//! - The outbound HTTP client ([`build_client`])

pub mod config;
pub mod error;
pub mod http;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AiConfig, AppConfig, GithubConfig, PipelineConfig, ServerConfig, Settings, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_config,
};
pub use error::{PrDocsError, Result};
pub use http::{build_client, header_name, header_value};
pub use types::{
    BatchId, BatchReport, ChangedFile, DocumentArtifact, FileOutcome, FileStatus,
    PullRequestRef,
};
