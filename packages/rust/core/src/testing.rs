//! Test helpers shared by the core test modules.

use std::path::{Path, PathBuf};

use prdocs_shared::{AppConfig, Settings};

/// A fresh, uniquely named directory under the system temp dir.
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("prdocs-{prefix}-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Settings wired to mock GitHub and AI servers, writing into `docs_dir`.
pub fn settings_for(github_uri: &str, ai_uri: &str, docs_dir: &Path, concurrency: usize) -> Settings {
    let mut config = AppConfig::default();
    config.github.api_base = github_uri.to_string();
    config.pipeline.docs_dir = docs_dir.to_string_lossy().into_owned();
    config.pipeline.concurrency = concurrency;
    config.pipeline.request_timeout_secs = 5;

    let endpoint = format!("{ai_uri}/v1beta/models/test:generateContent");
    Settings::resolve_with(&config, |name| match name {
        "GITHUB_TOKEN" => Some("ghp_test".into()),
        "GEMINI_API_KEY" => Some("ai_test".into()),
        "AI_ENDPOINT" => Some(endpoint.clone()),
        _ => None,
    })
    .unwrap()
}

/// One entry of a GitHub pull-request files listing.
pub fn listed_file(raw_base: &str, filename: &str) -> serde_json::Value {
    serde_json::json!({
        "sha": "0123456789abcdef",
        "filename": filename,
        "status": "modified",
        "additions": 1,
        "deletions": 0,
        "changes": 1,
        "patch": "@@ -0,0 +1 @@",
        "raw_url": format!("{raw_base}/raw/{filename}"),
    })
}

/// A `generateContent` response carrying `text` as the first candidate.
pub fn candidate(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [ { "content": { "parts": [ { "text": text } ], "role": "model" } } ]
    })
}
