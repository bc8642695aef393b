//! Application configuration for prdocs.
//!
//! User config lives at `~/.prdocs/prdocs.toml` (or wherever `--config` points).
//! The file only ever names environment variables for credentials; the secrets
//! themselves are read once at startup by [`resolve_config`] into [`Settings`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PrDocsError, Result};
use crate::http::{header_name, header_value};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "prdocs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".prdocs";

// ---------------------------------------------------------------------------
// Config structs (matching prdocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// User-Agent header sent with every GitHub request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page size for the pull-request files listing (GitHub max is 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            user_agent: default_user_agent(),
            per_page: default_per_page(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_user_agent() -> String {
    "ai-doc-bot".into()
}
fn default_per_page() -> u32 {
    100
}

/// `[ai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Generation endpoint URL.
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    /// Env var that, when set, overrides `endpoint`.
    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_ai_key_env")]
    pub api_key_env: String,

    /// Header the API key is sent in.
    #[serde(default = "default_ai_key_header")]
    pub api_key_header: String,

    /// File content beyond this many characters is truncated before prompting.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ai_endpoint(),
            endpoint_env: default_endpoint_env(),
            api_key_env: default_ai_key_env(),
            api_key_header: default_ai_key_header(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        .into()
}
fn default_endpoint_env() -> String {
    "AI_ENDPOINT".into()
}
fn default_ai_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_ai_key_header() -> String {
    "X-goog-api-key".into()
}
fn default_max_content_chars() -> usize {
    30_000
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output directory for generated documents, relative to the working directory.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Maximum changed files processed at once within a batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout applied to every outbound HTTP call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_docs_dir() -> String {
    "docs".into()
}
fn default_concurrency() -> usize {
    4
}
fn default_request_timeout() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// Resolved settings (config + environment, validated once at startup)
// ---------------------------------------------------------------------------

/// Fully resolved runtime settings, including credentials.
///
/// Built once by [`resolve_config`] and shared read-only by every component.
#[derive(Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub github_api_base: Url,
    pub github_token: String,
    pub user_agent: String,
    pub per_page: u32,
    pub ai_endpoint: Url,
    pub ai_api_key: String,
    pub ai_api_key_header: String,
    pub max_content_chars: usize,
    pub docs_dir: PathBuf,
    pub concurrency: usize,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("github_api_base", &self.github_api_base.as_str())
            .field("github_token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("per_page", &self.per_page)
            .field("ai_endpoint", &self.ai_endpoint.as_str())
            .field("ai_api_key", &"<redacted>")
            .field("ai_api_key_header", &self.ai_api_key_header)
            .field("max_content_chars", &self.max_content_chars)
            .field("docs_dir", &self.docs_dir)
            .field("concurrency", &self.concurrency)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Resolve settings from the config plus the process environment.
///
/// Fails fast if a credential variable is missing or empty.
pub fn resolve_config(config: &AppConfig) -> Result<Settings> {
    Settings::resolve_with(config, |name| std::env::var(name).ok())
}

impl Settings {
    /// Resolve settings using `lookup` for environment variables.
    pub fn resolve_with(
        config: &AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let required = |var_name: &str, what: &str| -> Result<String> {
            match lookup(var_name) {
                Some(val) if !val.trim().is_empty() => Ok(val),
                _ => Err(PrDocsError::config(format!(
                    "{what} not found. Set the {var_name} environment variable."
                ))),
            }
        };

        let github_token = required(&config.github.token_env, "GitHub access token")?;
        let ai_api_key = required(&config.ai.api_key_env, "AI service API key")?;

        let endpoint = lookup(&config.ai.endpoint_env)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| config.ai.endpoint.clone());

        let ai_endpoint = parse_url(&endpoint, "ai.endpoint")?;
        let github_api_base = parse_url(&config.github.api_base, "github.api_base")?;

        if config.github.per_page == 0 || config.github.per_page > 100 {
            return Err(PrDocsError::config(format!(
                "github.per_page must be between 1 and 100, got {}",
                config.github.per_page
            )));
        }

        if config.pipeline.concurrency == 0 {
            return Err(PrDocsError::config("pipeline.concurrency must be at least 1"));
        }

        if config.pipeline.request_timeout_secs == 0 {
            return Err(PrDocsError::config(
                "pipeline.request_timeout_secs must be at least 1",
            ));
        }

        // Values that reqwest would otherwise reject on every send.
        header_name(&config.ai.api_key_header, "ai.api_key_header")?;
        header_value(&ai_api_key, "AI service API key")?;
        header_value(&format!("Bearer {github_token}"), "GitHub access token")?;
        header_value(&config.github.user_agent, "github.user_agent")?;

        Ok(Self {
            bind_addr: config.server.bind_addr.clone(),
            github_api_base,
            github_token,
            user_agent: config.github.user_agent.clone(),
            per_page: config.github.per_page,
            ai_endpoint,
            ai_api_key,
            ai_api_key_header: config.ai.api_key_header.clone(),
            max_content_chars: config.ai.max_content_chars,
            docs_dir: PathBuf::from(&config.pipeline.docs_dir),
            concurrency: config.pipeline.concurrency,
            request_timeout: Duration::from_secs(config.pipeline.request_timeout_secs),
        })
    }
}

fn parse_url(raw: &str, key: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| PrDocsError::config(format!("{key} is not a valid URL ({raw}): {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.prdocs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PrDocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.prdocs/prdocs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PrDocsError::config(format!("failed to read {}: {e}", path.display()))
    })?;

    toml::from_str(&content)
        .map_err(|e| PrDocsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| PrDocsError::config(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| PrDocsError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| PrDocsError::config(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("GITHUB_TOKEN"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(toml_str.contains("docs_dir"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[pipeline]
docs_dir = "/srv/docs"
concurrency = 8

[github]
user_agent = "my-bot"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.pipeline.docs_dir, "/srv/docs");
        assert_eq!(config.pipeline.concurrency, 8);
        assert_eq!(config.pipeline.request_timeout_secs, 60);
        assert_eq!(config.github.user_agent, "my-bot");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
    }

    #[test]
    fn resolve_reads_credentials() {
        let config = AppConfig::default();
        let settings =
            Settings::resolve_with(&config, env(&[("GITHUB_TOKEN", "ghp_x"), ("GEMINI_API_KEY", "k")]))
                .unwrap();
        assert_eq!(settings.github_token, "ghp_x");
        assert_eq!(settings.ai_api_key, "k");
        assert_eq!(settings.docs_dir, PathBuf::from("docs"));
        assert!(settings.ai_endpoint.as_str().contains("generateContent"));
    }

    #[test]
    fn resolve_fails_fast_without_token() {
        let config = AppConfig::default();
        let err = Settings::resolve_with(&config, env(&[("GEMINI_API_KEY", "k")])).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        let err = Settings::resolve_with(&config, env(&[("GITHUB_TOKEN", "t"), ("GEMINI_API_KEY", "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn endpoint_env_overrides_file() {
        let config = AppConfig::default();
        let settings = Settings::resolve_with(
            &config,
            env(&[
                ("GITHUB_TOKEN", "t"),
                ("GEMINI_API_KEY", "k"),
                ("AI_ENDPOINT", "http://localhost:9999/generate"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.ai_endpoint.as_str(), "http://localhost:9999/generate");
    }

    #[test]
    fn resolve_rejects_bad_values() {
        let creds = [("GITHUB_TOKEN", "t"), ("GEMINI_API_KEY", "k")];

        let mut config = AppConfig::default();
        config.pipeline.concurrency = 0;
        assert!(Settings::resolve_with(&config, env(&creds)).is_err());

        let mut config = AppConfig::default();
        config.github.per_page = 500;
        assert!(Settings::resolve_with(&config, env(&creds)).is_err());

        let mut config = AppConfig::default();
        config.ai.endpoint = "not a url".into();
        assert!(Settings::resolve_with(&config, env(&creds)).is_err());

        let mut config = AppConfig::default();
        config.pipeline.request_timeout_secs = 0;
        let err = Settings::resolve_with(&config, env(&creds)).unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));

        let mut config = AppConfig::default();
        config.ai.api_key_header = "X goog api key".into();
        let err = Settings::resolve_with(&config, env(&creds)).unwrap_err();
        assert!(err.to_string().contains("ai.api_key_header"));

        let config = AppConfig::default();
        let err = Settings::resolve_with(
            &config,
            env(&[("GITHUB_TOKEN", "t"), ("GEMINI_API_KEY", "key\nwith-newline")]),
        )
        .unwrap_err();
        assert!(matches!(err, PrDocsError::Config { .. }));
        assert!(!err.to_string().contains("with-newline"));

        let err = Settings::resolve_with(
            &config,
            env(&[("GITHUB_TOKEN", "tok\r\nX-Injected: 1"), ("GEMINI_API_KEY", "k")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GitHub access token"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let settings = Settings::resolve_with(
            &AppConfig::default(),
            env(&[("GITHUB_TOKEN", "ghp_secret"), ("GEMINI_API_KEY", "aiza_secret")]),
        )
        .unwrap();
        let dbg = format!("{settings:?}");
        assert!(!dbg.contains("ghp_secret"));
        assert!(!dbg.contains("aiza_secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
