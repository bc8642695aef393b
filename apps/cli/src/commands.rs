//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use prdocs_core::{BatchProgress, EventRouter, Pipeline};
use prdocs_shared::{
    AppConfig, FileOutcome, PullRequestRef, Settings, config_file_path, init_config, load_config,
    load_config_from, resolve_config,
};

use crate::server::{self, AppState};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// prdocs: keep per-file documentation in step with merged pull requests.
#[derive(Parser)]
#[command(
    name = "prdocs",
    version,
    about = "Generate documentation for the files changed in GitHub pull requests.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.prdocs/prdocs.toml.
    #[arg(long, global = true, env = "PRDOCS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the webhook server.
    Serve {
        /// Listen address, overriding server.bind_addr.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Document one pull request without waiting for a webhook.
    Run {
        /// Repository as owner/name.
        #[arg(long)]
        repo: String,

        /// Pull request number.
        #[arg(long)]
        pr: u64,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prdocs=info,tower_http=info",
        1 => "prdocs=debug,tower_http=debug",
        _ => "prdocs=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Load an env file into the process environment, `.env` lookup when `path` is `None`.
///
/// A missing file is not an error; variables already set are never overridden.
pub(crate) fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(p) => dotenvy::from_path(p).ok().map(|()| p.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Serve { bind } => cmd_serve(config_path, bind).await,
        Command::Run { repo, pr } => cmd_run(config_path, repo, pr).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn read_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

/// Load config and resolve credentials, failing before any work starts.
fn settings(path: Option<&Path>) -> Result<Settings> {
    let config = read_config(path)?;
    Ok(resolve_config(&config)?)
}

async fn cmd_serve(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let settings = settings(config_path)?;
    let addr = bind.unwrap_or_else(|| settings.bind_addr.clone());

    let pipeline = Pipeline::new(&settings)?;
    let app = server::router(AppState::new(EventRouter::new(pipeline)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        docs_dir = %settings.docs_dir.display(),
        concurrency = settings.concurrency,
        "webhook server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn cmd_run(config_path: Option<&Path>, repo: String, number: u64) -> Result<()> {
    let settings = settings(config_path)?;
    let pr = PullRequestRef::new(repo, number)?;
    let pipeline = Pipeline::new(&settings)?;

    info!(%pr, "documenting pull request");

    let reporter = CliProgress::new();
    let result = pipeline.run_for_pull_request(&pr, &reporter).await;
    reporter.finish();
    let report = result?;

    let elapsed = report.finished_at - report.started_at;

    println!();
    println!("  Pull request {pr} documented");
    println!("  Batch:    {}", report.batch_id);
    println!("  Written:  {}", report.written());
    println!("  Degraded: {}", report.degraded());
    println!("  Failed:   {}", report.failed());
    println!("  Docs:     {}", settings.docs_dir.display());
    println!(
        "  Time:     {:.1}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    );

    for outcome in report.failures() {
        if let FileOutcome::Failure { filename, reason } = outcome {
            println!("    ✗ {filename}: {reason}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let source = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    println!("# {}", source.display());
    println!("{}", toml::to_string_pretty(&config)?);

    for var in [&config.github.token_env, &config.ai.api_key_env] {
        let state = match std::env::var(var) {
            Ok(v) if !v.trim().is_empty() => "set",
            _ => "missing",
        };
        println!("# {var}: {state}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl BatchProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_finished(&self, outcome: &FileOutcome, current: usize, total: usize) {
        let mark = match outcome {
            FileOutcome::Success { degraded: false, .. } => "ok",
            FileOutcome::Success { degraded: true, .. } => "placeholder",
            FileOutcome::Failure { .. } => "failed",
        };
        self.spinner.set_message(format!(
            "Documenting [{current}/{total}] {} ({mark})",
            outcome.filename()
        ));
    }
}
