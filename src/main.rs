use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use saverepos::{
    Config, GitCli, GiteaClient, LogLevel, MirrorLayout, SyncEngine, SyncResult, SyncSummary,
};

/// Maintain an updated collection of the git repositories in a Gitea server
#[derive(Parser)]
#[command(name = "saverepos")]
#[command(version)]
struct Cli {
    /// URL of the Gitea server
    url: Option<String>,

    /// Base directory where the repositories will be held [default: repos]
    #[arg(short = 'd', long = "basedir", value_name = "DIR")]
    basedir: Option<String>,

    /// Logging level (DEBUG, INFO, WARNING, ERROR) [default: ERROR]
    #[arg(short = 'l', long = "loglevel", value_name = "LEVEL")]
    loglevel: Option<LogLevel>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of repositories requested per API page
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,

    /// Show what would be cloned or pulled without running git
    #[arg(long)]
    dry_run: bool,

    /// Exit successfully even if some clones or pulls failed
    #[arg(long)]
    allow_failures: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(config.log_level);
    info!("Starting saverepos v{}", env!("CARGO_PKG_VERSION"));

    let url = cli
        .url
        .clone()
        .or_else(|| config.server_url.clone())
        .context("Missing Gitea server URL (pass it as an argument or set server_url)")?;

    let summary = cmd_sync(&url, &config, cli.dry_run).await?;

    if summary.has_failures() && !config.allow_failures {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Initialize logging; RUST_LOG takes precedence over the configured level
fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the configuration file and apply command line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    if let Some(basedir) = &cli.basedir {
        config.set_base_directory(basedir);
    }
    if let Some(level) = cli.loglevel {
        config.log_level = level;
    }
    if cli.page_size.is_some() {
        config.page_size = cli.page_size;
    }
    if cli.allow_failures {
        config.allow_failures = true;
    }

    Ok(config)
}

/// Mirror every repository listed by the server
async fn cmd_sync(url: &str, config: &Config, dry_run: bool) -> Result<SyncSummary> {
    let base_dir = config.base_dir();
    std::fs::create_dir_all(&base_dir)
        .with_context(|| format!("Failed to create base directory: {}", base_dir.display()))?;

    let client = GiteaClient::new(url, config)?;
    let engine = SyncEngine::new(MirrorLayout::new(base_dir), GitCli::new()).with_dry_run(dry_run);

    info!("Mirroring {} into {}", url, engine.layout().base_dir().display());
    let summary = engine.sync_all(client.repositories()).await?;

    print_summary(&summary, dry_run);
    Ok(summary)
}

fn print_summary(summary: &SyncSummary, dry_run: bool) {
    if dry_run {
        println!("🔍 Dry run - no changes made");
        for result in &summary.results {
            if let SyncResult::Planned { path, action } = result {
                println!("   {:<5} {}", action, path.display());
            }
        }
        println!("   📊 Total repositories: {}", summary.total_repositories);
        return;
    }

    println!("🎉 Mirroring complete");
    println!("   📊 Total repositories: {}", summary.total_repositories);
    println!("   📥 Cloned: {}", summary.cloned);
    println!("   🔄 Pulled: {}", summary.pulled);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    if summary.has_failures() {
        println!("\n🔍 Failed Operations:");
        for result in summary.failures() {
            if let SyncResult::Failed {
                path,
                action,
                error,
            } = result
            {
                println!("   ❌ git {} {}: {}", action, path.display(), error);
            }
        }
    }
}
