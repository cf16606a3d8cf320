use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repo_puller::github::remote_repositories;
use repo_puller::local::read_repository_list;
use repo_puller::{merge, Config, GitCli, SyncEngine, SyncOptions};

/// Keep all your local copies of GitHub repositories up to date
///
/// Only prints output on errors, --dry-run and --verbose, which makes this
/// suitable for cron jobs.
#[derive(Parser)]
#[command(name = "repo-puller")]
#[command(version)]
struct Cli {
    /// Print the commands that would run instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Print progress for every repository
    #[arg(short, long)]
    verbose: bool,

    /// Number of seconds to wait between each pull (defaults to the config value, 0)
    #[arg(long, value_name = "SECONDS")]
    seconds_between_pulls: Option<u64>,

    /// By default, print an error message if a repository can't be found.
    /// With --clone, clone it instead.
    #[arg(long)]
    clone: bool,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Repository list to read instead of the configured one
    #[arg(long, value_name = "CSV")]
    repos_file: Option<PathBuf>,

    /// Exit with status 1 when any repository failed
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting repo-puller v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;

    let repos_path = match &cli.repos_file {
        Some(path) => path.clone(),
        None => config.repos_path()?,
    };

    let local = read_repository_list(&repos_path)?;
    let remote = remote_repositories(&config).await?;
    let repos = merge(local, &remote);

    info!(
        "{} repositories to sync ({} from GitHub)",
        repos.len(),
        remote.len()
    );

    let options = SyncOptions {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        clone: cli.clone,
        seconds_between_pulls: cli
            .seconds_between_pulls
            .unwrap_or(config.sync.seconds_between_pulls),
    };

    let mut engine = SyncEngine::new(
        GitCli::from_config(&config),
        std::io::stdout(),
        options,
        config.default_destination.clone(),
    );
    let summary = engine
        .sync_all(&repos)
        .await
        .context("Failed to write sync output")?;

    if cli.verbose {
        println!(
            "{} repositories: {} synced, {} failed, {} missing, {} skipped in {:.2}s",
            summary.total_repositories,
            summary.successful_operations,
            summary.failed_operations,
            summary.missing_repositories,
            summary.skipped_operations,
            summary.duration.as_secs_f64()
        );
    }

    if cli.strict && summary.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("repo_puller=debug,warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}
