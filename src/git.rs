use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::config::Config;

/// Exit status of a finished git command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitOutcome {
    /// `None` when git was killed by a signal
    pub code: Option<i32>,
}

impl GitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for GitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// The two git operations a sync needs
///
/// `Err` means git could not be run at all; a git that ran and failed is an
/// `Ok` outcome with a non-zero code.
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// `git clone <url> <dir_name>` inside `destination`
    async fn clone_repo(&self, url: &str, dir_name: &str, destination: &Path) -> Result<GitOutcome>;

    /// `git pull` inside `repo_dir`
    async fn pull(&self, repo_dir: &Path) -> Result<GitOutcome>;
}

/// Runs the git executable directly, without a shell
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl GitCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sync.git_binary.clone())
    }

    async fn run(&self, args: &[&str], dir: &Path) -> Result<GitOutcome> {
        debug!("Running {} {} in {}", self.binary, args.join(" "), dir.display());

        // stdout is noise for unattended runs; stderr carries git's own diagnostics
        let status = AsyncCommand::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await
            .with_context(|| format!("Failed to execute {} {}", self.binary, args[0]))?;

        Ok(GitOutcome {
            code: status.code(),
        })
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl GitRunner for GitCli {
    async fn clone_repo(&self, url: &str, dir_name: &str, destination: &Path) -> Result<GitOutcome> {
        tokio::fs::create_dir_all(destination)
            .await
            .with_context(|| format!("Failed to create directory {}", destination.display()))?;

        self.run(&["clone", url, dir_name], destination).await
    }

    async fn pull(&self, repo_dir: &Path) -> Result<GitOutcome> {
        self.run(&["pull"], repo_dir).await
    }
}
