//! Sync Engine - walks the merged repository set and clones or pulls each entry
//!
//! Entries are processed one at a time in set order. Every per-repository
//! problem is turned into a console line and a [`SyncResult`]; only a failure
//! to write to the console escapes [`SyncEngine::sync_all`].

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::git::GitRunner;
use crate::repo::{RepositoryRecord, RepositorySet};

/// Flags controlling a sync pass
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Print the commands instead of running them
    pub dry_run: bool,
    /// Print progress lines
    pub verbose: bool,
    /// Clone repositories that are missing locally
    pub clone: bool,
    /// Pause after each synced repository (not in dry-run)
    pub seconds_between_pulls: u64,
}

/// Result of syncing one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    /// Repository was successfully cloned
    Cloned { path: PathBuf },
    /// Repository was successfully pulled
    Pulled { path: PathBuf },
    /// Dry-run printed the command it would have run
    Planned { path: PathBuf },
    /// `do_pull` is off for this repository
    Skipped { key: String },
    /// Repository is not on disk and cloning was not requested
    Missing { path: PathBuf },
    /// Operation failed with error
    Failed { path: PathBuf, error: String },
}

/// Results from a complete sync pass
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub skipped_operations: usize,
    pub missing_repositories: usize,
    pub duration: Duration,
    pub results: Vec<SyncResult>,
}

impl SyncSummary {
    /// Compile a summary from per-repository results
    pub fn from_results(results: Vec<SyncResult>, duration: Duration) -> Self {
        let mut successful_operations = 0;
        let mut failed_operations = 0;
        let mut skipped_operations = 0;
        let mut missing_repositories = 0;

        for result in &results {
            match result {
                SyncResult::Cloned { .. } | SyncResult::Pulled { .. } | SyncResult::Planned { .. } => {
                    successful_operations += 1
                }
                SyncResult::Skipped { .. } => skipped_operations += 1,
                SyncResult::Missing { .. } => missing_repositories += 1,
                SyncResult::Failed { .. } => failed_operations += 1,
            }
        }

        Self {
            total_repositories: results.len(),
            successful_operations,
            failed_operations,
            skipped_operations,
            missing_repositories,
            duration,
            results,
        }
    }

    /// Any repository that failed or could not be found
    pub fn has_failures(&self) -> bool {
        self.failed_operations > 0 || self.missing_repositories > 0
    }
}

/// Drives git over a repository set, writing console lines to `out`
pub struct SyncEngine<G, W> {
    git: G,
    out: W,
    options: SyncOptions,
    default_destination: String,
}

impl<G: GitRunner, W: Write> SyncEngine<G, W> {
    pub fn new(git: G, out: W, options: SyncOptions, default_destination: impl Into<String>) -> Self {
        Self {
            git,
            out,
            options,
            default_destination: default_destination.into(),
        }
    }

    /// Give back the git runner and console sink
    pub fn into_parts(self) -> (G, W) {
        (self.git, self.out)
    }

    /// Sync every repository in set order
    pub async fn sync_all(&mut self, repos: &RepositorySet) -> Result<SyncSummary> {
        let start_time = Instant::now();
        info!("Syncing {} repositories", repos.len());

        let mut results = Vec::with_capacity(repos.len());

        for (key, record) in repos.iter() {
            let result = self.sync_repository(key, record).await?;
            debug!("{}: {:?}", key, result);
            results.push(result);
        }

        let summary = SyncSummary::from_results(results, start_time.elapsed());

        info!(
            "Sync completed in {:.2}s: {} successful, {} failed, {} missing, {} skipped",
            summary.duration.as_secs_f64(),
            summary.successful_operations,
            summary.failed_operations,
            summary.missing_repositories,
            summary.skipped_operations
        );

        Ok(summary)
    }

    /// Sync one entry, then pace (real runs) or print a separator (dry-run)
    pub async fn sync_repository(&mut self, key: &str, record: &RepositoryRecord) -> Result<SyncResult> {
        if !record.should_pull() {
            if self.options.dry_run || self.options.verbose {
                writeln!(self.out, "skipping {}", key)?;
                writeln!(self.out)?;
            }
            return Ok(SyncResult::Skipped {
                key: key.to_string(),
            });
        }

        if self.options.verbose {
            writeln!(self.out, "processing {}", key)?;
        }

        let result = self.clone_or_pull(key, record).await?;

        if self.options.dry_run {
            writeln!(self.out)?;
        } else if self.options.seconds_between_pulls > 0 {
            debug!("Sleeping {}s before the next repository", self.options.seconds_between_pulls);
            tokio::time::sleep(Duration::from_secs(self.options.seconds_between_pulls)).await;
        }

        Ok(result)
    }

    async fn clone_or_pull(&mut self, key: &str, record: &RepositoryRecord) -> Result<SyncResult> {
        let destination = record.destination(&self.default_destination).to_string();
        let destination = match shellexpand::full(&destination) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(e) => {
                let path = PathBuf::from(&destination).join(record.dir_name());
                return self.report_failure(&path, format!("cannot expand destination: {}", e));
            }
        };

        let dir_name = record.dir_name();
        let repo_path = destination.join(dir_name);

        if self.options.dry_run {
            writeln!(self.out, "cd {}", destination.display())?;
        }

        if repo_path.is_dir() {
            self.pull(&repo_path, dir_name).await
        } else {
            self.clone_missing(key, record, &destination, &repo_path).await
        }
    }

    async fn pull(&mut self, repo_path: &Path, dir_name: &str) -> Result<SyncResult> {
        if self.options.dry_run {
            writeln!(self.out, "cd {}", dir_name)?;
            writeln!(self.out, "git pull")?;
            return Ok(SyncResult::Planned {
                path: repo_path.to_path_buf(),
            });
        }

        debug!("Pulling {}", repo_path.display());
        match self.git.pull(repo_path).await {
            Ok(outcome) if outcome.success() => Ok(SyncResult::Pulled {
                path: repo_path.to_path_buf(),
            }),
            Ok(outcome) => self.report_failure(repo_path, format!("git pull: {}", outcome)),
            Err(e) => self.report_failure(repo_path, format!("{:#}", e)),
        }
    }

    async fn clone_missing(
        &mut self,
        key: &str,
        record: &RepositoryRecord,
        destination: &Path,
        repo_path: &Path,
    ) -> Result<SyncResult> {
        if !self.options.clone {
            writeln!(
                self.out,
                "couldn't find repository {}! did you mean to run with --clone?",
                repo_path.display()
            )?;
            debug!("Repository {} not found at {}", key, repo_path.display());
            return Ok(SyncResult::Missing {
                path: repo_path.to_path_buf(),
            });
        }

        let Some(url) = record.clone_url.as_deref() else {
            writeln!(
                self.out,
                "can't clone {} into {}: no clone URL known",
                key,
                repo_path.display()
            )?;
            debug!("No clone URL for {}", key);
            return Ok(SyncResult::Failed {
                path: repo_path.to_path_buf(),
                error: "no clone URL".to_string(),
            });
        };

        let dir_name = record.dir_name();

        if self.options.dry_run {
            writeln!(self.out, "git clone {} {}", url, dir_name)?;
            return Ok(SyncResult::Planned {
                path: repo_path.to_path_buf(),
            });
        }

        info!("Cloning {} -> {}", key, repo_path.display());
        match self.git.clone_repo(url, dir_name, destination).await {
            Ok(outcome) if outcome.success() => Ok(SyncResult::Cloned {
                path: repo_path.to_path_buf(),
            }),
            Ok(outcome) => self.report_failure(repo_path, format!("git clone: {}", outcome)),
            Err(e) => self.report_failure(repo_path, format!("{:#}", e)),
        }
    }

    fn report_failure(&mut self, path: &Path, error: String) -> Result<SyncResult> {
        writeln!(self.out, "failure occurred on {}", path.display())?;
        debug!("Sync failed for {}: {}", path.display(), error);
        Ok(SyncResult::Failed {
            path: path.to_path_buf(),
            error,
        })
    }
}
