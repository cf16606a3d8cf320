//! repo-puller - keep local clones of your git repositories up to date
//!
//! Repositories come from a local CSV list and, optionally, from the listing
//! of your GitHub account. Both are merged into one set and every entry is
//! cloned or pulled in turn. Output is only printed on errors, in dry-run and
//! in verbose mode, so runs are quiet enough for cron.
//!
//! ## Modules
//!
//! - [`config`]: Settings file loading and defaults
//! - [`local`]: The CSV repository list
//! - [`github`]: GitHub account listing and authentication
//! - [`repo`]: Repository records and the merge of both sources
//! - [`git`]: Running git clone and pull
//! - [`sync`]: The sync loop

pub mod config;
pub mod git;
pub mod github;
pub mod local;
pub mod repo;
pub mod sync;

pub use config::Config;
pub use git::{GitCli, GitOutcome, GitRunner};
pub use github::GitHubLister;
pub use repo::{merge, RepositoryRecord, RepositorySet};
pub use sync::{SyncEngine, SyncOptions, SyncResult, SyncSummary};
