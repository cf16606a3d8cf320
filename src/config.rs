use anyhow::{bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest page the GitHub GraphQL API will return for a connection
pub const MAX_PAGE_SIZE: u32 = 100;

/// Settings for a repo-puller run
///
/// Built once at startup and handed to every component that needs it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Parent directory for repositories that don't name their own destination
    #[serde(default = "default_destination")]
    pub default_destination: String,

    /// Location of the repository list (defaults to repos.csv next to the settings file)
    #[serde(default)]
    pub repos_file: Option<String>,

    /// GitHub account listing settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Directory of the file these settings were loaded from
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// Add every repository owned by the authenticated account to the run
    #[serde(default)]
    pub pull_my_repos: bool,

    /// Account name used as the owner half of `owner/name` keys
    pub username: Option<String>,

    /// API token; prefer `gh` or GITHUB_TOKEN over storing it here
    #[serde(default)]
    pub token: Option<String>,

    /// Authentication method
    #[serde(default = "default_auth_method")]
    pub auth_method: String, // "auto", "config", "gh_cli", "token"

    /// Base URL of the API (GitHub Enterprise)
    #[serde(default)]
    pub api_url: Option<String>,

    /// Number of repositories requested from the listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// git executable to invoke
    #[serde(default = "default_git_binary")]
    pub git_binary: String,

    /// Pause after each repository when --seconds-between-pulls is not given
    #[serde(default)]
    pub seconds_between_pulls: u64,
}

fn default_destination() -> String {
    "~/src".to_string()
}
fn default_auth_method() -> String {
    "auto".to_string()
}
fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}
fn default_git_binary() -> String {
    "git".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            pull_my_repos: false,
            username: None,
            token: None,
            auth_method: default_auth_method(),
            api_url: None,
            page_size: default_page_size(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            git_binary: default_git_binary(),
            seconds_between_pulls: 0,
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;
            config.config_dir = config_path.parent().map(Path::to_path_buf);

            tracing::info!("Created default configuration at: {:?}", config_path);
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.config_dir = path.parent().map(Path::to_path_buf);

        config.expand_paths()?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repo-puller").join("config.yml"))
    }

    /// Get the default repository list path, next to the default config file
    pub fn default_repos_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repo-puller").join("repos.csv"))
    }

    /// Repository list location: `repos_file` when set, otherwise repos.csv
    /// next to the loaded settings file
    pub fn repos_path(&self) -> Result<PathBuf> {
        match (&self.repos_file, &self.config_dir) {
            (Some(file), _) => Ok(PathBuf::from(file)),
            (None, Some(dir)) => Ok(dir.join("repos.csv")),
            (None, None) => Self::default_repos_path(),
        }
    }

    /// Expand `~` and environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.default_destination = shellexpand::full(&self.default_destination)
            .context("Failed to expand default_destination path")?
            .into_owned();

        if let Some(file) = &self.repos_file {
            self.repos_file = Some(
                shellexpand::full(file)
                    .context("Failed to expand repos_file path")?
                    .into_owned(),
            );
        }

        Ok(())
    }

    /// Reject settings the remote listing cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.github.page_size == 0 || self.github.page_size > MAX_PAGE_SIZE {
            bail!(
                "github.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.github.page_size
            );
        }

        if self.github.pull_my_repos
            && self.github.username.as_deref().map_or(true, str::is_empty)
        {
            bail!("github.username is required when github.pull_my_repos is enabled");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_destination: default_destination(),
            repos_file: None,
            github: GitHubConfig::default(),
            sync: SyncConfig::default(),
            config_dir: None,
        }
    }
}
