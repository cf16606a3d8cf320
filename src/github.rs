use anyhow::{anyhow, bail, Context, Result};
use octocrab::Octocrab;
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::repo::{RepositoryRecord, RepositorySet};

/// Repositories owned by the authenticated account, first page only
const REPOSITORIES_QUERY: &str = "query($first: Int!) { \
     viewer { \
       repositories(first: $first, ownerAffiliations: OWNER) { \
         pageInfo { hasNextPage } \
         nodes { name sshUrl } \
       } \
     } \
   }";

/// GitHub authentication strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Token stored in the settings file
    ConfigToken,
    /// Use GitHub CLI authentication
    GitHubCLI,
    /// Use environment variable token
    EnvironmentToken,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ViewerData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    page_info: PageInfo,
    nodes: Vec<Option<RepositoryNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    ssh_url: String,
}

/// Lists the repositories of the authenticated GitHub account
pub struct GitHubLister {
    client: Octocrab,
    username: String,
    page_size: u32,
}

impl GitHubLister {
    /// Create a lister, looking up a token with the configured auth method
    pub fn new(config: &Config) -> Result<Self> {
        let (auth_strategy, token) = detect_authentication(config)?;

        info!("Using authentication strategy: {:?}", auth_strategy);

        Self::with_token(config, token)
    }

    /// Create a lister with an explicit token
    pub fn with_token(config: &Config, token: String) -> Result<Self> {
        let username = config
            .github
            .username
            .clone()
            .filter(|name| !name.is_empty())
            .context("github.username must be set to list your repositories")?;

        let mut builder = Octocrab::builder().personal_token(token);

        if let Some(api_url) = &config.github.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .with_context(|| format!("Invalid github.api_url: {}", api_url))?;
        }

        let client = builder.build().context("Failed to create GitHub client")?;

        Ok(Self {
            client,
            username,
            page_size: config.github.page_size,
        })
    }

    /// Fetch one page of owned repositories, keyed by `username/name`
    pub async fn list_repositories(&self) -> Result<RepositorySet> {
        debug!(
            "Fetching up to {} repositories for: {}",
            self.page_size, self.username
        );

        let payload = json!({
            "query": REPOSITORIES_QUERY,
            "variables": { "first": self.page_size },
        });

        let response: GraphQlResponse = self
            .client
            .graphql(&payload)
            .await
            .context("Failed to fetch repository list from GitHub")?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            bail!("GitHub returned errors: {}", messages.join("; "));
        }

        let connection = response
            .data
            .ok_or_else(|| anyhow!("GitHub response contained no data"))?
            .viewer
            .repositories;

        if connection.page_info.has_next_page {
            warn!(
                "Account {} has more than {} repositories; only the first {} are synced",
                self.username, self.page_size, self.page_size
            );
        }

        let repos: RepositorySet = connection
            .nodes
            .into_iter()
            .flatten()
            .map(|node| RepositoryRecord::new(&self.username, node.name).with_clone_url(node.ssh_url))
            .collect();

        info!("Found {} repositories for {}", repos.len(), self.username);
        Ok(repos)
    }
}

/// Remote half of the merged set.
///
/// Empty without any credential lookup or network access when
/// `github.pull_my_repos` is off.
pub async fn remote_repositories(config: &Config) -> Result<RepositorySet> {
    if !config.github.pull_my_repos {
        debug!("github.pull_my_repos is off, skipping remote listing");
        return Ok(RepositorySet::new());
    }

    GitHubLister::new(config)?.list_repositories().await
}

/// Detect and obtain GitHub authentication
pub fn detect_authentication(config: &Config) -> Result<(AuthStrategy, String)> {
    match config.github.auth_method.as_str() {
        "auto" => {
            if let Ok(token) = try_config_token(config) {
                Ok((AuthStrategy::ConfigToken, token))
            } else if let Ok(token) = try_github_cli() {
                Ok((AuthStrategy::GitHubCLI, token))
            } else if let Ok(token) = try_environment_token() {
                Ok((AuthStrategy::EnvironmentToken, token))
            } else {
                Err(anyhow!(
                    "No GitHub authentication found. Please either:\n\
                     1. Set github.token in the config file\n\
                     2. Install and authenticate GitHub CLI: gh auth login\n\
                     3. Set GITHUB_TOKEN environment variable"
                ))
            }
        }
        "config" => {
            let token = try_config_token(config)?;
            Ok((AuthStrategy::ConfigToken, token))
        }
        "gh_cli" => {
            let token = try_github_cli().context("GitHub CLI authentication failed. Run: gh auth login")?;
            Ok((AuthStrategy::GitHubCLI, token))
        }
        "token" => {
            let token = try_environment_token()
                .context("GITHUB_TOKEN environment variable not found or invalid")?;
            Ok((AuthStrategy::EnvironmentToken, token))
        }
        other => Err(anyhow!("Unknown auth method: {}", other)),
    }
}

fn try_config_token(config: &Config) -> Result<String> {
    match config.github.token.as_deref() {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(anyhow!("github.token is not set")),
    }
}

/// Try to get token from GitHub CLI
fn try_github_cli() -> Result<String> {
    debug!("Attempting GitHub CLI authentication");

    if !is_command_available("gh") {
        return Err(anyhow!("GitHub CLI (gh) is not installed"));
    }

    let token_output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("Failed to get GitHub CLI token")?;

    if !token_output.status.success() {
        return Err(anyhow!(
            "Failed to retrieve token from GitHub CLI: {}",
            String::from_utf8_lossy(&token_output.stderr)
        ));
    }

    let token = String::from_utf8(token_output.stdout)
        .context("GitHub CLI token is not valid UTF-8")?
        .trim()
        .to_string();

    if token.is_empty() {
        return Err(anyhow!("GitHub CLI returned empty token"));
    }

    debug!("Successfully obtained token from GitHub CLI");
    Ok(token)
}

/// Try to get token from environment variable
fn try_environment_token() -> Result<String> {
    debug!("Attempting environment variable authentication");

    let token = env::var("GITHUB_TOKEN").context("GITHUB_TOKEN environment variable not set")?;

    if token.is_empty() {
        return Err(anyhow!("GITHUB_TOKEN is empty"));
    }

    if !["ghp_", "gho_", "ghs_", "github_pat_"]
        .iter()
        .any(|prefix| token.starts_with(prefix))
    {
        warn!("GITHUB_TOKEN doesn't look like a GitHub token (expected ghp_, gho_, ghs_ or github_pat_ prefix)");
    }

    Ok(token)
}

/// Check if a command is available in PATH
fn is_command_available(command: &str) -> bool {
    Command::new("which")
        .arg(command)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
