//! Local repository list
//!
//! The list is a CSV file: a header row naming the columns, a documentation
//! row that is always skipped, then one row per repository.
//!
//! ```text
//! user,name,local_destination,local_repo_dir_name,do_pull
//! account,repository,parent directory,folder name,false to skip
//! alice,dotfiles,~/,.dotfiles,
//! ```

use anyhow::{anyhow, bail, Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::repo::{RepositoryRecord, RepositorySet};

/// Column positions found in the header row
struct Columns {
    user: usize,
    name: usize,
    local_destination: Option<usize>,
    local_repo_dir_name: Option<usize>,
    do_pull: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Result<Self> {
        let find = |column: &str| header.iter().position(|h| h == column);

        Ok(Self {
            user: find("user").ok_or_else(|| anyhow!("Header row has no 'user' column"))?,
            name: find("name").ok_or_else(|| anyhow!("Header row has no 'name' column"))?,
            local_destination: find("local_destination"),
            local_repo_dir_name: find("local_repo_dir_name"),
            do_pull: find("do_pull"),
        })
    }
}

/// `do_pull` is only off for a literal `false`, in any case
pub fn parse_do_pull(value: Option<&str>) -> bool {
    !matches!(value, Some(v) if v.eq_ignore_ascii_case("false"))
}

/// Read the repository list at `path`
pub fn read_repository_list(path: &Path) -> Result<RepositorySet> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to read repository list: {:?}", path))?;

    let repos = parse_repository_list(file)
        .with_context(|| format!("Failed to parse repository list: {:?}", path))?;

    debug!("Read {} repositories from {:?}", repos.len(), path);
    Ok(repos)
}

/// Parse a repository list from any reader
pub fn parse_repository_list<R: Read>(input: R) -> Result<RepositorySet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header = reader.headers().context("Failed to read header row")?.clone();
    if header.is_empty() {
        bail!("Missing header row");
    }
    let columns = Columns::from_header(&header)?;

    let mut rows = reader.records();

    // documentation row
    match rows.next() {
        Some(row) => {
            row.context("Failed to read documentation row")?;
        }
        None => bail!("Missing documentation row after the header"),
    }

    let mut repos = RepositorySet::new();

    for row in rows {
        let row = row.context("Malformed repository row")?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        // empty cells count as absent
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let user = cell(Some(columns.user))
            .ok_or_else(|| anyhow!("Row on line {} has an empty 'user'", line))?;
        let name = cell(Some(columns.name))
            .ok_or_else(|| anyhow!("Row on line {} has an empty 'name'", line))?;

        let record = RepositoryRecord {
            owner: user,
            name,
            clone_url: None,
            local_destination: cell(columns.local_destination),
            local_repo_dir_name: cell(columns.local_repo_dir_name),
            do_pull: Some(parse_do_pull(cell(columns.do_pull).as_deref())),
        };

        if repos.insert(record).is_some() {
            debug!("Line {} replaces an earlier row with the same key", line);
        }
    }

    Ok(repos)
}
