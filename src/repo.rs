//! Repository records and the merged repository set
//!
//! Records come from two places: rows of the local repository list and the
//! remote account listing. Both are keyed by `owner/name` and combined with
//! [`merge`], where the remote side wins for every field it carries.

use indexmap::IndexMap;

/// One repository to manage
///
/// Optional fields are `None` when the source did not provide them; defaults
/// are applied when the record is synced, not when it is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepositoryRecord {
    /// Owner/organization name
    pub owner: String,

    /// Repository name
    pub name: String,

    /// SSH clone URL (`sshUrl` in the GitHub API)
    pub clone_url: Option<String>,

    /// Parent directory the repository lives in
    pub local_destination: Option<String>,

    /// Folder name on disk
    pub local_repo_dir_name: Option<String>,

    /// Whether the repository should be synced at all
    pub do_pull: Option<bool>,
}

impl RepositoryRecord {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_clone_url(mut self, url: impl Into<String>) -> Self {
        self.clone_url = Some(url.into());
        self
    }

    /// Key of this record in a [`RepositorySet`]
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Missing `do_pull` means the repository is synced
    pub fn should_pull(&self) -> bool {
        self.do_pull.unwrap_or(true)
    }

    /// Folder name on disk, falling back to the repository name
    pub fn dir_name(&self) -> &str {
        self.local_repo_dir_name.as_deref().unwrap_or(&self.name)
    }

    /// Parent directory, falling back to `default` (unexpanded)
    pub fn destination<'a>(&'a self, default: &'a str) -> &'a str {
        self.local_destination.as_deref().unwrap_or(default)
    }

    /// Overwrite this record with every field `other` carries.
    ///
    /// Fields that are `None` in `other` keep their current value, so local
    /// overrides like `do_pull` or a custom destination survive a merge with
    /// a remote record that only knows the name and clone URL.
    pub fn merge_from(&mut self, other: &RepositoryRecord) {
        self.owner.clone_from(&other.owner);
        self.name.clone_from(&other.name);

        if other.clone_url.is_some() {
            self.clone_url.clone_from(&other.clone_url);
        }
        if other.local_destination.is_some() {
            self.local_destination.clone_from(&other.local_destination);
        }
        if other.local_repo_dir_name.is_some() {
            self.local_repo_dir_name.clone_from(&other.local_repo_dir_name);
        }
        if other.do_pull.is_some() {
            self.do_pull = other.do_pull;
        }
    }
}

/// Repository records keyed by `owner/name`, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySet {
    records: IndexMap<String, RepositoryRecord>,
}

impl RepositorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its key.
    ///
    /// An existing record with the same key is replaced in place and keeps
    /// its position.
    pub fn insert(&mut self, record: RepositoryRecord) -> Option<RepositoryRecord> {
        self.records.insert(record.key(), record)
    }

    pub fn get(&self, key: &str) -> Option<&RepositoryRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepositoryRecord)> {
        self.records.iter().map(|(key, record)| (key.as_str(), record))
    }
}

impl FromIterator<RepositoryRecord> for RepositorySet {
    fn from_iter<I: IntoIterator<Item = RepositoryRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Combine the local repository list with the remote listing.
///
/// Keys only one side knows are copied as they are. For keys on both sides
/// the local record is updated field by field from the remote one (remote
/// wins). Local keys keep their order, remote-only keys follow in listing
/// order.
pub fn merge(local: RepositorySet, remote: &RepositorySet) -> RepositorySet {
    let mut merged = local;

    for (key, remote_record) in remote.iter() {
        match merged.records.get_mut(key) {
            Some(record) => record.merge_from(remote_record),
            None => {
                merged.records.insert(key.to_string(), remote_record.clone());
            }
        }
    }

    merged
}
