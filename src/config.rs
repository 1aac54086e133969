//! The `quota.conf` filesystem table.
//!
//! Each non-comment line reads `label:host:path[:thresh]`. The host is
//! either a remote NFS server, `lustre` for a local Lustre mount, or `test`
//! for the built-in fixtures.

use std::path::{Component, Path};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::source::Backend;

/// Used when neither `-f` nor `QUOTA_CONF` name a file.
pub const DEFAULT_PATH: &str = "/etc/quota.conf";

/// One filesystem from the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FsEntry {
    label: String,
    backend: Backend,
    path: String,
    thresh: u32,
}

impl FsEntry {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.backend.host()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Warning threshold in percent of the hard limit, 0 if disabled.
    #[must_use]
    pub const fn thresh(&self) -> u32 {
        self.thresh
    }
}

impl FromStr for FsEntry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.trim_end_matches(['\n', '\r']).splitn(4, ':');

        let mut next = |what: &str| {
            fields
                .next()
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .with_context(|| format!("missing {} field", what))
        };

        let label = next("label")?.into();
        let backend = next("host")?.parse()?;
        let path = next("path")?.into();

        let thresh = match next("thresh") {
            Ok(token) => token.parse::<u32>().with_context(|| {
                format!("parsing thresh token {} to u32", token)
            })?,
            Err(_) => 0,
        };

        Ok(Self {
            label,
            backend,
            path,
            thresh,
        })
    }
}

/// The whole filesystem table, in file order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Config {
    entries: Vec<FsEntry>,
}

impl Config {
    /// Reads and parses the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any line fails to
    /// parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        log::debug!("loaded {}", path.display());

        content
            .parse()
            .with_context(|| format!("parsing {}", path.display()))
    }

    #[must_use]
    pub fn entries(&self) -> &[FsEntry] {
        &self.entries
    }

    /// The entry with exactly this label.
    #[must_use]
    pub fn by_label(&self, label: &str) -> Option<&FsEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// The entry whose label is the longest path prefix of `dir`, e.g. the
    /// filesystem holding a home directory.
    #[must_use]
    pub fn by_dir(&self, dir: impl AsRef<Path>) -> Option<&FsEntry> {
        let dir = dir.as_ref();

        self.entries
            .iter()
            .filter(|e| match_path(dir, &e.label))
            .max_by_key(|e| Path::new(&e.label).components().count())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut entries = Vec::with_capacity(8);

        for (n, line) in s.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default();

            if line.trim().is_empty() {
                continue;
            }

            let entry = line
                .parse()
                .with_context(|| format!("line {}: {}", n + 1, line))?;

            entries.push(entry);
        }

        Ok(Self { entries })
    }
}

/// Whether `label` names `dir` or one of its parents. Only whole path
/// components match, so `/home` does not match `/homes/bob`.
#[must_use]
pub fn match_path(dir: &Path, label: &str) -> bool {
    fn normal(p: &Path) -> Vec<Component<'_>> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    let label = Path::new(label);

    if !label.has_root() {
        return false;
    }

    let dir = normal(dir);
    let label = normal(label);

    dir.len() >= label.len() && dir[..label.len()] == label[..]
}

/// Resolves the config path from an explicit option.
///
/// # Errors
///
/// Returns an error if the explicit path is empty.
pub fn path_or_default(path: Option<&str>) -> Result<&str> {
    match path {
        Some("") => Err(anyhow!("empty config file path")),
        Some(path) => Ok(path),
        None => Ok(DEFAULT_PATH),
    }
}
