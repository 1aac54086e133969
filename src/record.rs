//! Per-user, per-filesystem quota snapshots.

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::grace::QuotaState;

/// Usage and limits of one resource, either bytes or files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceUsage {
    used: u64,
    soft_limit: u64,
    hard_limit: u64,
    state: QuotaState,
}

impl ResourceUsage {
    #[must_use]
    pub const fn new(
        used: u64,
        soft_limit: u64,
        hard_limit: u64,
        state: QuotaState,
    ) -> Self {
        Self {
            used,
            soft_limit,
            hard_limit,
            state,
        }
    }

    /// Usage without any limits configured.
    #[must_use]
    pub const fn unlimited(used: u64) -> Self {
        Self::new(used, 0, 0, QuotaState::None)
    }

    #[must_use]
    pub const fn used(&self) -> u64 {
        self.used
    }

    #[must_use]
    pub const fn soft_limit(&self) -> u64 {
        self.soft_limit
    }

    #[must_use]
    pub const fn hard_limit(&self) -> u64 {
        self.hard_limit
    }

    #[must_use]
    pub const fn state(&self) -> QuotaState {
        self.state
    }

    /// How far usage exceeds the soft limit, or the hard limit when no soft
    /// limit is set.
    #[must_use]
    pub const fn overage(&self) -> u64 {
        let limit = if self.soft_limit == 0 {
            self.hard_limit
        } else {
            self.soft_limit
        };

        self.used.saturating_sub(limit)
    }
}

impl Default for ResourceUsage {
    fn default() -> Self {
        Self::unlimited(0)
    }
}

/// One quota query result for a user on a filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaRecord {
    uid: u32,
    name: Option<String>,
    label: String,
    host: String,
    path: String,
    thresh: u32,
    bytes: ResourceUsage,
    files: ResourceUsage,
}

impl QuotaRecord {
    #[must_use]
    pub fn new(uid: u32, bytes: ResourceUsage, files: ResourceUsage) -> Self {
        Self {
            uid,
            name: None,
            label: String::new(),
            host: String::new(),
            path: String::new(),
            thresh: 0,
            bytes,
            files,
        }
    }

    /// Attaches where the record was queried from.
    #[must_use]
    pub fn with_provenance(
        mut self,
        label: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        thresh: u32,
    ) -> Self {
        self.label = label.into();
        self.host = host.into();
        self.path = path.into();
        self.thresh = thresh;
        self
    }

    /// Attaches the resolved user name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn thresh(&self) -> u32 {
        self.thresh
    }

    #[must_use]
    pub const fn bytes(&self) -> &ResourceUsage {
        &self.bytes
    }

    #[must_use]
    pub const fn files(&self) -> &ResourceUsage {
        &self.files
    }

    /// User name, or the numeric uid when the name is unknown.
    #[must_use]
    pub fn user_label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.uid.to_string())
    }
}

/// Ordering for batch reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Uid,
    Bytes,
    Files,
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "uid" => Ok(Self::Uid),
            "bytes" | "space" => Ok(Self::Bytes),
            "files" => Ok(Self::Files),
            _ => Err(anyhow::anyhow!("unknown sort key: {}", s)),
        }
    }
}

impl SortKey {
    #[must_use]
    pub fn compare(self, x: &QuotaRecord, y: &QuotaRecord) -> Ordering {
        match self {
            Self::Uid => x.uid.cmp(&y.uid),
            Self::Bytes => x.bytes.used.cmp(&y.bytes.used),
            Self::Files => x.files.used.cmp(&y.files.used),
        }
    }
}

/// Sorts records, or rows holding records, in place. Equal keys keep
/// their enumeration order.
pub fn sort_records<T>(records: &mut [T], key: SortKey, reverse: bool)
where
    T: Borrow<QuotaRecord>,
{
    records.sort_by(|x, y| {
        let x: &QuotaRecord = x.borrow();
        let y: &QuotaRecord = y.borrow();

        if reverse {
            key.compare(y, x)
        } else {
            key.compare(x, y)
        }
    });
}
