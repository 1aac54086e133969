//! Where quota records come from.
//!
//! A [`QuotaSource`] turns a uid and a filesystem entry into a populated
//! [`QuotaRecord`], grace state included. [`Sources`] picks the right one
//! for each entry and enforces the optional deadline.

mod fixture;
mod lustre;

use std::io;
use std::str::FromStr;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::FsEntry;
use crate::record::QuotaRecord;

pub use fixture::FixtureSource;
pub use lustre::LustreSource;

/// Host sentinel for a local Lustre mount.
pub const LUSTRE_HOST: &str = "lustre";

/// Host sentinel for the built-in fixtures.
pub const TEST_HOST: &str = "test";

/// The host field of a filesystem entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    Lustre,
    Test,
    Nfs(String),
}

impl Backend {
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::Lustre => LUSTRE_HOST,
            Self::Test => TEST_HOST,
            Self::Nfs(host) => host,
        }
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "" => Err(anyhow::anyhow!("empty host")),
            LUSTRE_HOST => Ok(Self::Lustre),
            TEST_HOST => Ok(Self::Test),
            host => Ok(Self::Nfs(host.into())),
        }
    }
}

/// Why a quota could not be retrieved.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no quota for uid {0}")]
    NoQuota(u32),

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0} quota lookups are not supported")]
    Unsupported(String),

    #[error("{0}")]
    Backend(String),

    #[error("parsing {what}: {line}")]
    Parse { what: &'static str, line: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("timeout")]
    TimedOut,
}

impl LookupError {
    /// Whether the remaining lookups must be abandoned.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Retrieves the quota of one user on one filesystem.
pub trait QuotaSource {
    /// Returns the usage, limits and grace state of `uid` on `entry`.
    ///
    /// Provenance fields of the returned record are filled in by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the quota could not be retrieved.
    fn query(&self, uid: u32, entry: &FsEntry) -> Result<QuotaRecord, LookupError>;
}

/// Remote NFS servers. Speaking rquota is out of scope, every lookup fails.
#[derive(Debug, Default)]
pub struct NfsSource;

impl QuotaSource for NfsSource {
    fn query(&self, _uid: u32, entry: &FsEntry) -> Result<QuotaRecord, LookupError> {
        Err(LookupError::Unsupported(format!(
            "nfs ({}:{})",
            entry.host(),
            entry.path()
        )))
    }
}

/// Optional point in time after which no further lookups are started.
#[derive(Clone, Copy, Debug, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
        }
    }

    #[must_use]
    pub const fn never() -> Self {
        Self { at: None }
    }

    /// # Errors
    ///
    /// Returns [`LookupError::TimedOut`] once the deadline has passed.
    pub fn check(&self) -> Result<(), LookupError> {
        match self.at {
            Some(at) if Instant::now() >= at => Err(LookupError::TimedOut),
            _ => Ok(()),
        }
    }
}

/// Dispatches lookups to the source matching each entry's backend.
pub struct Sources {
    lustre: Box<dyn QuotaSource>,
    test: Box<dyn QuotaSource>,
    nfs: Box<dyn QuotaSource>,
    deadline: Deadline,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            lustre: Box::new(LustreSource::default()),
            test: Box::new(FixtureSource),
            nfs: Box::new(NfsSource),
            deadline: Deadline::never(),
        }
    }
}

impl Sources {
    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Replaces the source used for NFS hosts.
    #[must_use]
    pub fn with_nfs(mut self, nfs: Box<dyn QuotaSource>) -> Self {
        self.nfs = nfs;
        self
    }

    /// Replaces the source used for Lustre mounts.
    #[must_use]
    pub fn with_lustre(mut self, lustre: Box<dyn QuotaSource>) -> Self {
        self.lustre = lustre;
        self
    }

    /// Looks up `uid` on `entry` and tags the result with the entry's
    /// provenance.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::TimedOut`] if the deadline passed before the
    /// lookup was started, or whatever the backend reports.
    pub fn get(&self, uid: u32, entry: &FsEntry) -> Result<QuotaRecord, LookupError> {
        self.deadline.check()?;

        let source = match entry.backend() {
            Backend::Lustre => &self.lustre,
            Backend::Test => &self.test,
            Backend::Nfs(_) => &self.nfs,
        };

        log::debug!("query uid {} on {} ({}:{})", uid, entry.label(), entry.host(), entry.path());

        let record = source.query(uid, entry)?.with_provenance(
            entry.label(),
            entry.host(),
            entry.path(),
            entry.thresh(),
        );

        Ok(record)
    }
}
