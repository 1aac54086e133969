#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

//! Per-user quota reporting for NFS and Lustre backed filesystems.
//!
//! A [`QuotaRecord`] is retrieved from a [`source::QuotaSource`], already
//! carrying the grace state of its byte and file resources, and rendered by
//! the [`report`] module. Both the `quota` and `repquota` binaries go
//! through the same formatter.

pub mod config;
pub mod grace;
pub mod humanize;
pub mod record;
pub mod report;
pub mod source;
pub mod user;

pub use config::{Config, FsEntry};
pub use grace::{GraceTimer, QuotaState};
pub use record::{QuotaRecord, ResourceUsage, SortKey};
pub use report::{Reporter, Summary, Units};
pub use source::{Deadline, LookupError, Sources};

/// Exits with the message and status of an elapsed `-t` deadline.
pub fn abort_on_timeout(prog: &str) -> ! {
    eprintln!("{}: timeout, aborting", prog);
    std::process::exit(1)
}

/// Logs a lookup that is skipped. Users without any quota are expected in
/// batch reports and only show up at debug level.
pub fn log_skipped(label: &str, err: &LookupError) {
    match err {
        LookupError::NoQuota(_) => log::debug!("{}: {}", label, err),
        _ => log::warn!("{}: {}", label, err),
    }
}

/// Initialises logging to stderr. `debug` counts the `-d` flags given;
/// `RUST_LOG` takes precedence.
pub fn init_logging(debug: u64) {
    let level = match debug {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    )
    .format_timestamp(None)
    .init();
}
