#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use std::io;

use anyhow::{Context, Result};

use fsquota::config::{self, Config, FsEntry};
use fsquota::report::{remote_label, FILESYSTEM_HEADER};
use fsquota::user::{self, User};
use fsquota::{Deadline, Reporter, Sources, Units};

use cli::Arguments;

fn main() -> Result<()> {
    let args = cli::args().with_context(|| "parsing CLI args")?;

    fsquota::init_logging(args.debug);

    let (uid, user) = user::resolve_uid(args.user.as_deref()).with_context(|| {
        match &args.user {
            Some(name) => format!("no such user: {}", name),
            None => "no such user".into(),
        }
    })?;

    let name = user.as_ref().map_or_else(|| uid.to_string(), |u| u.name.clone());

    let path = config::path_or_default(args.config.as_deref())?;
    let config = Config::load(path)?;

    let entries = filesystems(&args, &config, user.as_ref());

    let deadline = args.timeout.map_or_else(Deadline::never, Deadline::after);
    let sources = Sources::default().with_deadline(deadline);

    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock(), Units::Human);

    if args.verbose {
        reporter.line(&format!("Disk quotas for {}:", name))?;
        reporter.line(FILESYSTEM_HEADER)?;
    }

    for entry in entries {
        let record = match sources.get(uid, entry) {
            Ok(record) => match &user {
                Some(user) => record.with_name(&user.name),
                None => record,
            },
            Err(e) if e.is_fatal() => fsquota::abort_on_timeout("quota"),
            Err(e) => {
                fsquota::log_skipped(entry.label(), &e);
                continue;
            }
        };

        let label = if args.remote_labels {
            remote_label(&record)
        } else {
            entry.label().into()
        };

        if args.verbose {
            reporter.full(&label, &record)?;
        } else {
            reporter.warn("", &label, &record)?;
        }
    }

    if !args.verbose {
        reporter.suggest()?;
    }

    Ok(())
}

/// All configured filesystems, or with `-l` only the one holding the
/// user's home directory.
fn filesystems<'a>(
    args: &Arguments,
    config: &'a Config,
    user: Option<&User>,
) -> Vec<&'a FsEntry> {
    if args.home_only {
        let entry = user.and_then(|u| config.by_dir(&u.dir));

        if entry.is_none() {
            log::debug!("no filesystem holds the home directory");
        }

        entry.into_iter().collect()
    } else {
        config.entries().iter().collect()
    }
}
