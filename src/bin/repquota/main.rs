#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use std::borrow::Borrow;
use std::io::{self, Write};

use anyhow::{Context, Result};

use fsquota::config::{self, Config, FsEntry};
use fsquota::record::sort_records;
use fsquota::report::USER_HEADER;
use fsquota::user;
use fsquota::{Deadline, QuotaRecord, Reporter, Sources, Units};

use cli::Arguments;

/// A user to report on.
struct Target {
    uid: u32,
    label: String,
    name: Option<String>,
}

/// A retrieved record and the label its row is printed under.
struct Row {
    label: String,
    record: QuotaRecord,
}

impl Borrow<QuotaRecord> for Row {
    fn borrow(&self) -> &QuotaRecord {
        &self.record
    }
}

fn main() -> Result<()> {
    let args = cli::args().with_context(|| "parsing CLI args")?;

    fsquota::init_logging(args.debug);

    let path = config::path_or_default(args.config.as_deref())?;
    let config = Config::load(path)?;

    let entry = config
        .by_label(&args.filesystem)
        .with_context(|| format!("{}: not found in {}", args.filesystem, path))?;

    let targets = targets(&args, entry)?;

    let deadline = args.timeout.map_or_else(Deadline::never, Deadline::after);
    let sources = Sources::default().with_deadline(deadline);

    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock(), Units::Human);

    match &args.table {
        Some(table) => reporter.line(&table.heading())?,
        None => reporter.line(USER_HEADER)?,
    }

    let mut rows = Vec::with_capacity(targets.len());

    for target in targets {
        let record = match sources.get(target.uid, entry) {
            Ok(record) => record,
            Err(e) if e.is_fatal() => fsquota::abort_on_timeout("repquota"),
            Err(e) => {
                fsquota::log_skipped(&target.label, &e);
                continue;
            }
        };

        let record = match target.name {
            Some(name) => record.with_name(name),
            None => record,
        };

        let row = Row {
            label: target.label,
            record,
        };

        if args.sort.is_some() {
            rows.push(row);
        } else {
            emit(&mut reporter, &args, &row)?;
        }
    }

    if let Some(key) = args.sort {
        sort_records(&mut rows, key, args.reverse);

        for row in &rows {
            emit(&mut reporter, &args, row)?;
        }
    }

    Ok(())
}

/// Users from the passwd database, or with `-s` the owners of the
/// filesystem's top level directories.
fn targets(args: &Arguments, entry: &FsEntry) -> Result<Vec<Target>> {
    if args.scan_dirs {
        let owners = user::dir_owners(entry.path())
            .with_context(|| format!("could not open {}", entry.path()))?;

        Ok(owners
            .into_iter()
            .map(|o| Target {
                uid: o.uid,
                name: o.resolved.then(|| o.label.clone()),
                label: o.label,
            })
            .collect())
    } else {
        Ok(user::all(args.min_uid)
            .into_iter()
            .map(|u| Target {
                uid: u.uid,
                label: u.name.clone(),
                name: Some(u.name),
            })
            .collect())
    }
}

fn emit<W: Write>(
    reporter: &mut Reporter<W>,
    args: &Arguments,
    row: &Row,
) -> io::Result<()> {
    match &args.table {
        Some(table) => reporter.line(&table.row(&row.record)),
        None => reporter.full(&row.label, &row.record),
    }
}
