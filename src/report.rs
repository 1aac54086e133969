//! Rendering of quota records.
//!
//! Every report mode goes through the functions in this module, so the
//! meaning of a [`QuotaState`] is decided in exactly one place. The column
//! layout is fixed, scripts parse it.

use std::io::{self, Write};

use crate::grace::{fmt_days, over_thresh, QuotaState, GRACE_PLACEHOLDER};
use crate::humanize::size2str;
use crate::record::{QuotaRecord, ResourceUsage};

/// Header of the single-user, multi-filesystem report.
pub const FILESYSTEM_HEADER: &str =
    "Filesystem     used   quota  limit    timeleft  files  quota  limit    timeleft";

/// Header of the multi-user, single-filesystem report.
pub const USER_HEADER: &str =
    "User           used   quota  limit    timeleft  files  quota  limit    timeleft";

/// Printed after warning-only output that produced at least one warning.
pub const SUGGESTION: &str = "Run quota -v for more detailed information.";

/// Warning prefix of the verbose and batch reports.
pub const VERBOSE_PREFIX: &str = "*** ";

const LABEL_WIDTH: usize = 15;

/// How counts are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Units {
    /// Magnitude suffixed, e.g. `100K`.
    #[default]
    Human,
    /// Plain integers.
    Raw,
}

impl Units {
    #[must_use]
    pub fn format(self, n: u64) -> String {
        match self {
            Self::Human => size2str(n),
            Self::Raw => n.to_string(),
        }
    }
}

struct Columns {
    used: String,
    soft: String,
    hard: String,
    timeleft: String,
}

impl Columns {
    fn of(usage: &ResourceUsage, units: Units) -> Self {
        let used = units.format(usage.used());

        if usage.state() == QuotaState::None {
            Self {
                used,
                soft: "n/a".into(),
                hard: "n/a".into(),
                timeleft: String::new(),
            }
        } else {
            Self {
                used,
                soft: units.format(usage.soft_limit()),
                hard: units.format(usage.hard_limit()),
                timeleft: usage.state().timeleft(),
            }
        }
    }
}

/// Renders the full report row for `record` under `label`.
///
/// The returned string has no trailing newline. A label longer than 14
/// characters is followed by a line break so the numeric columns stay
/// aligned with the header.
#[must_use]
pub fn usage_line(label: &str, record: &QuotaRecord, units: Units) -> String {
    let mut line = format!("{:<width$}", label, width = LABEL_WIDTH);

    if label.chars().count() > LABEL_WIDTH - 1 {
        line.push('\n');
        line.push_str(&" ".repeat(LABEL_WIDTH));
    }

    let b = Columns::of(record.bytes(), units);
    let f = Columns::of(record.files(), units);

    line.push_str(&format!(
        "{:<7}{:<7}{:<9}{:<10}",
        b.used, b.soft, b.hard, b.timeleft
    ));
    line.push_str(&format!(
        "{:<7}{:<7}{:<9}{}",
        f.used, f.soft, f.hard, f.timeleft
    ));

    line
}

/// Warning lines for the byte and file resources of `record`, in that
/// order.
///
/// Yields zero, one or two lines. The threshold check applies to bytes
/// only.
#[must_use]
pub fn warning_lines(
    prefix: &str,
    label: &str,
    record: &QuotaRecord,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);

    let bytes = record.bytes();
    let over = || size2str(bytes.overage());

    match bytes.state() {
        QuotaState::None => {}
        QuotaState::Under => {
            if over_thresh(bytes.used(), bytes.hard_limit(), record.thresh()) {
                lines.push(format!(
                    "{}Block usage on {} has exceeded {}% of quota.",
                    prefix,
                    label,
                    record.thresh()
                ));
            }
        }
        QuotaState::NotStarted => lines.push(format!(
            "{}Over block quota on {}, remove {} within {}.",
            prefix,
            label,
            over(),
            GRACE_PLACEHOLDER
        )),
        QuotaState::Started { seconds_remaining } => lines.push(format!(
            "{}Over block quota on {}, remove {} within {} days.",
            prefix,
            label,
            over(),
            fmt_days(seconds_remaining)
        )),
        QuotaState::Expired => lines.push(format!(
            "{}Over block quota on {}, time limit expired.",
            prefix, label
        )),
    }

    let files = record.files();
    let over = || size2str(files.overage());

    match files.state() {
        QuotaState::None | QuotaState::Under => {}
        QuotaState::NotStarted => lines.push(format!(
            "{}Over file quota on {}, remove {} files within {}.",
            prefix,
            label,
            over(),
            GRACE_PLACEHOLDER
        )),
        QuotaState::Started { seconds_remaining } => lines.push(format!(
            "{}Over file quota on {}, remove {} files within {} days.",
            prefix,
            label,
            over(),
            fmt_days(seconds_remaining)
        )),
        QuotaState::Expired => lines.push(format!(
            "{}Over file quota on {}, time limit expired",
            prefix, label
        )),
    }

    lines
}

/// Label of the filesystem as `host:path`, or just the path for local
/// Lustre mounts.
#[must_use]
pub fn remote_label(record: &QuotaRecord) -> String {
    if record.host() == crate::source::LUSTRE_HOST {
        record.path().into()
    } else {
        format!("{}:{}", record.host(), record.path())
    }
}

/// Writes report rows and warnings to an output sink.
pub struct Reporter<W> {
    out: W,
    units: Units,
    warnings: usize,
}

impl<W: Write> Reporter<W> {
    pub const fn new(out: W, units: Units) -> Self {
        Self {
            out,
            units,
            warnings: 0,
        }
    }

    /// Full row followed by `*** ` prefixed warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn full(&mut self, label: &str, record: &QuotaRecord) -> io::Result<()> {
        writeln!(self.out, "{}", usage_line(label, record, self.units))?;
        self.warn(VERBOSE_PREFIX, label, record)?;
        Ok(())
    }

    /// Writes the warnings of `record` and returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn warn(
        &mut self,
        prefix: &str,
        label: &str,
        record: &QuotaRecord,
    ) -> io::Result<usize> {
        let lines = warning_lines(prefix, label, record);

        for line in &lines {
            writeln!(self.out, "{}", line)?;
        }

        self.warnings += lines.len();
        Ok(lines.len())
    }

    /// Writes a bare line, e.g. a header.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)
    }

    /// Writes the `quota -v` suggestion if any warning was written so far.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn suggest(&mut self) -> io::Result<()> {
        if self.warnings > 0 {
            writeln!(self.out, "{}", SUGGESTION)?;
        }
        Ok(())
    }

    /// Total number of warnings written.
    pub const fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Column selection of the batch summary table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub units: Units,
    pub usage_only: bool,
    /// Divisor for raw byte columns.
    pub block_size: u64,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            units: Units::Raw,
            usage_only: false,
            block_size: 1,
        }
    }
}

impl Summary {
    #[must_use]
    pub fn heading(&self) -> String {
        if self.usage_only {
            format!("{:<10} {:<11} {:<12}", "User", "Space-used", "Files-used")
        } else {
            format!(
                "{:<10} {:<11} {:<11} {:<11} {:<12} {:<12} {:<12}",
                "User",
                "Space-used",
                "Space-soft",
                "Space-hard",
                "Files-used",
                "Files-soft",
                "Files-hard"
            )
        }
    }

    #[must_use]
    pub fn row(&self, record: &QuotaRecord) -> String {
        let bytes = |n: u64| match self.units {
            Units::Human => size2str(n),
            Units::Raw => (n / self.block_size.max(1)).to_string(),
        };

        let b = record.bytes();
        let f = record.files();

        if self.usage_only {
            format!(
                "{:<10} {:<11} {:<12}",
                record.user_label(),
                bytes(b.used()),
                f.used()
            )
        } else {
            format!(
                "{:<10} {:<11} {:<11} {:<11} {:<12} {:<12} {:<12}",
                record.user_label(),
                bytes(b.used()),
                bytes(b.soft_limit()),
                bytes(b.hard_limit()),
                f.used(),
                f.soft_limit(),
                f.hard_limit()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KB: u64 = 1024;

    fn started(days: u64) -> QuotaState {
        QuotaState::Started {
            seconds_remaining: days * 24 * 60 * 60,
        }
    }

    fn over_block() -> QuotaRecord {
        QuotaRecord::new(
            105,
            ResourceUsage::new(100 * KB, 90 * KB, 105 * KB, started(3)),
            ResourceUsage::unlimited(0),
        )
    }

    fn unlimited() -> QuotaRecord {
        QuotaRecord::new(
            100,
            ResourceUsage::unlimited(KB * KB),
            ResourceUsage::unlimited(455_555),
        )
    }

    #[test]
    fn usage_line_started() {
        let line = usage_line("home", &over_block(), Units::Human);

        assert_eq!(
            line,
            concat!(
                "home           ",
                "100K   90K    105K     3.0 days  ",
                "0      n/a    n/a      ",
            )
        );
    }

    #[test]
    fn usage_line_unlimited() {
        let line = usage_line("home", &unlimited(), Units::Human);

        assert_eq!(line.matches("n/a").count(), 4);
        assert_eq!(
            line,
            concat!(
                "home           ",
                "1M     n/a    n/a                ",
                "445K   n/a    n/a      ",
            )
        );
        assert!(warning_lines(VERBOSE_PREFIX, "home", &unlimited()).is_empty());
    }

    #[test]
    fn usage_line_raw() {
        let line = usage_line("home", &over_block(), Units::Raw);

        assert_eq!(
            line,
            concat!(
                "home           ",
                "102400 92160  107520   3.0 days  ",
                "0      n/a    n/a      ",
            )
        );
    }

    #[test]
    fn usage_line_long_label() {
        let short = usage_line("fourteen-chars", &unlimited(), Units::Human);
        assert_eq!(short.matches('\n').count(), 0);

        let long = usage_line("fifteen-chars!!", &unlimited(), Units::Human);
        assert_eq!(long.matches('\n').count(), 1);

        let (first, second) = long.split_once('\n').unwrap();
        assert_eq!(first, "fifteen-chars!!");
        assert!(second.starts_with(&" ".repeat(15)));
        assert_eq!(&second[15..], &short[15..]);
    }

    #[test]
    fn warning_started() {
        let lines = warning_lines(VERBOSE_PREFIX, "home", &over_block());

        assert_eq!(
            lines,
            ["*** Over block quota on home, remove 10K within 3.0 days."]
        );
    }

    #[test]
    fn warning_not_started() {
        let record = QuotaRecord::new(
            106,
            ResourceUsage::unlimited(0),
            ResourceUsage::new(100 * KB, 90 * KB, 105 * KB, QuotaState::NotStarted),
        );

        assert_eq!(
            warning_lines("", "home", &record),
            ["Over file quota on home, remove 10K files within [7 days]."]
        );
    }

    #[test]
    fn warning_expired_both() {
        let record = QuotaRecord::new(
            1,
            ResourceUsage::new(KB * KB * KB, KB * KB, KB * KB, QuotaState::Expired),
            ResourceUsage::new(455_555, 1024, 1024, QuotaState::Expired),
        );

        assert_eq!(
            warning_lines("", "scratch", &record),
            [
                "Over block quota on scratch, time limit expired.",
                "Over file quota on scratch, time limit expired",
            ]
        );
    }

    #[test]
    fn warning_thresh() {
        let usage =
            ResourceUsage::new(100 * KB, 105 * KB, 105 * KB, QuotaState::Under);

        let record = QuotaRecord::new(104, usage, ResourceUsage::unlimited(0))
            .with_provenance("home", "test", "/home", 90);
        assert_eq!(
            warning_lines("", "home", &record),
            ["Block usage on home has exceeded 90% of quota."]
        );

        let record = QuotaRecord::new(104, usage, ResourceUsage::unlimited(0))
            .with_provenance("home", "test", "/home", 0);
        assert!(warning_lines("", "home", &record).is_empty());

        let record = QuotaRecord::new(104, usage, ResourceUsage::unlimited(0))
            .with_provenance("home", "test", "/home", 99);
        assert!(warning_lines("", "home", &record).is_empty());
    }

    #[test]
    fn warning_files_ignore_thresh() {
        let record = QuotaRecord::new(
            1,
            ResourceUsage::unlimited(0),
            ResourceUsage::new(99, 100, 100, QuotaState::Under),
        )
        .with_provenance("home", "test", "/home", 50);

        assert!(warning_lines("", "home", &record).is_empty());
    }

    #[test]
    fn reporter_counts() {
        let mut reporter = Reporter::new(Vec::new(), Units::Human);

        assert_eq!(reporter.warn("", "a", &unlimited()).unwrap(), 0);
        reporter.suggest().unwrap();
        assert!(reporter.into_inner().is_empty());

        let mut reporter = Reporter::new(Vec::new(), Units::Human);
        assert_eq!(reporter.warn("", "a", &over_block()).unwrap(), 1);
        assert_eq!(reporter.warn("", "b", &over_block()).unwrap(), 1);
        reporter.suggest().unwrap();
        assert_eq!(reporter.warnings(), 2);

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            out,
            concat!(
                "Over block quota on a, remove 10K within 3.0 days.\n",
                "Over block quota on b, remove 10K within 3.0 days.\n",
                "Run quota -v for more detailed information.\n",
            )
        );
    }

    #[test]
    fn reporter_full() {
        let mut reporter = Reporter::new(Vec::new(), Units::Human);
        reporter.line(FILESYSTEM_HEADER).unwrap();
        reporter.full("home", &over_block()).unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let lines = out.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], FILESYSTEM_HEADER);
        assert!(lines[1].starts_with("home           100K   90K    105K"));
        assert_eq!(
            lines[2],
            "*** Over block quota on home, remove 10K within 3.0 days."
        );
    }

    #[test]
    fn remote() {
        let record = unlimited().with_provenance("home", "nfs1", "/export/home", 0);
        assert_eq!(remote_label(&record), "nfs1:/export/home");

        let record = unlimited().with_provenance("lfs", "lustre", "/p/lustre1", 0);
        assert_eq!(remote_label(&record), "/p/lustre1");
    }

    #[test]
    fn summary() {
        let record = over_block().with_name("alice");

        let table = Summary::default();
        assert_eq!(
            table.heading(),
            "User       Space-used  Space-soft  Space-hard  Files-used   Files-soft   Files-hard  "
        );
        assert_eq!(
            table.row(&record),
            "alice      102400      92160       107520      0            0            0           "
        );

        let table = Summary {
            units: Units::Raw,
            usage_only: true,
            block_size: 1024,
        };
        assert_eq!(table.heading(), "User       Space-used  Files-used  ");
        assert_eq!(table.row(&over_block()), "105        100         0           ");

        let table = Summary {
            units: Units::Human,
            ..Summary::default()
        };
        assert!(table.row(&record).starts_with("alice      100K        90K         105K"));
    }
}
