//! Lustre quotas via `lfs quota`.

use std::process::Command;

use crate::config::FsEntry;
use crate::grace::{GraceTimer, QuotaState};
use crate::record::{QuotaRecord, ResourceUsage};

use super::{LookupError, QuotaSource};

/// Runs `lfs quota -q -u UID MOUNT` and parses its data row.
#[derive(Debug)]
pub struct LustreSource {
    program: String,
}

impl Default for LustreSource {
    fn default() -> Self {
        Self::new("lfs")
    }
}

impl LustreSource {
    /// Uses `program` instead of `lfs` from `PATH`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl QuotaSource for LustreSource {
    fn query(&self, uid: u32, entry: &FsEntry) -> Result<QuotaRecord, LookupError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["quota", "-q", "-u"])
            .arg(uid.to_string())
            .arg(entry.path());

        log::trace!("running: {:?}", cmd);

        let output = cmd.output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if stderr.contains("Permission denied")
                || stderr.contains("Operation not permitted")
            {
                return Err(LookupError::PermissionDenied);
            }

            return Err(LookupError::Backend(format!(
                "error running: {:?}: {}",
                cmd,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        parse_lfs_quota(uid, &stdout)
    }
}

/// Parses the quiet output of `lfs quota`:
///
/// ```text
///     /p/lscratch  102400*  92160  107520  6d23h59m57s  12  0  0  -
/// ```
///
/// Block counts are in KiB, a `*` marks a value over its limit. A long
/// mount point may push the numbers onto the next line.
fn parse_lfs_quota(uid: u32, s: &str) -> Result<QuotaRecord, LookupError> {
    let tokens = s.split_whitespace().collect::<Vec<_>>();

    if tokens.len() < 9 {
        return Err(LookupError::Parse {
            what: "lfs quota output",
            line: s.trim().into(),
        });
    }

    let kbytes = parse_count(tokens[1])?;
    let bsoft = parse_count(tokens[2])?;
    let bhard = parse_count(tokens[3])?;
    let btimer = parse_grace(tokens[4])?;
    let files = parse_count(tokens[5])?;
    let fsoft = parse_count(tokens[6])?;
    let fhard = parse_count(tokens[7])?;
    let ftimer = parse_grace(tokens[8])?;

    let (used, soft, hard) = (
        kbytes.saturating_mul(1024),
        bsoft.saturating_mul(1024),
        bhard.saturating_mul(1024),
    );

    let bytes = ResourceUsage::new(
        used,
        soft,
        hard,
        QuotaState::classify(used, soft, hard, btimer),
    );

    let files = ResourceUsage::new(
        files,
        fsoft,
        fhard,
        QuotaState::classify(files, fsoft, fhard, ftimer),
    );

    Ok(QuotaRecord::new(uid, bytes, files))
}

fn parse_count(token: &str) -> Result<u64, LookupError> {
    token
        .trim_end_matches('*')
        .parse::<u64>()
        .map_err(|_| LookupError::Parse {
            what: "lfs quota count",
            line: token.into(),
        })
}

/// `-` for no timer, `none` once it elapsed, otherwise e.g. `1w2d3h4m5s`.
fn parse_grace(token: &str) -> Result<GraceTimer, LookupError> {
    match token {
        "-" => return Ok(GraceTimer::Unset),
        "none" => return Ok(GraceTimer::Elapsed),
        _ => {}
    }

    let err = || LookupError::Parse {
        what: "lfs quota grace",
        line: token.into(),
    };

    let mut seconds = 0_u64;
    let mut digits = 0_u64;
    let mut seen_digit = false;

    for c in token.trim_matches(|c| c == '[' || c == ']').chars() {
        if let Some(d) = c.to_digit(10) {
            digits = digits
                .checked_mul(10)
                .and_then(|n| n.checked_add(u64::from(d)))
                .ok_or_else(err)?;
            seen_digit = true;
            continue;
        }

        let mult = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            'w' => 7 * 24 * 60 * 60,
            _ => return Err(err()),
        };

        if !seen_digit {
            return Err(err());
        }

        seconds = digits
            .checked_mul(mult)
            .and_then(|n| n.checked_add(seconds))
            .ok_or_else(err)?;
        digits = 0;
        seen_digit = false;
    }

    if seen_digit {
        return Err(err());
    }

    Ok(GraceTimer::Remaining(seconds))
}
