//! Grace-period lifecycle of a single quota resource.

/// Seconds per day, used for all time-remaining conversions.
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Shown while the backing store has not started the grace timer yet.
pub const GRACE_PLACEHOLDER: &str = "[7 days]";

/// The lifecycle state of one resource (bytes or files).
///
/// The remaining grace time only exists while the timer is running, so it is
/// carried by [`QuotaState::Started`] alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaState {
    /// No soft or hard limit is configured.
    None,
    /// Usage is within the soft limit.
    Under,
    /// Over the soft limit, the grace timer has not been recorded yet.
    NotStarted,
    /// Over the soft limit, grace timer running.
    Started { seconds_remaining: u64 },
    /// Over the soft limit and the grace period has elapsed.
    Expired,
}

/// Grace timer as reported by a backing store that only hands out raw
/// numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraceTimer {
    Unset,
    Remaining(u64),
    Elapsed,
}

impl QuotaState {
    /// Derives the state from usage, limits and the backing store's timer.
    ///
    /// A hard-only quota uses the hard limit as the point where the grace
    /// period begins.
    #[must_use]
    pub const fn classify(
        used: u64,
        soft_limit: u64,
        hard_limit: u64,
        timer: GraceTimer,
    ) -> Self {
        if soft_limit == 0 && hard_limit == 0 {
            return Self::None;
        }

        let threshold = if soft_limit == 0 { hard_limit } else { soft_limit };

        if used < threshold {
            return Self::Under;
        }

        match timer {
            GraceTimer::Unset => Self::NotStarted,
            GraceTimer::Remaining(0) | GraceTimer::Elapsed => Self::Expired,
            GraceTimer::Remaining(seconds_remaining) => {
                Self::Started { seconds_remaining }
            }
        }
    }

    /// The `timeleft` column of the full report.
    #[must_use]
    pub fn timeleft(&self) -> String {
        match self {
            Self::None | Self::Under => String::new(),
            Self::NotStarted => GRACE_PLACEHOLDER.into(),
            Self::Started { seconds_remaining } => {
                let days = fmt_days(*seconds_remaining);
                let plural = days.parse::<f32>().map_or(true, |d| d > 1.0);
                format!("{} day{}", days, if plural { "s" } else { "" })
            }
            Self::Expired => "expired".into(),
        }
    }
}

/// Formats seconds as fractional days with one decimal place.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fmt_days(seconds: u64) -> String {
    let days = seconds as f32 / SECONDS_PER_DAY as f32;
    format!("{:.1}", days)
}

/// True when a configured threshold percentage of the hard limit has been
/// reached.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn over_thresh(used: u64, hard_limit: u64, thresh: u32) -> bool {
    thresh != 0 && used as f64 >= hard_limit as f64 * (f64::from(thresh) / 100.0)
}
