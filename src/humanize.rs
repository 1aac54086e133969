//! Byte and file counts as short, human readable strings.

const SUFFIXES: [&str; 7] = ["", "K", "M", "G", "T", "P", "E"];

/// Renders `n` with a binary magnitude suffix, e.g. `102400` as `100K`.
///
/// Values below 1024 are printed as plain integers. Scaled values below 10
/// keep one decimal unless it is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn size2str(n: u64) -> String {
    if n < 1024 {
        return n.to_string();
    }

    let mut value = n as f64;
    let mut unit = 0;

    while unit + 1 < SUFFIXES.len() && value.round() >= 1024.0 {
        value /= 1024.0;
        unit += 1;
    }

    let digits = if value < 9.95 {
        format!("{:.1}", value)
    } else {
        format!("{:.0}", value)
    };

    let digits = digits.strip_suffix(".0").unwrap_or(&digits);

    format!("{}{}", digits, SUFFIXES[unit])
}
