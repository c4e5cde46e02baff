//! Timestamp and duration text helpers.
//!
//! Timestamps use one text profile everywhere: RFC3339 with a numeric offset
//! (or `Z` for UTC) at seconds precision, e.g. `1979-09-24T05:35:00Z`.
//! Durations are written as a sequence of decimal numbers with unit
//! suffixes, e.g. `1h2m3.5s`, `250ms` or `-1.5µs`.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// The epoch-zero sentinel returned when a value can't be read as a timestamp.
pub fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

/// Converts whole seconds since the epoch into a UTC timestamp.
///
/// Seconds outside the representable range resolve to [`epoch`].
pub fn from_unix_seconds(secs: i64) -> DateTime<FixedOffset> {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.fixed_offset())
        .unwrap_or_else(epoch)
}

pub fn format_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}

/// Formats a duration as `[-]XhYmZ.Fs`, dropping leading zero units.
///
/// Durations under one second use the largest of `ms`, `µs` or `ns` that
/// keeps the integer part nonzero. Fractions are written without trailing
/// zeros, and the zero duration is `0s`.
///
/// ```
/// use chrono::TimeDelta;
/// use sovran_valuemap::time::format_duration;
///
/// assert_eq!(format_duration(TimeDelta::milliseconds(3_723_500)), "1h2m3.5s");
/// assert_eq!(format_duration(TimeDelta::microseconds(1_500)), "1.5ms");
/// assert_eq!(format_duration(TimeDelta::zero()), "0s");
/// ```
pub fn format_duration(d: TimeDelta) -> String {
    let total = i128::from(d.num_seconds()) * NANOS_PER_SEC as i128 + i128::from(d.subsec_nanos());
    if total == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if total < 0 {
        out.push('-');
    }
    let nanos = total.unsigned_abs();

    if nanos < NANOS_PER_SEC {
        let (scale, unit) = if nanos < 1_000 {
            (0, "ns")
        } else if nanos < 1_000_000 {
            (3, "µs")
        } else {
            (6, "ms")
        };
        out.push_str(&format_fraction(nanos, scale));
        out.push_str(unit);
        return out;
    }

    let secs = nanos / NANOS_PER_SEC;
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    if hours > 0 {
        out.push_str(&format!("{hours}h{minutes}m"));
    } else if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    let seconds = (secs % 60) * NANOS_PER_SEC + nanos % NANOS_PER_SEC;
    out.push_str(&format_fraction(seconds, 9));
    out.push('s');
    out
}

/// Writes `value / 10^scale` with the fractional part's trailing zeros trimmed.
fn format_fraction(value: u128, scale: u32) -> String {
    let divisor = 10u128.pow(scale);
    let whole = value / divisor;
    let frac = value % divisor;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = scale as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parses text written by [`format_duration`], or any sequence of
/// `<decimal><unit>` components with units `ns`, `us`, `µs`, `ms`, `s`,
/// `m` and `h`, optionally signed. A bare `0` is the zero duration.
///
/// Returns `None` for malformed text or a total that doesn't fit in
/// `i64` nanoseconds.
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, after_int) = rest.split_at(int_end);

        let (frac_digits, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_end = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
                tail.split_at(frac_end)
            }
            None => ("", after_int),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }

        let unit_end = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_end);
        let scale = unit_nanos(unit)?;

        let whole: i128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().ok()?
        };
        total = total.checked_add(whole.checked_mul(scale)?)?;

        // Digits past the 20th can't move the result by a nanosecond.
        let frac_digits = &frac_digits[..frac_digits.len().min(20)];
        if !frac_digits.is_empty() {
            let frac: i128 = frac_digits.parse().ok()?;
            let divisor = 10i128.pow(frac_digits.len() as u32);
            total = total.checked_add(frac * scale / divisor)?;
        }

        rest = tail;
    }

    if negative {
        total = -total;
    }
    let nanos = i64::try_from(total).ok()?;
    Some(TimeDelta::nanoseconds(nanos))
}

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3600 * 1_000_000_000),
        _ => None,
    }
}
