//! Best-effort conversions from a [`Value`] into native types.
//!
//! Each target type has a `try_*` form that reports a miss as `None`, used by
//! [`TypedMap`](crate::TypedMap) to log the miss, and a public `coerce_*`
//! form that resolves a miss to the type's zero value. Neither ever fails.

use crate::time::{
    epoch, format_duration, format_timestamp, from_unix_seconds, parse_duration, parse_timestamp,
};
use crate::value::Value;
use chrono::{DateTime, FixedOffset, TimeDelta};

/// Parses the boolean literals accepted in loosely-typed payloads.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Decimal text for a float, with `+Inf`, `-Inf` and `NaN` for the
/// non-finite values.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "+Inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        f.to_string()
    }
}

impl Value {
    pub(crate) fn try_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn try_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            // `as` truncates toward zero and saturates; NaN becomes 0.
            Value::Float(f) => Some(*f as i64),
            Value::String(s) => s
                .parse()
                .ok()
                .or_else(|| parse_bool(s).map(i64::from)),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub(crate) fn try_string(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::Error(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            Value::Time(t) => Some(format_timestamp(t)),
            Value::Duration(d) => Some(format_duration(*d)),
            _ => None,
        }
    }

    pub(crate) fn try_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::String(s) => parse_bool(s),
            _ => None,
        }
    }

    pub(crate) fn try_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Value::Time(t) => Some(*t),
            Value::String(s) => parse_timestamp(s),
            Value::Int(secs) => Some(from_unix_seconds(*secs)),
            Value::Float(secs) => Some(from_unix_seconds(*secs as i64)),
            _ => None,
        }
    }

    pub(crate) fn try_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            Value::Int(nanos) => Some(TimeDelta::nanoseconds(*nanos)),
            Value::Float(nanos) => Some(TimeDelta::nanoseconds(*nanos as i64)),
            Value::String(s) => parse_duration(s),
            _ => None,
        }
    }

    /// Reads the value as a float.
    ///
    /// Floats pass through, integers widen, and strings are parsed as
    /// decimals. Anything else is `0.0`.
    pub fn coerce_f64(&self) -> f64 {
        self.try_f64().unwrap_or_default()
    }

    /// Reads the value as a 64-bit integer.
    ///
    /// Floats are truncated toward zero. Strings are parsed as base-10
    /// integers, falling back to boolean literals (`"true"` is 1). Booleans
    /// are 1 or 0. Anything else is 0.
    ///
    /// ```
    /// use sovran_valuemap::Value;
    ///
    /// assert_eq!(Value::Float(-2.9).coerce_i64(), -2);
    /// assert_eq!(Value::from("true").coerce_i64(), 1);
    /// assert_eq!(Value::from("twelve").coerce_i64(), 0);
    /// ```
    pub fn coerce_i64(&self) -> i64 {
        self.try_i64().unwrap_or_default()
    }

    /// Same rules as [`coerce_i64`](Self::coerce_i64), narrowed to 32 bits
    /// with two's-complement truncation.
    pub fn coerce_i32(&self) -> i32 {
        self.coerce_i64() as i32
    }

    /// Renders the value as text.
    ///
    /// Floats use the shortest representation that round-trips (`+Inf`,
    /// `-Inf` and `NaN` for the non-finite ones), timestamps
    /// use RFC3339 and durations the `1h2m3.5s` form. Errors render as their
    /// message. Booleans, arrays, maps and null render as `""`.
    pub fn coerce_string(&self) -> String {
        self.try_string().unwrap_or_default()
    }

    /// Reads the value as a boolean.
    ///
    /// Numbers are true when nonzero. Strings accept `1`, `t`, `T`, `true`,
    /// `TRUE` and `True` (and the matching false forms). Anything else is
    /// `false`.
    pub fn coerce_bool(&self) -> bool {
        self.try_bool().unwrap_or_default()
    }

    /// Reads the value as a timestamp, falling back to the epoch.
    ///
    /// Numbers are whole seconds since the epoch.
    pub fn coerce_time(&self) -> DateTime<FixedOffset> {
        self.try_time().unwrap_or_else(epoch)
    }

    /// Reads the value as a duration. Numbers are nanoseconds.
    pub fn coerce_duration(&self) -> TimeDelta {
        self.try_duration().unwrap_or_else(TimeDelta::zero)
    }
}
