//! Compact duration literals (`1w2d`, `90m`) and instant alignment helpers

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Write;
use thiserror::Error;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Seconds from 0001-01-01T00:00:00Z (a Monday) to the Unix epoch.
/// Interval boundaries are counted from the former.
const ZERO_TIME_TO_UNIX_SECS: i128 = 62_135_596_800;

/// Units in descending order, as (suffix, seconds)
const UNITS: &[(char, i64)] = &[
    ('w', 7 * 24 * 60 * 60),
    ('d', 24 * 60 * 60),
    ('h', 60 * 60),
    ('m', 60),
    ('s', 1),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("Empty duration")]
    Empty,

    #[error("Invalid count in duration '{input}'")]
    InvalidCount { input: String },

    #[error("Missing unit after count in duration '{input}'")]
    MissingUnit { input: String },

    #[error("Unrecognized unit '{unit}' in duration '{input}'")]
    InvalidUnit { unit: char, input: String },

    #[error("Duration '{input}' is out of range")]
    OutOfRange { input: String },
}

/// Format a duration using the largest units first, e.g. 9 days -> `1w2d`.
///
/// Zero formats as `0s`; sub-second remainders are dropped.
pub fn format_duration(d: TimeDelta) -> String {
    let mut secs = d.num_seconds();
    if secs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if secs < 0 {
        out.push('-');
        secs = secs.unsigned_abs().min(i64::MAX as u64) as i64;
    }

    for &(unit, base) in UNITS {
        if secs >= base {
            let _ = write!(out, "{}{}", secs / base, unit);
            secs %= base;
        }
    }

    out
}

/// Parse a duration literal made of `<count><unit>` pairs.
///
/// Pairs may come in any order and accumulate. The bare literal `0` is the
/// zero duration.
pub fn parse_duration(input: &str) -> Result<TimeDelta, DurationError> {
    if input.is_empty() {
        return Err(DurationError::Empty);
    }
    if input == "0" {
        return Ok(TimeDelta::zero());
    }

    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut total: i64 = 0;

    while pos < bytes.len() {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }

        let count: i64 = input[start..pos]
            .parse()
            .map_err(|_| DurationError::InvalidCount {
                input: input.to_string(),
            })?;

        // Count consumed; what follows must be a unit
        let Some(unit) = input[pos..].chars().next() else {
            return Err(DurationError::MissingUnit {
                input: input.to_string(),
            });
        };

        let base = UNITS
            .iter()
            .find(|&&(suffix, _)| suffix == unit)
            .map(|&(_, base)| base)
            .ok_or_else(|| DurationError::InvalidUnit {
                unit,
                input: input.to_string(),
            })?;

        total = count
            .checked_mul(base)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| DurationError::OutOfRange {
                input: input.to_string(),
            })?;

        pos += unit.len_utf8();
    }

    TimeDelta::try_seconds(total).ok_or_else(|| DurationError::OutOfRange {
        input: input.to_string(),
    })
}

/// Round `t` down to a multiple of `step` counted from 0001-01-01T00:00:00Z.
///
/// A zero or negative step leaves `t` unchanged.
pub fn truncate(t: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let step = span_nanos(step);
    if step <= 0 {
        return t;
    }

    let stamp = instant_nanos(&t);
    from_nanos(stamp - stamp.rem_euclid(step)).unwrap_or(t)
}

/// Round `t` to the nearest multiple of `step` counted from 0001-01-01T00:00:00Z.
/// Halfway values round up.
///
/// A zero or negative step leaves `t` unchanged.
pub fn round(t: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let step = span_nanos(step);
    if step <= 0 {
        return t;
    }

    let stamp = instant_nanos(&t);
    let below = stamp.rem_euclid(step);
    let rounded = if below + below < step {
        stamp - below
    } else {
        stamp + (step - below)
    };

    from_nanos(rounded).unwrap_or(t)
}

fn span_nanos(d: TimeDelta) -> i128 {
    d.num_seconds() as i128 * NANOS_PER_SEC + d.subsec_nanos() as i128
}

/// Nanoseconds since 0001-01-01T00:00:00Z
fn instant_nanos(t: &DateTime<Utc>) -> i128 {
    (t.timestamp() as i128 + ZERO_TIME_TO_UNIX_SECS) * NANOS_PER_SEC
        + t.timestamp_subsec_nanos() as i128
}

fn from_nanos(stamp: i128) -> Option<DateTime<Utc>> {
    let secs = stamp.div_euclid(NANOS_PER_SEC) - ZERO_TIME_TO_UNIX_SECS;
    let secs = i64::try_from(secs).ok()?;
    let nanos = stamp.rem_euclid(NANOS_PER_SEC) as u32;
    DateTime::from_timestamp(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse_duration("1m").unwrap(), TimeDelta::minutes(1));
        assert_eq!(parse_duration("120m").unwrap(), TimeDelta::minutes(120));
        assert_eq!(parse_duration("5h").unwrap(), TimeDelta::hours(5));
        assert_eq!(parse_duration("7d").unwrap(), TimeDelta::days(7));
        assert_eq!(parse_duration("30s").unwrap(), TimeDelta::seconds(30));
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(parse_duration("1w2d").unwrap(), TimeDelta::days(9));
        assert_eq!(
            parse_duration("1d12h30m").unwrap(),
            TimeDelta::hours(36) + TimeDelta::minutes(30)
        );
    }

    #[test]
    fn test_parse_accepts_any_order() {
        assert_eq!(parse_duration("2d1w").unwrap(), TimeDelta::days(9));
        assert_eq!(parse_duration("1h1h").unwrap(), TimeDelta::hours(2));
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse_duration("0").unwrap(), TimeDelta::zero());
        assert_eq!(parse_duration("0s").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(
            parse_duration("d"),
            Err(DurationError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse_duration("15"),
            Err(DurationError::MissingUnit { .. })
        ));
        assert_eq!(
            parse_duration("1x"),
            Err(DurationError::InvalidUnit {
                unit: 'x',
                input: "1x".to_string()
            })
        );
        assert!(matches!(
            parse_duration("99999999999999999999w"),
            Err(DurationError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse_duration("9999999999999w"),
            Err(DurationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
        assert_eq!(format_duration(TimeDelta::minutes(12)), "12m");
        assert_eq!(format_duration(TimeDelta::hours(5)), "5h");
        assert_eq!(format_duration(TimeDelta::days(1)), "1d");
        assert_eq!(format_duration(TimeDelta::days(9)), "1w2d");
        assert_eq!(format_duration(TimeDelta::minutes(90)), "1h30m");
        assert_eq!(
            format_duration(TimeDelta::days(8) + TimeDelta::seconds(5)),
            "1w1d5s"
        );
        assert_eq!(format_duration(TimeDelta::hours(-2)), "-2h");
    }

    #[test]
    fn test_format_then_parse() {
        let samples = [
            TimeDelta::seconds(1),
            TimeDelta::minutes(59) + TimeDelta::seconds(59),
            TimeDelta::days(365),
            TimeDelta::weeks(3) + TimeDelta::days(6) + TimeDelta::hours(23),
        ];

        for d in samples {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(at(10, 7, 30), TimeDelta::minutes(5)), at(10, 5, 0));
        assert_eq!(truncate(at(10, 5, 0), TimeDelta::minutes(5)), at(10, 5, 0));
        assert_eq!(truncate(at(10, 7, 30), TimeDelta::zero()), at(10, 7, 30));
    }

    #[test]
    fn test_truncate_before_epoch() {
        let t = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(truncate(t, TimeDelta::days(1)), expected);
    }

    #[test]
    fn test_round() {
        assert_eq!(round(at(10, 7, 29), TimeDelta::minutes(5)), at(10, 5, 0));
        assert_eq!(round(at(10, 7, 30), TimeDelta::minutes(5)), at(10, 10, 0));
        assert_eq!(round(at(10, 0, 5), TimeDelta::minutes(1)), at(10, 0, 0));
        assert_eq!(round(at(10, 7, 30), TimeDelta::zero()), at(10, 7, 30));
    }

    #[test]
    fn test_week_boundaries_fall_on_mondays() {
        let monday = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let thursday = Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();

        assert_eq!(truncate(monday, TimeDelta::weeks(1)), monday);
        assert_eq!(truncate(thursday, TimeDelta::weeks(1)), monday);
        assert_eq!(round(thursday, TimeDelta::weeks(1)), monday);
        assert_eq!(
            round(thursday + TimeDelta::hours(12), TimeDelta::weeks(1)),
            monday + TimeDelta::weeks(1)
        );
    }

    #[test]
    fn test_long_intervals_count_from_year_one() {
        // 2024-03-16 is 738960 days after 0001-01-01, a multiple of 30
        let boundary = Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap();
        assert_eq!(truncate(boundary, TimeDelta::days(30)), boundary);
        assert_eq!(
            truncate(boundary - TimeDelta::days(1), TimeDelta::days(30)),
            boundary - TimeDelta::days(30)
        );
    }
}
