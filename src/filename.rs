//! Backup timestamps recovered from object names like `postgres-2017-08-17.archive`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilenameError {
    #[error("Name '{name}' does not start with prefix '{prefix}'")]
    MissingPrefix { name: String, prefix: String },

    #[error("Unrecognized timestamp '{stamp}' in '{name}'")]
    UnrecognizedTimestamp { stamp: String, name: String },
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H-%M-%S",
    "%Y%m%dT%H%M%SZ",
    "%Y%m%d%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Extract the timestamp between `prefix` and the file extension of `name`.
pub fn parse_filename(name: &str, prefix: &str) -> Result<DateTime<Utc>, FilenameError> {
    let stem = name
        .strip_prefix(prefix)
        .ok_or_else(|| FilenameError::MissingPrefix {
            name: name.to_string(),
            prefix: prefix.to_string(),
        })?;
    let stamp = strip_extension(stem);

    parse_timestamp(stamp).ok_or_else(|| FilenameError::UnrecognizedTimestamp {
        stamp: stamp.to_string(),
        name: name.to_string(),
    })
}

/// Drop everything from the last `.` of the final path segment.
fn strip_extension(stem: &str) -> &str {
    let segment_start = stem.rfind('/').map_or(0, |i| i + 1);
    match stem[segment_start..].rfind('.') {
        Some(dot) => &stem[..segment_start + dot],
        None => stem,
    }
}

fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(stamp) {
        return Some(t.with_timezone(&Utc));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(stamp, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
