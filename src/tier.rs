//! Retention tiers: `@<age>/<interval>~<alignment>`
//!
//! A tier applies to backups at least `age` old and keeps those that sit on an
//! `interval` boundary, allowing `alignment` of jitter around each boundary.

use crate::duration::{self, DurationError, format_duration, parse_duration};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const AGE_MARKER: char = '@';
const INTERVAL_MARKER: char = '/';
const ALIGNMENT_MARKER: char = '~';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TierError {
    #[error("Malformed duration in tier spec '{spec}': {source}")]
    MalformedDuration {
        spec: String,
        #[source]
        source: DurationError,
    },

    #[error("Unrecognized marker '{marker}' in tier spec '{spec}'")]
    MalformedTierSpec { marker: char, spec: String },
}

/// One retention rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tier {
    /// Minimum backup age before the tier applies; zero applies to everything
    pub age: TimeDelta,
    /// Keep one backup per interval
    pub interval: TimeDelta,
    /// Jitter tolerance around each interval boundary
    pub alignment: TimeDelta,
}

impl Tier {
    pub fn new(age: TimeDelta, interval: TimeDelta, alignment: TimeDelta) -> Self {
        Self {
            age,
            interval,
            alignment,
        }
    }

    /// Whether `t` is old enough, relative to `now`, for this tier to apply.
    pub fn in_window(&self, t: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.age.is_zero() {
            return true;
        }

        match now.checked_sub_signed(self.age) {
            Some(cutoff) => t <= cutoff,
            // Cutoff precedes every representable instant
            None => false,
        }
    }

    /// Whether `t` lands on an interval boundary, within the alignment tolerance.
    ///
    /// Does not check the window; see [`Tier::in_window`].
    pub fn matches(&self, t: DateTime<Utc>) -> bool {
        duration::truncate(t, self.interval) == duration::round(t, self.alignment)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments = [
            (AGE_MARKER, self.age),
            (INTERVAL_MARKER, self.interval),
            (ALIGNMENT_MARKER, self.alignment),
        ];

        for (marker, value) in segments {
            if !value.is_zero() {
                write!(f, "{}{}", marker, format_duration(value))?;
            }
        }

        Ok(())
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tier = Tier::default();
        let mut rest = s;

        while let Some(marker) = rest.chars().next() {
            let body = &rest[marker.len_utf8()..];
            let end = body.find(is_marker).unwrap_or(body.len());
            let literal = &body[..end];

            let slot = match marker {
                AGE_MARKER => &mut tier.age,
                INTERVAL_MARKER => &mut tier.interval,
                ALIGNMENT_MARKER => &mut tier.alignment,
                other => {
                    return Err(TierError::MalformedTierSpec {
                        marker: other,
                        spec: s.to_string(),
                    });
                }
            };

            *slot = parse_duration(literal).map_err(|source| TierError::MalformedDuration {
                spec: s.to_string(),
                source,
            })?;

            rest = &body[end..];
        }

        Ok(tier)
    }
}

fn is_marker(c: char) -> bool {
    matches!(c, AGE_MARKER | INTERVAL_MARKER | ALIGNMENT_MARKER)
}

impl Serialize for Tier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TierVisitor;

        impl<'de> serde::de::Visitor<'de> for TierVisitor {
            type Value = Tier;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a tier spec string (e.g., \"@7d/1d\", \"@1d/1w~1d\")")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<Tier>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(TierVisitor)
    }
}
