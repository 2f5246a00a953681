use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

use crate::{LogbriefError, Result};

/// Longest accepted lookback
const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Unit of a lookback window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn suffix(&self) -> char {
        match self {
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
        }
    }

    /// Metrics sampling step for ranges expressed in this unit
    pub fn step(&self) -> &'static str {
        match self {
            Self::Minutes => "15s",
            Self::Hours => "1m",
            Self::Days => "1h",
        }
    }
}

/// A lookback window such as `15m`, `1h` or `2d`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    value: u32,
    unit: TimeUnit,
}

impl TimeRange {
    /// Parse `<positive integer><m|h|d>`, unit case-insensitive
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| LogbriefError::InvalidTimeRange {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let Some(last) = trimmed.chars().last() else {
            return Err(invalid("empty duration"));
        };
        let unit = match last.to_ascii_lowercase() {
            'm' => TimeUnit::Minutes,
            'h' => TimeUnit::Hours,
            'd' => TimeUnit::Days,
            _ => return Err(invalid("unit must be one of m, h, d")),
        };

        let digits = &trimmed[..trimmed.len() - last.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("value must be a positive integer"));
        }
        let value: u32 = digits
            .parse()
            .map_err(|_| invalid("value is too large"))?;
        if value == 0 {
            return Err(invalid("value must be a positive integer"));
        }

        let range = Self { value, unit };
        if range.duration() > Duration::days(MAX_LOOKBACK_DAYS) {
            return Err(invalid("range is longer than ten years"));
        }
        Ok(range)
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn duration(&self) -> Duration {
        let value = i64::from(self.value);
        match self.unit {
            TimeUnit::Minutes => Duration::minutes(value),
            TimeUnit::Hours => Duration::hours(value),
            TimeUnit::Days => Duration::days(value),
        }
    }

    /// Resolve against the current instant
    pub fn resolve(&self) -> ResolvedRange {
        self.resolve_at(Utc::now())
    }

    /// Resolve against an explicit `now`
    pub fn resolve_at(&self, now: DateTime<Utc>) -> ResolvedRange {
        ResolvedRange {
            range: *self,
            start: now - self.duration(),
            end: now,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for TimeRange {
    type Err = LogbriefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A time range pinned to absolute bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedRange {
    pub range: TimeRange,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedRange {
    /// Human readable "since" token, e.g. `2d`
    pub fn since_token(&self) -> String {
        self.range.to_string()
    }

    /// Lookback expressed in minutes or hours, e.g. `48h` for `2d`.
    ///
    /// Both PromQL range selectors and `kubectl --since` accept this form.
    pub fn window(&self) -> String {
        match self.range.unit {
            TimeUnit::Minutes => format!("{}m", self.range.value),
            TimeUnit::Hours => format!("{}h", self.range.value),
            TimeUnit::Days => format!("{}h", u64::from(self.range.value) * 24),
        }
    }

    pub fn step(&self) -> &'static str {
        self.range.unit.step()
    }

    pub fn since_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_units() {
        let resolved = TimeRange::parse("30m").unwrap().resolve_at(now());
        assert_eq!(resolved.start, now() - Duration::minutes(30));
        assert_eq!(resolved.end, now());
        assert_eq!(resolved.step(), "15s");

        let resolved = TimeRange::parse("6H").unwrap().resolve_at(now());
        assert_eq!(resolved.start, now() - Duration::hours(6));
        assert_eq!(resolved.step(), "1m");
        assert_eq!(resolved.since_token(), "6h");

        let resolved = TimeRange::parse("2d").unwrap().resolve_at(now());
        assert_eq!(resolved.start, now() - Duration::days(2));
        assert_eq!(resolved.step(), "1h");
    }

    #[test]
    fn test_start_is_exactly_n_units_back() {
        for n in [1u32, 7, 59, 240, 3650] {
            for (suffix, unit) in [('m', 60), ('h', 3600), ('d', 86400)] {
                let range = TimeRange::parse(&format!("{n}{suffix}")).unwrap();
                let resolved = range.resolve_at(now());
                assert_eq!(resolved.since_seconds(), i64::from(n) * unit);
            }
        }
    }

    #[test]
    fn test_rejects_bad_units() {
        for input in ["10s", "5w", "1y", "10", "h"] {
            let err = TimeRange::parse(input).unwrap_err();
            assert!(
                matches!(err, LogbriefError::InvalidTimeRange { .. }),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_non_positive_values() {
        for input in ["0h", "-1h", "+1h", "1.5h", "abch", "", "99999999999m", "4000d"] {
            assert!(TimeRange::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_window_converts_days_to_hours() {
        let resolved = TimeRange::parse("2d").unwrap().resolve_at(now());
        assert_eq!(resolved.window(), "48h");
        assert_eq!(resolved.since_token(), "2d");

        let resolved = TimeRange::parse("45m").unwrap().resolve_at(now());
        assert_eq!(resolved.window(), "45m");
    }
}
