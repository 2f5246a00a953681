use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use logbrief_types::{LogEntry, UNKNOWN_SOURCE};

use crate::{EntryFilter, LevelClassifier};

/// Leading ISO-8601 timestamp: date, `T`, time, optional fraction, optional zone.
static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})(\.\d+)?(Z|[+-]\d{2}:?\d{2})?")
        .expect("static timestamp pattern")
});

/// Where a batch of raw lines came from
#[derive(Clone, Copy, Debug)]
pub struct LineOrigin<'a> {
    pub source_id: &'a str,
    pub namespace: Option<&'a str>,
    pub app_name: &'a str,
    /// Whether leading timestamps should be extracted
    pub timestamps: bool,
}

impl<'a> LineOrigin<'a> {
    /// A pod whose log was requested with timestamps
    pub fn pod(pod_name: &'a str, namespace: &'a str, app_name: &'a str) -> Self {
        Self {
            source_id: pod_name,
            namespace: Some(namespace),
            app_name,
            timestamps: true,
        }
    }

    /// Output of the command-line fallback, which carries neither pod name
    /// nor timestamps
    pub fn unattributed(app_name: &'a str) -> Self {
        Self {
            source_id: UNKNOWN_SOURCE,
            namespace: None,
            app_name,
            timestamps: false,
        }
    }
}

/// Log parser for turning raw text into entries
pub struct LogParser;

impl LogParser {
    /// Parse a raw log line into a LogEntry
    pub fn parse(raw: &str, origin: &LineOrigin<'_>) -> LogEntry {
        let (timestamp, message) = if origin.timestamps {
            Self::extract_timestamp(raw)
        } else {
            (None, raw)
        };

        LogEntry::new(origin.source_id, origin.app_name, message)
            .with_timestamp(timestamp)
            .with_namespace(origin.namespace.map(str::to_string))
            .with_level(LevelClassifier::classify(message))
    }

    /// Parse a block of log text, keeping lines that pass `filter`.
    ///
    /// Blank lines are skipped and at most `limit` entries are returned.
    pub fn parse_lines(
        text: &str,
        origin: &LineOrigin<'_>,
        filter: &EntryFilter,
        limit: usize,
    ) -> Vec<LogEntry> {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Self::parse(line, origin))
            .filter(|entry| filter.matches(entry))
            .take(limit)
            .collect()
    }

    /// Split a leading timestamp off a line.
    ///
    /// On a parse failure the whole line is kept as the message.
    fn extract_timestamp(raw: &str) -> (Option<DateTime<Utc>>, &str) {
        let Some(caps) = TIMESTAMP_PREFIX.captures(raw) else {
            return (None, raw);
        };
        let Some(full) = caps.get(0) else {
            return (None, raw);
        };

        let parsed = if caps.get(3).is_some() {
            DateTime::parse_from_rfc3339(&Self::normalize_offset(full.as_str()))
                .ok()
                .map(|ts| ts.with_timezone(&Utc))
        } else {
            NaiveDateTime::parse_from_str(full.as_str(), "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        };

        match parsed {
            Some(ts) => (Some(ts), raw[full.end()..].trim()),
            None => (None, raw),
        }
    }

    /// RFC 3339 wants `+hh:mm`; some emitters write `+hhmm`.
    fn normalize_offset(ts: &str) -> String {
        let bytes = ts.as_bytes();
        let len = bytes.len();
        if len > 5
            && matches!(bytes[len - 5], b'+' | b'-')
            && bytes[len - 4..].iter().all(u8::is_ascii_digit)
        {
            format!("{}:{}", &ts[..len - 2], &ts[len - 2..])
        } else {
            ts.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use logbrief_types::LogLevel;

    fn origin() -> LineOrigin<'static> {
        LineOrigin::pod("api-6c8d-x2x", "prod", "api")
    }

    #[test]
    fn test_parse_k8s_timestamp() {
        let line = "2024-01-15T10:30:00.123456789Z some log message";
        let entry = LogParser::parse(line, &origin());
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.date_naive(), Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap().date_naive());
        assert_eq!(ts.hour(), 10);
        assert_eq!(entry.message(), "some log message");
        assert_eq!(entry.source_id(), "api-6c8d-x2x");
        assert_eq!(entry.namespace(), Some("prod"));
    }

    #[test]
    fn test_parse_bare_timestamp() {
        let entry = LogParser::parse("2024-01-15T10:30:00 ERROR boom", &origin());
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(entry.message(), "ERROR boom");
        assert_eq!(entry.level(), Some(LogLevel::Error));
    }

    #[test]
    fn test_parse_compact_offset() {
        let entry = LogParser::parse("2024-01-15T10:30:00+0200 ready", &origin());
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap())
        );
        assert_eq!(entry.message(), "ready");
    }

    #[test]
    fn test_invalid_timestamp_keeps_line() {
        let line = "2024-13-45T99:99:99 not a real time";
        let entry = LogParser::parse(line, &origin());
        assert!(entry.timestamp().is_none());
        assert_eq!(entry.message(), line);
    }

    #[test]
    fn test_no_timestamp() {
        let entry = LogParser::parse("[WARN] slow query", &origin());
        assert!(entry.timestamp().is_none());
        assert_eq!(entry.message(), "[WARN] slow query");
        assert_eq!(entry.level(), Some(LogLevel::Warning));
    }

    #[test]
    fn test_unattributed_lines_skip_timestamps() {
        let line = "2024-01-15T10:30:00Z started";
        let entry = LogParser::parse(line, &LineOrigin::unattributed("api"));
        assert!(entry.timestamp().is_none());
        assert_eq!(entry.message(), line);
        assert_eq!(entry.source_id(), UNKNOWN_SOURCE);
        assert_eq!(entry.namespace(), None);
    }

    #[test]
    fn test_parse_multibyte_utf8_no_panic() {
        let line = "─────────────────────────────────────────";
        let entry = LogParser::parse(line, &origin());
        assert!(entry.timestamp().is_none());

        let line2 = "2024-01-15T10:30:00Z ╭────────────────────────────╮";
        let entry2 = LogParser::parse(line2, &origin());
        assert!(entry2.timestamp().is_some());
        assert!(entry2.message().starts_with('╭'));
    }

    #[test]
    fn test_parse_lines_skips_blank_and_limits() {
        let text = "line one\n\n   \nline two\nline three\n";
        let entries = LogParser::parse_lines(text, &origin(), &EntryFilter::default(), 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message(), "line one");
        assert_eq!(entries[1].message(), "line two");
    }

    #[test]
    fn test_parse_lines_applies_filter() {
        let text = (0..25)
            .map(|i| {
                if i % 5 < 2 {
                    format!("2024-01-15T10:{i:02}:00Z request {i} hit a TIMEOUT")
                } else {
                    format!("2024-01-15T10:{i:02}:00Z request {i} ok")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let filter = EntryFilter::new(Some("timeout".into()), None);
        let entries = LogParser::parse_lines(&text, &origin(), &filter, 500);
        assert_eq!(entries.len(), 10);
        assert!(entries
            .iter()
            .all(|e| e.message().to_lowercase().contains("timeout")));
    }
}
