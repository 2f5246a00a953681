use std::fmt;

use logbrief_types::{LogEntry, LogLevel};

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub debug: usize,
    pub unclassified: usize,
}

impl LevelCounts {
    /// Tally the levels of a batch of entries
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let mut counts = Self::default();

        for entry in entries {
            match entry.level() {
                Some(LogLevel::Error) => counts.error += 1,
                Some(LogLevel::Warning) => counts.warning += 1,
                Some(LogLevel::Info) => counts.info += 1,
                Some(LogLevel::Debug) => counts.debug += 1,
                None => counts.unclassified += 1,
            }
        }

        counts
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info + self.debug + self.unclassified
    }
}

impl fmt::Display for LevelCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error, {} warning, {} info, {} debug, {} unclassified",
            self.error, self.warning, self.info, self.debug, self.unclassified
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let entries = vec![
            LogEntry::new("p", "a", "x").with_level(Some(LogLevel::Error)),
            LogEntry::new("p", "a", "y").with_level(Some(LogLevel::Error)),
            LogEntry::new("p", "a", "z").with_level(Some(LogLevel::Debug)),
            LogEntry::new("p", "a", "w"),
        ];
        let counts = LevelCounts::from_entries(&entries);
        assert_eq!(counts.error, 2);
        assert_eq!(counts.debug, 1);
        assert_eq!(counts.unclassified, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(
            counts.to_string(),
            "2 error, 0 warning, 0 info, 1 debug, 1 unclassified"
        );
    }
}
