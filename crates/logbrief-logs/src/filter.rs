use logbrief_types::{FetchRequest, LogEntry, LogLevel};

/// Text and level filter applied to log entries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Lowercased substring the message must contain
    contains: Option<String>,

    /// Required level (unclassified entries never match)
    level: Option<LogLevel>,
}

impl EntryFilter {
    /// Create a new filter; an empty `contains` matches everything
    pub fn new(contains: Option<String>, level: Option<LogLevel>) -> Self {
        Self {
            contains: contains
                .filter(|c| !c.is_empty())
                .map(|c| c.to_lowercase()),
            level,
        }
    }

    /// Build the filter a fetch request asks for
    pub fn from_request(request: &FetchRequest) -> Self {
        Self::new(request.contains.clone(), request.level)
    }

    /// Filter with the level requirement dropped.
    ///
    /// Sources that pick their queries by level only need the text check.
    pub fn text_only(&self) -> Self {
        Self {
            contains: self.contains.clone(),
            level: None,
        }
    }

    /// Check the text part of the filter against a message
    pub fn matches_text(&self, message: &str) -> bool {
        match &self.contains {
            Some(needle) => message.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    /// Check the level part of the filter against an entry's level
    pub fn matches_level(&self, level: Option<LogLevel>) -> bool {
        match self.level {
            Some(wanted) => level == Some(wanted),
            None => true,
        }
    }

    /// Check if a log entry matches this filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.matches_level(entry.level()) && self.matches_text(entry.message())
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.contains.is_none() && self.level.is_none()
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str, level: Option<LogLevel>) -> LogEntry {
        LogEntry::new("pod", "app", message).with_level(level)
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let filter = EntryFilter::new(Some("TimeOut".into()), None);
        assert!(filter.matches(&entry("upstream timeout after 30s", None)));
        assert!(filter.matches(&entry("UPSTREAM TIMEOUT", None)));
        assert!(!filter.matches(&entry("everything is fine", None)));
    }

    #[test]
    fn test_level_filter() {
        let filter = EntryFilter::new(None, Some(LogLevel::Error));
        assert!(filter.matches(&entry("boom", Some(LogLevel::Error))));
        assert!(!filter.matches(&entry("fine", Some(LogLevel::Info))));
    }

    #[test]
    fn test_unclassified_never_matches_level() {
        for level in LogLevel::ALL {
            let filter = EntryFilter::new(None, Some(level));
            assert!(!filter.matches(&entry("GET / 200", None)));
        }
    }

    #[test]
    fn test_empty_filter() {
        let filter = EntryFilter::new(Some(String::new()), None);
        assert!(filter.is_empty());
        assert!(filter.matches(&entry("anything", None)));
    }

    #[test]
    fn test_text_only_drops_level() {
        let filter = EntryFilter::new(Some("cpu".into()), Some(LogLevel::Warning)).text_only();
        assert_eq!(filter.level(), None);
        assert!(filter.matches_text("cpu_usage: pod=a = 0.5"));
    }
}
