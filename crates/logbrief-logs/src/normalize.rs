use logbrief_types::LogEntry;
use tracing::debug;

use crate::EntryFilter;

/// Entries handed to the summarizer by default
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Final filter pass and size bound before summarization
#[derive(Clone, Debug)]
pub struct Normalizer {
    filter: EntryFilter,
    max_entries: usize,
}

impl Normalizer {
    pub fn new(filter: EntryFilter, max_entries: usize) -> Self {
        Self {
            filter,
            max_entries,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Re-apply the filters and keep the first `max_entries` in retrieval
    /// order.
    pub fn normalize(&self, entries: Vec<LogEntry>) -> Vec<LogEntry> {
        let fetched = entries.len();
        let kept: Vec<LogEntry> = entries
            .into_iter()
            .filter(|entry| self.filter.matches(entry))
            .take(self.max_entries)
            .collect();

        debug!(fetched, kept = kept.len(), max = self.max_entries, "normalized entries");
        kept
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(EntryFilter::default(), DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbrief_types::LogLevel;

    fn numbered(count: usize) -> Vec<LogEntry> {
        (0..count)
            .map(|i| LogEntry::new("pod", "app", format!("line {i}")))
            .collect()
    }

    #[test]
    fn test_truncates_to_prefix_in_order() {
        let normalizer = Normalizer::new(EntryFilter::default(), 5);
        let out = normalizer.normalize(numbered(25));
        let messages: Vec<&str> = out.iter().map(LogEntry::message).collect();
        assert_eq!(messages, ["line 0", "line 1", "line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_default_ceiling() {
        let out = Normalizer::default().normalize(numbered(450));
        assert_eq!(out.len(), DEFAULT_MAX_ENTRIES);
        assert_eq!(out[199].message(), "line 199");
    }

    #[test]
    fn test_reapplies_filters() {
        let entries: Vec<LogEntry> = (0..25)
            .map(|i| {
                let msg = if i % 5 == 0 || i % 5 == 3 {
                    format!("req {i} Timeout")
                } else {
                    format!("req {i} ok")
                };
                LogEntry::new("pod", "app", msg)
            })
            .collect();

        let normalizer = Normalizer::new(EntryFilter::new(Some("timeout".into()), None), 200);
        let out = normalizer.normalize(entries);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|e| e.message().contains("Timeout")));
    }

    #[test]
    fn test_level_filter_drops_unclassified() {
        let entries = vec![
            LogEntry::new("p", "a", "x").with_level(Some(LogLevel::Error)),
            LogEntry::new("p", "a", "y"),
            LogEntry::new("p", "a", "z").with_level(Some(LogLevel::Info)),
        ];
        let normalizer = Normalizer::new(EntryFilter::new(None, Some(LogLevel::Error)), 200);
        let out = normalizer.normalize(entries);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message(), "x");
    }
}
