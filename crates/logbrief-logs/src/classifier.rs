use regex::Regex;
use std::sync::LazyLock;

use logbrief_types::LogLevel;

/// Keyword patterns in priority order; the first match wins.
static LEVEL_PATTERNS: LazyLock<[(LogLevel, Regex); 4]> = LazyLock::new(|| {
    let build = |pattern: &str| Regex::new(pattern).expect("static level pattern");
    [
        (LogLevel::Error, build(r"(?i)\b(ERROR|ERR|ERRO|FATAL)\b")),
        (LogLevel::Warning, build(r"(?i)\b(WARN|WARNING)\b")),
        (LogLevel::Info, build(r"(?i)\bINFO\b")),
        (LogLevel::Debug, build(r"(?i)\bDEBUG\b")),
    ]
});

/// Infers a severity from unstructured text
pub struct LevelClassifier;

impl LevelClassifier {
    /// Classify a message by whole-word keyword match.
    ///
    /// Returns `None` when no keyword is present; such entries never satisfy
    /// a level filter.
    pub fn classify(message: &str) -> Option<LogLevel> {
        LEVEL_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(message))
            .map(|(level, _)| *level)
    }
}
