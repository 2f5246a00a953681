//! Log processing for logbrief
//!
//! This crate provides level classification, line parsing, filtering and the
//! final normalization pass shared by every log source.

mod classifier;
mod counts;
mod filter;
mod normalize;
mod parser;
mod source;

pub use classifier::LevelClassifier;
pub use counts::LevelCounts;
pub use filter::EntryFilter;
pub use normalize::{DEFAULT_MAX_ENTRIES, Normalizer};
pub use parser::{LineOrigin, LogParser};
pub use source::LogSource;

// Re-export types used in our public API
pub use logbrief_types::{FetchRequest, LogEntry, LogLevel};
