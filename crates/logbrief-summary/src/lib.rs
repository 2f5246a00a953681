//! Log summarization for logbrief
//!
//! The pipeline talks to text generation through [`Summarizer`]. The bundled
//! [`MessagesSummarizer`] posts to a messages-style HTTP API and walks an
//! ordered list of models until one answers.

mod error;
mod fallback;
mod messages;
mod prompt;

use async_trait::async_trait;

use logbrief_types::LogEntry;

pub use error::SummaryError;
pub use fallback::ModelFallback;
pub use messages::{MessagesSummarizer, extract_text};
pub use prompt::{MAX_PROMPT_ENTRIES, build_prompt};

/// Turns a batch of log entries into prose
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        entries: &[LogEntry],
        max_output_tokens: u32,
    ) -> Result<String, SummaryError>;
}
