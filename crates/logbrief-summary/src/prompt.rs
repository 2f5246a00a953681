use logbrief_types::LogEntry;

use crate::SummaryError;

/// Most entries embedded in a single prompt
pub const MAX_PROMPT_ENTRIES: usize = 200;

const INSTRUCTIONS: &str = "\
For this analysis, please:
1. Summarize the main errors and issues
2. Identify which services are most affected
3. Detect any patterns in when or how errors occur
4. Suggest potential root causes
5. Recommend specific places in the code or systems to investigate
6. List any related trace IDs that might be helpful for further investigation

Present your findings in a clear, structured format that would help an on-call \
engineer quickly understand and address the issues.";

/// Analysis prompt with the first [`MAX_PROMPT_ENTRIES`] entries as JSON
pub fn build_prompt(entries: &[LogEntry]) -> Result<String, SummaryError> {
    let shown = &entries[..entries.len().min(MAX_PROMPT_ENTRIES)];
    let json = serde_json::to_string_pretty(shown)?;

    Ok(format!(
        "I need you to analyze these logs from our microservice architecture and provide insights:\n\n\
         ```json\n{json}\n```\n\n{INSTRUCTIONS}\n"
    ))
}
