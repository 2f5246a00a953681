use chrono::Local;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use logbrief_logs::{EntryFilter, LevelCounts, LogSource, Normalizer};
use logbrief_summary::Summarizer;
use logbrief_types::FetchRequest;

use crate::report::ReportWriter;

const BANNER: &str = "================================================================================";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch from {source_name}: {error:#}")]
    Source {
        source_name: &'static str,
        error: anyhow::Error,
    },

    #[error("failed to write report to {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stages a run moves through
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Normalizing,
    Summarizing,
    Reporting,
    Done,
    Empty,
    Failed,
}

/// How a run ended
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Analysis written to `report`
    Done { report: PathBuf, analysis: String },
    /// Nothing matched; the summarizer was not called
    Empty,
    /// The summarizer failed; no report was written
    Failed { message: String },
}

#[derive(Debug)]
pub struct PipelineRun {
    pub transitions: Vec<PipelineState>,
    pub outcome: PipelineOutcome,
}

impl PipelineRun {
    pub fn final_state(&self) -> PipelineState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }
}

/// fetch, normalize, summarize, report
pub struct Pipeline<'a> {
    source: &'a dyn LogSource,
    summarizer: &'a dyn Summarizer,
    writer: ReportWriter,
    max_entries: usize,
    max_output_tokens: u32,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn LogSource,
        summarizer: &'a dyn Summarizer,
        writer: ReportWriter,
        max_entries: usize,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            source,
            summarizer,
            writer,
            max_entries,
            max_output_tokens,
        }
    }

    pub async fn run(&self, request: &FetchRequest) -> Result<PipelineRun, PipelineError> {
        let mut transitions = vec![PipelineState::Idle];

        enter(&mut transitions, PipelineState::Fetching);
        println!(
            "Fetching {} data for app: {}, time range: {}...",
            self.source.name(),
            request.app_name,
            request.range.range
        );
        let fetched =
            self.source
                .fetch(request)
                .await
                .map_err(|error| PipelineError::Source {
                    source_name: self.source.name(),
                    error,
                })?;
        info!(source = self.source.name(), fetched = fetched.len(), "fetch done");

        if fetched.is_empty() {
            enter(&mut transitions, PipelineState::Empty);
            println!("No logs found matching the criteria.");
            return Ok(PipelineRun {
                transitions,
                outcome: PipelineOutcome::Empty,
            });
        }

        enter(&mut transitions, PipelineState::Normalizing);
        let normalizer = Normalizer::new(EntryFilter::from_request(request), self.max_entries);
        let entries = normalizer.normalize(fetched);
        if entries.is_empty() {
            enter(&mut transitions, PipelineState::Empty);
            println!("No logs found matching the criteria.");
            return Ok(PipelineRun {
                transitions,
                outcome: PipelineOutcome::Empty,
            });
        }

        let counts = LevelCounts::from_entries(&entries);
        println!("Found {} entries: {counts}", counts.total());

        enter(&mut transitions, PipelineState::Summarizing);
        println!("Analyzing logs...");
        let analysis = match self
            .summarizer
            .summarize(&entries, self.max_output_tokens)
            .await
        {
            Ok(analysis) => analysis,
            Err(err) => {
                let message = format!("Error analyzing logs: {err}");
                enter(&mut transitions, PipelineState::Failed);
                println!("{message}");
                return Ok(PipelineRun {
                    transitions,
                    outcome: PipelineOutcome::Failed { message },
                });
            }
        };

        println!("\n{BANNER}\nLOG ANALYSIS RESULTS\n{BANNER}\n");
        println!("{analysis}");
        println!("\n{BANNER}");

        enter(&mut transitions, PipelineState::Reporting);
        let report = self.writer.write(
            &request.app_name,
            &request.range.range,
            &analysis,
            Local::now(),
        )?;

        enter(&mut transitions, PipelineState::Done);
        Ok(PipelineRun {
            transitions,
            outcome: PipelineOutcome::Done { report, analysis },
        })
    }
}

fn enter(transitions: &mut Vec<PipelineState>, state: PipelineState) {
    debug!(?state, "pipeline state");
    transitions.push(state);
}
