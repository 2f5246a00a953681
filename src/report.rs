use chrono::{DateTime, Local};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use logbrief_types::TimeRange;

use crate::pipeline::PipelineError;

/// Writes analyses as markdown files named after the app and the run time
#[derive(Clone, Debug)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<app>_<YYYYmmdd_HHMMSS>.md`
    pub fn report_path(&self, app_name: &str, at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.md",
            file_stem(app_name),
            at.format("%Y%m%d_%H%M%S")
        ))
    }

    /// Create the directory if needed and write the report
    pub fn write(
        &self,
        app_name: &str,
        range: &TimeRange,
        analysis: &str,
        at: DateTime<Local>,
    ) -> Result<PathBuf, PipelineError> {
        fs::create_dir_all(&self.dir).map_err(|source| PipelineError::OutputWrite {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.report_path(app_name, at);
        let contents = format!(
            "Log Analysis for {app_name} ({range}) - {}\n\n{analysis}\n",
            at.format("%Y-%m-%d %H:%M:%S")
        );
        fs::write(&path, contents).map_err(|source| PipelineError::OutputWrite {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "report written");
        Ok(path)
    }
}

/// App names may carry glob characters; keep file names portable
fn file_stem(app_name: &str) -> String {
    app_name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}
