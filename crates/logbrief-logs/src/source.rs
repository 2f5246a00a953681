use async_trait::async_trait;

use logbrief_types::{FetchRequest, LogEntry};

/// A place log entries can be pulled from.
///
/// Implementations apply the request's filters and limit themselves; the
/// pipeline still runs a [`Normalizer`](crate::Normalizer) pass afterwards.
/// An `Err` means no data could be produced at all. Failures confined to one
/// pod or one query are logged and skipped inside the source.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Vec<LogEntry>>;
}
