//! Shared types for logbrief
//!
//! This crate contains data structures used across multiple logbrief crates:
//! the canonical log entry, severity levels, pod descriptions, time ranges
//! and the configuration model.

pub mod config;
mod error;
mod time_range;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use config::Config;
pub use error::{LogbriefError, Result};
pub use time_range::{ResolvedRange, TimeRange, TimeUnit};

/// Source id used when a log line cannot be attributed to a pod
pub const UNKNOWN_SOURCE: &str = "unknown";

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// Pod information
#[derive(Clone, Debug)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub containers: Vec<ContainerInfo>,
    pub labels: BTreeMap<String, String>,
}

impl PodInfo {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            containers: Vec::new(),
            labels: BTreeMap::new(),
        }
    }

    /// The container logs are read from when none is named explicitly
    pub fn default_container(&self) -> Option<&str> {
        self.containers.first().map(|c| c.name.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct ContainerInfo {
    pub name: String,
}

impl ContainerInfo {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [Self::Error, Self::Warning, Self::Info, Self::Debug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogbriefError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(LogbriefError::InvalidLevel(s.to_string())),
        }
    }
}

/// The metric sample a synthetic entry was built from
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawMetric {
    pub metric: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// A single log entry
///
/// Entries are built once by a source and never mutated afterwards; filters
/// produce new collections.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogEntry {
    /// Parsed timestamp (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,

    /// Pod name, or the serialized label set of a metric series
    source_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,

    message: String,

    /// Application the query was scoped to
    app_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<LogLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    raw_metric: Option<RawMetric>,
}

impl LogEntry {
    /// Create a new log entry with minimal fields
    pub fn new(
        source_id: impl Into<String>,
        app_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: None,
            source_id: source_id.into(),
            namespace: None,
            message: message.into(),
            app_name: app_name.into(),
            level: None,
            raw_metric: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    pub fn with_level(mut self, level: Option<LogLevel>) -> Self {
        self.level = level;
        self
    }

    pub fn with_raw_metric(mut self, raw_metric: RawMetric) -> Self {
        self.raw_metric = Some(raw_metric);
        self
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.level
    }

    pub fn raw_metric(&self) -> Option<&RawMetric> {
        self.raw_metric.as_ref()
    }
}

// ============================================================================
// Fetch Requests
// ============================================================================

/// Everything a log source needs to answer one query
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub app_name: String,
    pub range: ResolvedRange,
    /// Case-insensitive substring the message must contain
    pub contains: Option<String>,
    pub level: Option<LogLevel>,
    /// Upper bound on entries a source accumulates
    pub limit: usize,
}

impl FetchRequest {
    pub fn new(app_name: impl Into<String>, range: ResolvedRange) -> Self {
        Self {
            app_name: app_name.into(),
            range,
            contains: None,
            level: None,
            limit: 500,
        }
    }

    pub fn with_contains(mut self, contains: Option<String>) -> Self {
        self.contains = contains.filter(|c| !c.is_empty());
        self
    }

    pub fn with_level(mut self, level: Option<LogLevel>) -> Self {
        self.level = level;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert!("trace".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_entry_serializes_without_empty_fields() {
        let entry = LogEntry::new("api-7d9f", "api", "hello");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["source_id"], "api-7d9f");
        assert!(json.get("timestamp").is_none());
        assert!(json.get("raw_metric").is_none());
    }

    #[test]
    fn test_empty_namespace_is_absent() {
        let entry = LogEntry::new("p", "a", "m").with_namespace(Some(String::new()));
        assert_eq!(entry.namespace(), None);
    }

    #[test]
    fn test_pod_default_container() {
        let mut pod = PodInfo::new("api-1".into(), "prod".into());
        assert_eq!(pod.default_container(), None);
        pod.containers.push(ContainerInfo::new("app".into()));
        pod.containers.push(ContainerInfo::new("sidecar".into()));
        assert_eq!(pod.default_container(), Some("app"));
    }
}
