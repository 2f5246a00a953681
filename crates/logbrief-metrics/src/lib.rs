//! Prometheus metrics source for logbrief
//!
//! Runs a fixed set of range queries for an application and turns every
//! returned sample into a synthetic log entry.

mod client;
mod error;
mod queries;
mod source;

pub use client::{PrometheusClient, QueryResponse, RangeQuery, Series};
pub use error::MetricsError;
pub use queries::{MetricQuery, query_battery};
pub use source::{MetricsLogSource, series_to_entries};
