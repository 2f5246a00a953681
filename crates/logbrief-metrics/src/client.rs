use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use logbrief_types::config::PrometheusConfig;

use crate::MetricsError;

/// Longest slice of an error body kept in diagnostics
const MAX_ERROR_BODY: usize = 512;

/// Envelope returned by the Prometheus HTTP API
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<Series>,
}

/// One labelled time series from a range query
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Series {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    /// `[unix_seconds, "value"]` pairs; values arrive as strings
    #[serde(default)]
    pub values: Vec<(f64, Value)>,
}

impl QueryResponse {
    /// Parse a response body for `query`
    pub fn parse(query: &str, body: &str) -> Result<Vec<Series>, MetricsError> {
        let response: QueryResponse =
            serde_json::from_str(body).map_err(|e| MetricsError::BackendQuery {
                query: query.to_string(),
                reason: format!("malformed response: {e}"),
            })?;
        response.into_series(query)
    }

    fn into_series(self, query: &str) -> Result<Vec<Series>, MetricsError> {
        if self.status != "success" {
            return Err(MetricsError::BackendQuery {
                query: query.to_string(),
                reason: format!(
                    "{}: {}",
                    self.error_type.as_deref().unwrap_or("error"),
                    self.error.as_deref().unwrap_or("no error message")
                ),
            });
        }
        Ok(self.data.map(|d| d.result).unwrap_or_default())
    }
}

/// Range queries against a metrics backend
#[async_trait]
pub trait RangeQuery: Send + Sync {
    /// Run one range query
    async fn query_range(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
    ) -> Result<Vec<Series>, MetricsError>;
}

/// Minimal client for the Prometheus `query_range` endpoint
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(settings: &PrometheusConfig) -> Result<Self, MetricsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .danger_accept_invalid_certs(settings.insecure_skip_tls_verify)
            .build()
            .map_err(MetricsError::Client)?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn query_range_url(&self) -> String {
        format!("{}/api/v1/query_range", self.base_url)
    }
}

#[async_trait]
impl RangeQuery for PrometheusClient {
    async fn query_range(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
    ) -> Result<Vec<Series>, MetricsError> {
        let url = self.query_range_url();
        let start = start.timestamp().to_string();
        let end = end.timestamp().to_string();
        debug!(%url, query, %start, %end, step, "prometheus range query");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("query", query),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("step", step),
            ])
            .send()
            .await
            .map_err(|source| MetricsError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| MetricsError::Http { url, source })?;

        if !status.is_success() {
            return Err(MetricsError::BackendQuery {
                query: query.to_string(),
                reason: format!("HTTP {status}: {}", truncate(body.trim(), MAX_ERROR_BODY)),
            });
        }

        QueryResponse::parse(query, &body)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
