use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use logbrief_logs::{EntryFilter, LogSource};
use logbrief_types::config::PrometheusConfig;
use logbrief_types::{FetchRequest, LogEntry, RawMetric};

use crate::{MetricQuery, MetricsError, PrometheusClient, RangeQuery, Series, query_battery};

/// Metric samples reported as log entries
pub struct MetricsLogSource {
    backend: Box<dyn RangeQuery>,
    pause: Duration,
    max_entries: usize,
}

impl MetricsLogSource {
    pub fn new(settings: &PrometheusConfig) -> Result<Self, MetricsError> {
        Ok(Self::with_backend(PrometheusClient::new(settings)?, settings))
    }

    /// Source querying `backend` instead of the configured Prometheus URL
    pub fn with_backend(backend: impl RangeQuery + 'static, settings: &PrometheusConfig) -> Self {
        Self {
            backend: Box::new(backend),
            pause: Duration::from_millis(settings.query_pause_ms),
            max_entries: settings.max_entries,
        }
    }
}

#[async_trait]
impl LogSource for MetricsLogSource {
    fn name(&self) -> &'static str {
        "prometheus"
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Vec<LogEntry>> {
        let range = &request.range;
        let queries = query_battery(&request.app_name, &range.window(), request.level);
        // Queries are chosen by level, so only the text filter applies to samples
        let filter = EntryFilter::from_request(request).text_only();
        let mut entries = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pause).await;
            }

            match self
                .backend
                .query_range(&query.promql, range.start, range.end, range.step())
                .await
            {
                Ok(series) => {
                    let before = entries.len();
                    for s in &series {
                        entries.extend(series_to_entries(query, s, &request.app_name, &filter));
                    }
                    debug!(
                        query = query.name,
                        series = series.len(),
                        entries = entries.len() - before,
                        "prometheus query done"
                    );
                }
                Err(err) => {
                    warn!(query = query.name, error = %err, "skipping metrics query");
                }
            }

            if entries.len() >= self.max_entries {
                warn!(max = self.max_entries, "metrics entry cap reached, skipping remaining queries");
                entries.truncate(self.max_entries);
                break;
            }
        }

        info!(app = %request.app_name, entries = entries.len(), "fetched metrics");
        Ok(entries)
    }
}

/// Turn each usable sample of a series into an entry.
///
/// Samples with missing, `NaN` or unparseable values are skipped.
pub fn series_to_entries(
    query: &MetricQuery,
    series: &Series,
    app_name: &str,
    filter: &EntryFilter,
) -> Vec<LogEntry> {
    let labels: std::collections::BTreeMap<String, String> = series
        .metric
        .iter()
        .filter(|(k, _)| k.as_str() != "__name__")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let label_str = labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");

    series
        .values
        .iter()
        .filter_map(|(ts, raw)| {
            let (text, value) = sample_value(raw)?;
            let message = format!("{}: {label_str} = {text}", query.name);
            if !filter.matches_text(&message) {
                return None;
            }

            Some(
                LogEntry::new(label_str.clone(), app_name, message)
                    .with_timestamp(sample_time(*ts))
                    .with_level(Some(query.level))
                    .with_raw_metric(RawMetric {
                        metric: query.name.to_string(),
                        labels: labels.clone(),
                        value,
                    }),
            )
        })
        .collect()
}

/// Sample value as reported and as a number
fn sample_value(raw: &Value) -> Option<(String, f64)> {
    let (text, value) = match raw {
        Value::String(s) => (s.clone(), s.parse::<f64>().ok()?),
        Value::Number(n) => (n.to_string(), n.as_f64()?),
        _ => return None,
    };
    if value.is_nan() {
        return None;
    }
    Some((text, value))
}

fn sample_time(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.trunc() as i64;
    let nanos = ((ts - ts.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use logbrief_types::LogLevel;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    type Calls = Arc<Mutex<Vec<(String, Instant)>>>;

    /// Backend answering every query with `samples` points, except queries
    /// mentioning `failing`
    struct FakeBackend {
        failing: Option<&'static str>,
        samples: usize,
        calls: Calls,
    }

    #[async_trait]
    impl RangeQuery for FakeBackend {
        async fn query_range(
            &self,
            query: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _step: &str,
        ) -> Result<Vec<Series>, MetricsError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), Instant::now()));
            if self.failing.is_some_and(|name| query.contains(name)) {
                return Err(MetricsError::BackendQuery {
                    query: query.to_string(),
                    reason: "HTTP 503 Service Unavailable: overloaded".into(),
                });
            }
            Ok(vec![Series {
                metric: BTreeMap::from([("pod".to_string(), "checkout-1".to_string())]),
                values: (0..self.samples)
                    .map(|i| (1700000000.0 + i as f64 * 15.0, json!("1")))
                    .collect(),
            }])
        }
    }

    fn backend(failing: Option<&'static str>, samples: usize) -> (FakeBackend, Calls) {
        let calls = Calls::default();
        let fake = FakeBackend {
            failing,
            samples,
            calls: Arc::clone(&calls),
        };
        (fake, calls)
    }

    fn settings(pause_ms: u64, max_entries: usize) -> PrometheusConfig {
        PrometheusConfig {
            query_pause_ms: pause_ms,
            max_entries,
            ..Default::default()
        }
    }

    fn request(level: Option<LogLevel>) -> FetchRequest {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        FetchRequest::new("checkout", logbrief_types::TimeRange::parse("1h").unwrap().resolve_at(now))
            .with_level(level)
    }

    fn query() -> MetricQuery {
        query_battery("checkout", "1h", Some(LogLevel::Error)).remove(0)
    }

    fn series(values: Vec<(f64, Value)>) -> Series {
        Series {
            metric: BTreeMap::from([
                ("__name__".to_string(), "http_requests_total".to_string()),
                ("status_code".to_string(), "500".to_string()),
                ("path".to_string(), "/pay".to_string()),
            ]),
            values,
        }
    }

    #[test]
    fn test_nan_sample_is_skipped() {
        let s = series(vec![(1700000000.0, json!("NaN")), (1700000060.0, json!("2.5"))]);
        let entries = series_to_entries(&query(), &s, "checkout", &EntryFilter::default());

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.message(), "error_rate: path=/pay, status_code=500 = 2.5");
        assert_eq!(entry.source_id(), "path=/pay, status_code=500");
        assert_eq!(entry.app_name(), "checkout");
        assert_eq!(entry.level(), Some(LogLevel::Error));
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 14, 20).unwrap())
        );

        let raw = entry.raw_metric().unwrap();
        assert_eq!(raw.metric, "error_rate");
        assert_eq!(raw.value, 2.5);
        assert!(!raw.labels.contains_key("__name__"));
    }

    #[test]
    fn test_missing_and_garbage_values_are_skipped() {
        let s = series(vec![
            (1700000000.0, Value::Null),
            (1700000015.0, json!("not-a-number")),
            (1700000030.0, json!(3)),
        ]);
        let entries = series_to_entries(&query(), &s, "checkout", &EntryFilter::default());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message().ends_with("= 3"));
    }

    #[test]
    fn test_text_filter_on_message() {
        let s = series(vec![(1700000000.0, json!("1")), (1700000015.0, json!("4"))]);
        let filter = EntryFilter::new(Some("/PAY".into()), None);
        assert_eq!(series_to_entries(&query(), &s, "checkout", &filter).len(), 2);

        let filter = EntryFilter::new(Some("/cart".into()), None);
        assert!(series_to_entries(&query(), &s, "checkout", &filter).is_empty());
    }

    #[test]
    fn test_fractional_timestamp() {
        let ts = sample_time(1700000000.25).unwrap();
        assert_eq!(ts.timestamp(), 1700000000);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
        assert!(sample_time(f64::NAN).is_none());
    }

    #[tokio::test]
    async fn test_failed_query_is_skipped() {
        // error_count is the second error query
        let (fake, calls) = backend(Some("http_server_errors_total"), 2);
        let source = MetricsLogSource::with_backend(fake, &settings(0, 5000));

        let entries = source.fetch(&request(Some(LogLevel::Error))).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        let names: Vec<&str> = entries
            .iter()
            .filter_map(|e| e.raw_metric())
            .map(|raw| raw.metric.as_str())
            .collect();
        assert_eq!(
            names,
            ["error_rate", "error_rate", "exception_count", "exception_count"]
        );
    }

    #[tokio::test]
    async fn test_pause_only_between_queries() {
        let (fake, calls) = backend(None, 1);
        let source = MetricsLogSource::with_backend(fake, &settings(150, 5000));

        let started = Instant::now();
        source.fetch(&request(Some(LogLevel::Info))).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.duration_since(started) < Duration::from_millis(150));
        assert!(calls[1].1.duration_since(calls[0].1) >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_entry_cap_stops_remaining_queries() {
        let (fake, calls) = backend(None, 2);
        let source = MetricsLogSource::with_backend(fake, &settings(0, 3));

        let entries = source.fetch(&request(None)).await.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(entries[2].raw_metric().unwrap().metric, "error_count");
    }
}
