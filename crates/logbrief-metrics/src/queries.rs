use logbrief_types::LogLevel;

/// A named PromQL range query and the level its samples are reported at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricQuery {
    pub name: &'static str,
    pub level: LogLevel,
    pub promql: String,
}

impl MetricQuery {
    fn new(name: &'static str, level: LogLevel, promql: String) -> Self {
        Self {
            name,
            level,
            promql,
        }
    }
}

/// Queries to run for an application.
///
/// With no level, every group runs in the order error, info, warning.
/// `window` is the lookback as a PromQL range such as `1h` or `48h`.
/// Debug has no metrics counterpart and yields no queries.
pub fn query_battery(app_name: &str, window: &str, level: Option<LogLevel>) -> Vec<MetricQuery> {
    let wants = |l: LogLevel| level.is_none() || level == Some(l);
    let app = format!(r#"{{app="{}"}}"#, escape_label_value(app_name));
    let container = format!(r#"{{container="{}"}}"#, escape_label_value(app_name));
    let mut queries = Vec::new();

    if wants(LogLevel::Error) {
        queries.push(MetricQuery::new(
            "error_rate",
            LogLevel::Error,
            format!("sum(rate(http_requests_total{app}[5m])) by (status_code, path) > 0"),
        ));
        queries.push(MetricQuery::new(
            "error_count",
            LogLevel::Error,
            format!("sum(increase(http_server_errors_total{app}[{window}])) by (path, status_code)"),
        ));
        queries.push(MetricQuery::new(
            "exception_count",
            LogLevel::Error,
            format!("sum(increase(application_exceptions_total{app}[{window}])) by (exception_type)"),
        ));
    }

    if wants(LogLevel::Info) {
        queries.push(MetricQuery::new(
            "request_rate",
            LogLevel::Info,
            format!("sum(rate(http_requests_total{app}[5m])) by (path)"),
        ));
        queries.push(MetricQuery::new(
            "response_time",
            LogLevel::Info,
            format!(
                "histogram_quantile(0.95, sum(rate(http_request_duration_seconds_bucket{app}[5m])) by (path, le))"
            ),
        ));
    }

    if wants(LogLevel::Warning) {
        queries.push(MetricQuery::new(
            "memory_usage",
            LogLevel::Warning,
            format!("sum(container_memory_usage_bytes{container}) by (pod)"),
        ));
        queries.push(MetricQuery::new(
            "cpu_usage",
            LogLevel::Warning,
            format!("sum(rate(container_cpu_usage_seconds_total{container}[5m])) by (pod)"),
        ));
    }

    queries
}

/// Escape a string for use inside a double-quoted PromQL label matcher
fn escape_label_value(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', "\\\"")
}
