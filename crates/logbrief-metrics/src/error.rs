use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("query '{query}' failed: {reason}")]
    BackendQuery { query: String, reason: String },
}
