use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("no API key found in ${0}")]
    MissingCredentials(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model {model} returned HTTP {status}: {body}")]
    Status {
        model: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response format: {0}")]
    Format(String),

    #[error("failed to encode log entries: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no models configured")]
    NoModels,

    #[error("all {tried} models failed, last error: {last}")]
    Exhausted {
        tried: usize,
        #[source]
        last: Box<SummaryError>,
    },
}
