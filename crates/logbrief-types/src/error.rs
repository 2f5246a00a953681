use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogbriefError>;

/// Errors raised before any source is contacted
#[derive(Debug, Error)]
pub enum LogbriefError {
    #[error("invalid time range '{input}': {reason}")]
    InvalidTimeRange { input: String, reason: &'static str },

    #[error("invalid log level '{0}', expected one of error, warning, info, debug")]
    InvalidLevel(String),

    #[error("invalid configuration: {details}")]
    Config { details: String },

    #[error("missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration parse failure: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
