use std::error::Error as StdError;

use thiserror::Error;

/// Fragments that mark a failure as a transport-security problem
const TLS_MARKERS: [&str; 6] = ["certificate", "tls", "ssl", "x509", "handshake", "unknownissuer"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("kubernetes API unavailable: {0}")]
    SourceUnavailable(String),

    #[error("kubernetes API rejected the transport security settings: {0}")]
    InsecureTransport(String),

    #[error("failed to fetch logs for pod {pod}: {reason}")]
    PerInstanceFetch { pod: String, reason: String },

    #[error("kubectl fallback failed: {0}")]
    Kubectl(String),

    #[error("invalid app name pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

impl SourceError {
    /// Wrap a setup or discovery failure, singling out TLS problems
    pub fn unavailable(operation: &str, error: &(dyn StdError + 'static)) -> Self {
        let message = format!("{operation}: {}", error_chain(error));
        if is_tls_failure(&message) {
            Self::InsecureTransport(message)
        } else {
            Self::SourceUnavailable(message)
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, Self::InsecureTransport(_))
    }
}

/// Render an error with all of its sources, outermost first
pub(crate) fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        current = cause.source();
    }
    parts.join(": ")
}

pub(crate) fn is_tls_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    TLS_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_failures_are_distinguished() {
        let err = std::io::Error::other("invalid peer certificate: UnknownIssuer");
        let classified = SourceError::unavailable("list pods", &err);
        assert!(classified.is_tls());

        let err = std::io::Error::other("connection refused");
        let classified = SourceError::unavailable("list pods", &err);
        assert!(matches!(classified, SourceError::SourceUnavailable(_)));
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let inner = std::io::Error::other("x509: certificate signed by unknown authority");
        let outer = SourceError::PerInstanceFetch {
            pod: "api-1".into(),
            reason: "boom".into(),
        };
        assert_eq!(
            error_chain(&outer),
            "failed to fetch logs for pod api-1: boom"
        );
        assert!(error_chain(&inner).contains("x509"));
    }
}
