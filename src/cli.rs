use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use logbrief_types::LogLevel;

/// logbrief - fetch recent logs or metrics for an app and summarize them
#[derive(Parser, Debug)]
#[command(name = "logbrief")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Application name, matched against the `app` label (`*` and `?` glob)
    #[arg(short, long)]
    pub app: String,

    /// How far back to look, e.g. 30m, 1h, 2d
    #[arg(short, long, default_value = "1h")]
    pub time_range: String,

    /// Only keep entries whose message contains this text (case-insensitive)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Only keep entries of this level (error, warning, info, debug)
    #[arg(short, long)]
    pub log_type: Option<LogLevel>,

    /// Where to read from
    #[arg(short, long, value_enum, default_value_t = SourceKind::Kubernetes)]
    pub source: SourceKind,

    /// Skip TLS certificate verification for the Kubernetes API and Prometheus
    #[arg(long)]
    pub no_ssl_verify: bool,

    /// Config file (defaults to $LOGBRIEF_CONFIG or ./logbrief.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Prometheus base URL
    #[arg(long, value_name = "URL")]
    pub prometheus_url: Option<String>,

    /// Directory reports are written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Most entries handed to the summarizer
    #[arg(long)]
    pub max_entries: Option<usize>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Kubernetes,
    Prometheus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["logbrief", "--app", "checkout"]).unwrap();
        assert_eq!(args.app, "checkout");
        assert_eq!(args.time_range, "1h");
        assert_eq!(args.source, SourceKind::Kubernetes);
        assert!(args.message.is_none());
        assert!(args.log_type.is_none());
        assert!(!args.no_ssl_verify);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "logbrief", "-a", "api*", "-t", "2d", "-m", "timeout", "-l", "warn", "-s",
            "prometheus", "-vv",
        ])
        .unwrap();
        assert_eq!(args.app, "api*");
        assert_eq!(args.time_range, "2d");
        assert_eq!(args.message.as_deref(), Some("timeout"));
        assert_eq!(args.log_type, Some(LogLevel::Warning));
        assert_eq!(args.source, SourceKind::Prometheus);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "logbrief",
            "--app",
            "checkout",
            "--no-ssl-verify",
            "--prometheus-url",
            "https://prom.internal",
            "--output-dir",
            "/tmp/reports",
            "--max-entries",
            "50",
        ])
        .unwrap();
        assert!(args.no_ssl_verify);
        assert_eq!(args.prometheus_url.as_deref(), Some("https://prom.internal"));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/reports")));
        assert_eq!(args.max_entries, Some(50));
    }

    #[test]
    fn test_app_is_required() {
        assert!(Args::try_parse_from(["logbrief"]).is_err());
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(Args::try_parse_from(["logbrief", "-a", "x", "-l", "trace"]).is_err());
    }
}
