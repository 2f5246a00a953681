mod cli;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use logbrief_k8s::KubeLogSource;
use logbrief_logs::LogSource;
use logbrief_metrics::MetricsLogSource;
use logbrief_summary::MessagesSummarizer;
use logbrief_types::{Config, FetchRequest, TimeRange};

use crate::cli::{Args, SourceKind};
use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::report::ReportWriter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    // Reject a bad range before touching the network
    let range = TimeRange::parse(&args.time_range)?;

    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let api_key = std::env::var(&config.summarizer.api_key_env).unwrap_or_default();
    if api_key.trim().is_empty() {
        warn!(
            var = %config.summarizer.api_key_env,
            "no API key set, logs will be fetched but not analyzed"
        );
    }
    let summarizer = MessagesSummarizer::new(&config.summarizer, api_key)?;

    let source: Box<dyn LogSource> = match args.source {
        SourceKind::Kubernetes => Box::new(KubeLogSource::new(&config.kubernetes)),
        SourceKind::Prometheus => Box::new(MetricsLogSource::new(&config.prometheus)?),
    };

    let request = FetchRequest::new(&args.app, range.resolve())
        .with_contains(args.message.clone())
        .with_level(args.log_type)
        .with_limit(config.kubernetes.max_lines);
    info!(
        app = %request.app_name,
        start = %request.range.start,
        end = %request.range.end,
        source = source.name(),
        "starting run"
    );

    let pipeline = Pipeline::new(
        source.as_ref(),
        &summarizer,
        ReportWriter::new(config.output.dir.clone()),
        config.output.max_entries,
        config.summarizer.max_output_tokens,
    );
    let run = pipeline.run(&request).await?;
    info!(state = ?run.final_state(), steps = run.transitions.len(), "run finished");

    match run.outcome {
        PipelineOutcome::Done { report, analysis } => {
            info!(chars = analysis.len(), "analysis complete");
            println!("\nAnalysis saved to {}", report.display());
            println!(
                "All log analyses are stored in the '{}/' directory",
                config.output.dir.display()
            );
        }
        // Already reported to the user by the pipeline
        PipelineOutcome::Empty | PipelineOutcome::Failed { .. } => {}
    }

    Ok(())
}

/// RUST_LOG wins when set; otherwise `-v` picks the level
fn log_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|raw| !raw.trim().is_empty()) {
        return EnvFilter::new(directives);
    }
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    EnvFilter::default().add_directive(level.into())
}

/// Command-line flags win over the config file and environment
fn apply_overrides(config: &mut Config, args: &Args) {
    if args.no_ssl_verify {
        config.kubernetes.insecure_skip_tls_verify = true;
        config.prometheus.insecure_skip_tls_verify = true;
    }
    if let Some(url) = &args.prometheus_url {
        config.prometheus.url = url.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(max) = args.max_entries {
        config.output.max_entries = max;
    }
}
