//! Configuration: TOML file + `LOGBRIEF_*` env overrides + defaults.
//!
//! The resolved [`Config`] is handed to each source's constructor; nothing
//! below the binary reads the environment on its own.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{LogbriefError, Result};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "logbrief.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub kubernetes: KubernetesConfig,
    pub prometheus: PrometheusConfig,
    pub summarizer: SummarizerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KubernetesConfig {
    /// kubeconfig context, current context when unset
    pub context: Option<String>,
    /// Skip TLS verification from the first attempt on
    pub insecure_skip_tls_verify: bool,
    /// Pods inspected per run
    pub max_pods: usize,
    /// Entries collected by the pod log source
    pub max_lines: usize,
    pub request_timeout_secs: u64,
    pub kubectl_path: String,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            context: None,
            insecure_skip_tls_verify: false,
            max_pods: 20,
            max_lines: 500,
            request_timeout_secs: 30,
            kubectl_path: "kubectl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrometheusConfig {
    pub url: String,
    pub insecure_skip_tls_verify: bool,
    pub request_timeout_secs: u64,
    /// Pause between successive range queries
    pub query_pause_ms: u64,
    /// Hard cap on synthesized entries
    pub max_entries: usize,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: "http://prometheus:9090".to_string(),
            insecure_skip_tls_verify: false,
            request_timeout_secs: 30,
            query_pause_ms: 100,
            max_entries: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Messages API endpoint
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub api_version: String,
    /// Models tried in order; the first one that answers is reused
    pub models: Vec<String>,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_version: "2023-06-01".to_string(),
            models: vec![
                "claude-3-7-sonnet-20250219".to_string(),
                "claude-3-5-sonnet-20241022".to_string(),
                "claude-3-haiku-20240307".to_string(),
            ],
            max_output_tokens: 4096,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory reports are written to, created on demand
    pub dir: PathBuf,
    /// Entries handed to the summarizer
    pub max_entries: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("log_analysis"),
            max_entries: 200,
        }
    }
}

impl Config {
    /// Load config from an explicit path or the default lookup, then apply
    /// env overrides.
    ///
    /// A missing file is only an error when the path was given explicitly.
    /// The result is not validated; callers layer their own overrides on top
    /// and call [`Config::validate`] last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path_buf, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match env_var("LOGBRIEF_CONFIG") {
                Some(p) => (PathBuf::from(p), true),
                None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| LogbriefError::ConfigIo {
                path: path_buf.clone(),
                source,
            })?;
            Self::from_toml(&raw)?
        } else if explicit {
            return Err(LogbriefError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(ctx) = env_var("LOGBRIEF_KUBE_CONTEXT") {
            self.kubernetes.context = Some(ctx);
        }
        set_env_bool(
            "LOGBRIEF_KUBE_INSECURE",
            &mut self.kubernetes.insecure_skip_tls_verify,
        )?;
        set_env_u64(
            "LOGBRIEF_KUBE_TIMEOUT_SECS",
            &mut self.kubernetes.request_timeout_secs,
        )?;
        if let Some(url) = env_var("LOGBRIEF_PROMETHEUS_URL") {
            self.prometheus.url = url;
        }
        set_env_u64(
            "LOGBRIEF_PROMETHEUS_TIMEOUT_SECS",
            &mut self.prometheus.request_timeout_secs,
        )?;
        if let Some(endpoint) = env_var("LOGBRIEF_SUMMARIZER_ENDPOINT") {
            self.summarizer.endpoint = endpoint;
        }
        if let Some(models) = env_var("LOGBRIEF_SUMMARIZER_MODELS") {
            self.summarizer.models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = env_var("LOGBRIEF_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |details: &str| {
            Err(LogbriefError::Config {
                details: details.to_string(),
            })
        };
        if self.kubernetes.max_pods == 0 {
            return invalid("kubernetes.max_pods must be at least 1");
        }
        if self.kubernetes.max_lines == 0 {
            return invalid("kubernetes.max_lines must be at least 1");
        }
        if self.prometheus.url.trim().is_empty() {
            return invalid("prometheus.url must not be empty");
        }
        if self.summarizer.models.is_empty() {
            return invalid("summarizer.models must list at least one model");
        }
        if self.output.max_entries == 0 {
            return invalid("output.max_entries must be at least 1");
        }
        if self.kubernetes.request_timeout_secs == 0 {
            return invalid("kubernetes.request_timeout_secs must be at least 1");
        }
        if self.prometheus.request_timeout_secs == 0 {
            return invalid("prometheus.request_timeout_secs must be at least 1");
        }
        if self.summarizer.request_timeout_secs == 0 {
            return invalid("summarizer.request_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.trim().parse::<u64>().map_err(|error| LogbriefError::Config {
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(LogbriefError::Config {
                    details: format!("{name}={raw:?}: expected a boolean"),
                });
            }
        };
    }
    Ok(())
}
