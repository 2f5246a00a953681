use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use logbrief_types::config::KubernetesConfig;

use crate::SourceError;
use crate::selector::APP_LABEL;

/// Runs `kubectl logs` when the API client cannot be used
#[derive(Clone, Debug)]
pub struct Kubectl {
    program: String,
    context: Option<String>,
    insecure: bool,
    timeout: Duration,
}

impl Kubectl {
    pub fn new(settings: &KubernetesConfig) -> Self {
        Self {
            program: settings.kubectl_path.clone(),
            context: settings.context.clone(),
            insecure: settings.insecure_skip_tls_verify,
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }

    /// Arguments for `kubectl logs` scoped by a label selector
    pub fn logs_args(&self, label_selector: &str, since: &str, tail: usize) -> Vec<String> {
        self.with_common_flags(vec![
            "logs".to_string(),
            "-l".to_string(),
            label_selector.to_string(),
            format!("--since={since}"),
            "--tail".to_string(),
            tail.to_string(),
        ])
    }

    /// Arguments listing the `app` label value of every labelled pod
    pub fn app_labels_args(&self) -> Vec<String> {
        self.with_common_flags(vec![
            "get".to_string(),
            "pods".to_string(),
            "-l".to_string(),
            APP_LABEL.to_string(),
            "-o".to_string(),
            format!("jsonpath={{..metadata.labels.{APP_LABEL}}}"),
        ])
    }

    fn with_common_flags(&self, mut args: Vec<String>) -> Vec<String> {
        if let Some(context) = &self.context {
            args.push(format!("--context={context}"));
        }
        if self.insecure {
            args.push("--insecure-skip-tls-verify".to_string());
        }
        args
    }

    /// Fetch logs for every pod matching the selector, as plain text
    pub async fn logs(
        &self,
        label_selector: &str,
        since: &str,
        tail: usize,
    ) -> Result<String, SourceError> {
        self.run("kubectl logs", self.logs_args(label_selector, since, tail))
            .await
    }

    /// `app` label values currently in use, one per labelled pod
    pub async fn app_label_values(&self) -> Result<Vec<String>, SourceError> {
        let out = self.run("kubectl get pods", self.app_labels_args()).await?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    async fn run(&self, operation: &'static str, args: Vec<String>) -> Result<String, SourceError> {
        debug!(program = %self.program, ?args, "running kubectl");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| SourceError::Timeout {
            operation,
            secs: self.timeout.as_secs(),
        })?
        .map_err(|e| SourceError::Kubectl(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Kubectl(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
