use async_trait::async_trait;
use tracing::{debug, info, warn};

use logbrief_logs::{EntryFilter, LineOrigin, LogParser, LogSource};
use logbrief_types::config::KubernetesConfig;
use logbrief_types::{FetchRequest, LogEntry, PodInfo};

use crate::{AppSelector, KubeClient, Kubectl, PodConnector, PodLogs, SourceError};

/// Pod log source with a `kubectl` fallback
pub struct KubeLogSource {
    connector: Box<dyn PodConnector>,
    kubectl: Kubectl,
    insecure: bool,
    max_pods: usize,
}

impl KubeLogSource {
    pub fn new(settings: &KubernetesConfig) -> Self {
        Self::with_connector(KubeClient::new(settings), settings)
    }

    /// Source reading pods through `connector` instead of kubeconfig
    pub fn with_connector(
        connector: impl PodConnector + 'static,
        settings: &KubernetesConfig,
    ) -> Self {
        Self {
            connector: Box::new(connector),
            kubectl: Kubectl::new(settings),
            insecure: settings.insecure_skip_tls_verify,
            max_pods: settings.max_pods,
        }
    }

    /// Connect and list matching pods, retrying once with TLS verification
    /// disabled when the first attempt used it
    async fn discover(
        &self,
        selector: &AppSelector,
    ) -> Result<(Box<dyn PodLogs>, Vec<PodInfo>), SourceError> {
        let err = match self.try_discover(selector, self.insecure).await {
            Ok(found) => return Ok(found),
            Err(err) if self.insecure => return Err(err),
            Err(err) => err,
        };

        if err.is_tls() {
            warn!(error = %err, "TLS verification failed against the Kubernetes API");
        } else {
            warn!(error = %err, "Kubernetes API attempt failed");
        }
        warn!("retrying with TLS verification disabled");
        self.try_discover(selector, true).await
    }

    async fn try_discover(
        &self,
        selector: &AppSelector,
        accept_invalid_certs: bool,
    ) -> Result<(Box<dyn PodLogs>, Vec<PodInfo>), SourceError> {
        let api = self.connector.connect(accept_invalid_certs).await?;
        let pods = api.list_pods(selector).await?;
        Ok((api, pods))
    }

    async fn fetch_with_kubectl(
        &self,
        selector: &AppSelector,
        request: &FetchRequest,
        filter: &EntryFilter,
    ) -> Result<Vec<LogEntry>, SourceError> {
        // kubectl cannot glob, so name the matching label values explicitly
        let label_selector = if selector.is_glob() {
            let values = self.kubectl.app_label_values().await?;
            match selector.set_selector(values.iter().map(String::as_str)) {
                Some(resolved) => resolved,
                None => {
                    info!(app = %request.app_name, "no pods found");
                    return Ok(Vec::new());
                }
            }
        } else {
            selector.label_selector()
        };
        info!(selector = %label_selector, "fetching logs with kubectl");

        let text = self
            .kubectl
            .logs(&label_selector, &request.range.window(), request.limit)
            .await?;
        let origin = LineOrigin::unattributed(&request.app_name);
        Ok(LogParser::parse_lines(&text, &origin, filter, request.limit))
    }
}

#[async_trait]
impl LogSource for KubeLogSource {
    fn name(&self) -> &'static str {
        "kubernetes"
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Vec<LogEntry>> {
        let selector = AppSelector::for_app(&request.app_name)?;
        let filter = EntryFilter::from_request(request);

        match self.discover(&selector).await {
            Ok((api, pods)) => {
                Ok(collect_pod_entries(api.as_ref(), &pods, request, &filter, self.max_pods).await)
            }
            Err(api_err) => {
                warn!(error = %api_err, "Kubernetes API unavailable, falling back to kubectl");
                self.fetch_with_kubectl(&selector, request, &filter)
                    .await
                    .map_err(|kubectl_err| {
                        SourceError::SourceUnavailable(format!("{api_err}; {kubectl_err}")).into()
                    })
            }
        }
    }
}

/// Read and filter logs pod by pod, stopping once `request.limit` entries
/// are collected.
///
/// Only the first `max_pods` pods are read. A pod whose logs cannot be read
/// is skipped.
pub(crate) async fn collect_pod_entries(
    access: &dyn PodLogs,
    pods: &[PodInfo],
    request: &FetchRequest,
    filter: &EntryFilter,
    max_pods: usize,
) -> Vec<LogEntry> {
    if pods.is_empty() {
        info!(app = %request.app_name, "no pods found");
        return Vec::new();
    }
    if pods.len() > max_pods {
        info!(found = pods.len(), max_pods, "reading logs from the first pods only");
    } else {
        info!(found = pods.len(), "reading pod logs");
    }

    let since_seconds = request.range.since_seconds();
    let mut entries = Vec::new();

    for pod in pods.iter().take(max_pods) {
        let remaining = request.limit.saturating_sub(entries.len());
        if remaining == 0 {
            break;
        }

        match access.pod_logs(pod, since_seconds).await {
            Ok(text) => {
                let origin = LineOrigin::pod(&pod.name, &pod.namespace, &request.app_name);
                let found = LogParser::parse_lines(&text, &origin, filter, remaining);
                debug!(pod = %pod.name, kept = found.len(), "read pod logs");
                entries.extend(found);
            }
            Err(err) => {
                warn!(pod = %pod.name, error = %err, "skipping pod");
            }
        }
    }

    entries
}
