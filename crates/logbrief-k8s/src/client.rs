//! Kubernetes client construction and pod log access

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::{ListParams, LogParams};
use kube::config::KubeConfigOptions;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use logbrief_types::config::KubernetesConfig;
use logbrief_types::{ContainerInfo, PodInfo};

use crate::{AppSelector, SourceError};

/// Pod discovery and log reads, abstracted over the transport
#[async_trait]
pub trait PodLogs: Send + Sync {
    /// Pods across all namespaces whose `app` label matches
    async fn list_pods(&self, selector: &AppSelector) -> Result<Vec<PodInfo>, SourceError>;

    /// Log text of the pod's default container since `since_seconds` ago,
    /// each line prefixed with its timestamp
    async fn pod_logs(&self, pod: &PodInfo, since_seconds: i64) -> Result<String, SourceError>;
}

/// Produces pod access, with or without TLS certificate verification
#[async_trait]
pub trait PodConnector: Send + Sync {
    async fn connect(&self, accept_invalid_certs: bool) -> Result<Box<dyn PodLogs>, SourceError>;
}

/// Builds API clients from kubeconfig
pub struct KubeClient {
    context: Option<String>,
    timeout: Duration,
}

impl KubeClient {
    pub fn new(settings: &KubernetesConfig) -> Self {
        Self {
            context: settings.context.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }

    /// Load kubeconfig and build a client, optionally skipping TLS
    /// verification
    pub async fn pod_api(&self, accept_invalid_certs: bool) -> Result<PodApi, SourceError> {
        let mut config = match &self.context {
            Some(context) => kube::Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(context.clone()),
                ..Default::default()
            })
            .await
            .map_err(|e| {
                SourceError::unavailable(&format!("load kubeconfig context {context}"), &e)
            })?,
            None => kube::Config::infer()
                .await
                .map_err(|e| SourceError::unavailable("infer kubeconfig", &e))?,
        };

        config.accept_invalid_certs = accept_invalid_certs;
        config.connect_timeout = Some(self.timeout);
        config.read_timeout = Some(self.timeout);

        let client = kube::Client::try_from(config)
            .map_err(|e| SourceError::unavailable("create client", &e))?;

        debug!(
            context = self.context.as_deref().unwrap_or("<current>"),
            accept_invalid_certs, "kubernetes client ready"
        );

        Ok(PodApi {
            client,
            timeout: self.timeout,
        })
    }
}

#[async_trait]
impl PodConnector for KubeClient {
    async fn connect(&self, accept_invalid_certs: bool) -> Result<Box<dyn PodLogs>, SourceError> {
        Ok(Box::new(self.pod_api(accept_invalid_certs).await?))
    }
}

/// Pod access through the Kubernetes API
#[derive(Clone)]
pub struct PodApi {
    client: kube::Client,
    timeout: Duration,
}

impl PodApi {
    async fn with_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T, SourceError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| SourceError::Timeout {
                operation,
                secs: self.timeout.as_secs(),
            })
    }
}

#[async_trait]
impl PodLogs for PodApi {
    async fn list_pods(&self, selector: &AppSelector) -> Result<Vec<PodInfo>, SourceError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let label_selector = selector.label_selector();

        let list = self
            .with_timeout(
                "list pods",
                pods.list(&ListParams::default().labels(&label_selector)),
            )
            .await?
            .map_err(|e| SourceError::unavailable(&format!("list pods ({label_selector})"), &e))?;

        Ok(list
            .items
            .into_iter()
            .map(pod_to_info)
            .filter(|pod| selector.matches(&pod.labels))
            .collect())
    }

    async fn pod_logs(&self, pod: &PodInfo, since_seconds: i64) -> Result<String, SourceError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &pod.namespace);
        let params = LogParams {
            container: pod.default_container().map(str::to_string),
            since_seconds: Some(since_seconds),
            timestamps: true,
            ..Default::default()
        };

        self.with_timeout("read pod logs", pods.logs(&pod.name, &params))
            .await?
            .map_err(|e| SourceError::PerInstanceFetch {
                pod: pod.name.clone(),
                reason: crate::error::error_chain(&e),
            })
    }
}

/// Convert a k8s Pod to PodInfo
fn pod_to_info(pod: Pod) -> PodInfo {
    let name = pod.metadata.name.unwrap_or_default();
    let namespace = pod.metadata.namespace.unwrap_or_default();
    let mut info = PodInfo::new(name, namespace);

    if let Some(labels) = pod.metadata.labels {
        info.labels = labels;
    }

    // Declared order, so the first entry is the pod's main container
    if let Some(spec) = pod.spec {
        info.containers = spec
            .containers
            .into_iter()
            .map(|c| ContainerInfo::new(c.name))
            .collect();
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    #[test]
    fn test_pod_to_info() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("api-5f7c-abcde".into()),
                namespace: Some("prod".into()),
                labels: Some(BTreeMap::from([("app".to_string(), "api".to_string())])),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![
                    Container {
                        name: "api".into(),
                        ..Default::default()
                    },
                    Container {
                        name: "envoy".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };

        let info = pod_to_info(pod);
        assert_eq!(info.name, "api-5f7c-abcde");
        assert_eq!(info.namespace, "prod");
        assert_eq!(info.default_container(), Some("api"));
        assert_eq!(info.labels.get("app").map(String::as_str), Some("api"));
    }

    #[test]
    fn test_pod_without_spec() {
        let info = pod_to_info(Pod::default());
        assert!(info.name.is_empty());
        assert_eq!(info.default_container(), None);
    }
}
