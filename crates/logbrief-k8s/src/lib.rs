//! Kubernetes log source for logbrief
//!
//! Pod logs are read through the Kubernetes API when a client can be built
//! and pods can be listed; otherwise `kubectl logs` is used as a fallback.

mod client;
mod error;
mod kubectl;
mod selector;
mod source;

pub use client::{KubeClient, PodApi, PodConnector, PodLogs};
pub use error::SourceError;
pub use kubectl::Kubectl;
pub use selector::AppSelector;
pub use source::KubeLogSource;

// Re-export types that are used in our public API
pub use logbrief_types::{ContainerInfo, PodInfo};
