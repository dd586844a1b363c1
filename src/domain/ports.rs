//! Domain Ports - Boundary to the remote cluster API
//!
//! The aggregation core only ever talks to the cluster through
//! [`ClusterClient`]. Adapters in [`crate::client`] implement it over a real
//! `kube::Client` or over in-process state.

use crate::error::{Error, Result};
use async_trait::async_trait;
use kube::core::DynamicObject;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Resource Kinds
// =============================================================================

/// Resource kinds the console aggregates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pod,
    Event,
    Namespace,
    Deployment,
    ReplicaSet,
    ReplicationController,
    DaemonSet,
    StatefulSet,
    Job,
    CronJob,
    Service,
    Ingress,
    ConfigMap,
    Secret,
    PersistentVolumeClaim,
    Node,
    PersistentVolume,
    StorageClass,
    Role,
    ClusterRole,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 20] = [
        ResourceKind::Pod,
        ResourceKind::Event,
        ResourceKind::Namespace,
        ResourceKind::Deployment,
        ResourceKind::ReplicaSet,
        ResourceKind::ReplicationController,
        ResourceKind::DaemonSet,
        ResourceKind::StatefulSet,
        ResourceKind::Job,
        ResourceKind::CronJob,
        ResourceKind::Service,
        ResourceKind::Ingress,
        ResourceKind::ConfigMap,
        ResourceKind::Secret,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::Node,
        ResourceKind::PersistentVolume,
        ResourceKind::StorageClass,
        ResourceKind::Role,
        ResourceKind::ClusterRole,
    ];

    /// Lowercase identifier used in URLs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Event => "event",
            ResourceKind::Namespace => "namespace",
            ResourceKind::Deployment => "deployment",
            ResourceKind::ReplicaSet => "replicaset",
            ResourceKind::ReplicationController => "replicationcontroller",
            ResourceKind::DaemonSet => "daemonset",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::Job => "job",
            ResourceKind::CronJob => "cronjob",
            ResourceKind::Service => "service",
            ResourceKind::Ingress => "ingress",
            ResourceKind::ConfigMap => "configmap",
            ResourceKind::Secret => "secret",
            ResourceKind::PersistentVolumeClaim => "persistentvolumeclaim",
            ResourceKind::Node => "node",
            ResourceKind::PersistentVolume => "persistentvolume",
            ResourceKind::StorageClass => "storageclass",
            ResourceKind::Role => "role",
            ResourceKind::ClusterRole => "clusterrole",
        }
    }

    /// Whether objects of this kind live inside a namespace
    pub fn is_namespaced(&self) -> bool {
        !matches!(
            self,
            ResourceKind::Namespace
                | ResourceKind::Node
                | ResourceKind::PersistentVolume
                | ResourceKind::StorageClass
                | ResourceKind::ClusterRole
        )
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

// =============================================================================
// List Options
// =============================================================================

/// Options forwarded to the remote list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Label selector, e.g. `app=web,tier=frontend`
    pub label_selector: Option<String>,
    /// Field selector, e.g. `involvedObject.name=web-0`
    pub field_selector: Option<String>,
}

impl ListOptions {
    /// List everything
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn with_field_selector(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }

    pub fn with_label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }
}

// =============================================================================
// Cluster Client Port
// =============================================================================

/// Remote cluster API as seen by the aggregation core
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List objects of `kind`.
    ///
    /// `namespace = None` lists across all namespaces; it is always `None`
    /// for cluster-scoped kinds.
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        options: &ListOptions,
    ) -> Result<Vec<DynamicObject>>;

    /// Fetch a single object by name
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_kind_round_trip_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert_eq!("Deployment".parse::<ResourceKind>().unwrap(), ResourceKind::Deployment);
        assert_matches!("widget".parse::<ResourceKind>(), Err(Error::UnknownKind(_)));
    }

    #[test]
    fn test_namespaced() {
        assert!(ResourceKind::Pod.is_namespaced());
        assert!(!ResourceKind::Namespace.is_namespaced());
        assert!(ResourceKind::Role.is_namespaced());
        for kind in [
            ResourceKind::Node,
            ResourceKind::PersistentVolume,
            ResourceKind::StorageClass,
            ResourceKind::ClusterRole,
        ] {
            assert!(!kind.is_namespaced(), "{} should be cluster-scoped", kind);
        }
    }

    #[test]
    fn test_list_options_builder() {
        let options = ListOptions::everything().with_field_selector("involvedObject.name=web");
        assert_eq!(options.field_selector.as_deref(), Some("involvedObject.name=web"));
        assert!(options.label_selector.is_none());
    }
}
