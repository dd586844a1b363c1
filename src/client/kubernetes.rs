//! Kubernetes Cluster Client
//!
//! Implements [`ClusterClient`] over `kube::Api<DynamicObject>`, resolving
//! each [`ResourceKind`] to its API resource through the k8s-openapi types.

use crate::domain::ports::{ClusterClient, ListOptions, ResourceKind};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    ConfigMap, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod,
    ReplicationController, Secret, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, Role};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, ListParams};
use kube::config::KubeConfigOptions;
use kube::core::{ApiResource, DynamicObject};
use kube::Client;
use tracing::debug;

/// Map a resource kind to the API resource used for dynamic access
pub fn api_resource(kind: ResourceKind) -> ApiResource {
    match kind {
        ResourceKind::Pod => ApiResource::erase::<Pod>(&()),
        ResourceKind::Event => ApiResource::erase::<Event>(&()),
        ResourceKind::Namespace => ApiResource::erase::<Namespace>(&()),
        ResourceKind::Deployment => ApiResource::erase::<Deployment>(&()),
        ResourceKind::ReplicaSet => ApiResource::erase::<ReplicaSet>(&()),
        ResourceKind::ReplicationController => ApiResource::erase::<ReplicationController>(&()),
        ResourceKind::DaemonSet => ApiResource::erase::<DaemonSet>(&()),
        ResourceKind::StatefulSet => ApiResource::erase::<StatefulSet>(&()),
        ResourceKind::Job => ApiResource::erase::<Job>(&()),
        ResourceKind::CronJob => ApiResource::erase::<CronJob>(&()),
        ResourceKind::Service => ApiResource::erase::<Service>(&()),
        ResourceKind::Ingress => ApiResource::erase::<Ingress>(&()),
        ResourceKind::ConfigMap => ApiResource::erase::<ConfigMap>(&()),
        ResourceKind::Secret => ApiResource::erase::<Secret>(&()),
        ResourceKind::PersistentVolumeClaim => ApiResource::erase::<PersistentVolumeClaim>(&()),
        ResourceKind::Node => ApiResource::erase::<Node>(&()),
        ResourceKind::PersistentVolume => ApiResource::erase::<PersistentVolume>(&()),
        ResourceKind::StorageClass => ApiResource::erase::<StorageClass>(&()),
        ResourceKind::Role => ApiResource::erase::<Role>(&()),
        ResourceKind::ClusterRole => ApiResource::erase::<ClusterRole>(&()),
    }
}

/// Cluster client backed by a live Kubernetes API server
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the local kubeconfig or in-cluster environment
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    /// Build a client for a named kubeconfig context
    pub async fn from_context(context: &str) -> Result<Self> {
        let options = KubeConfigOptions {
            context: Some(context.to_string()),
            ..Default::default()
        };
        let config = kube::Config::from_kubeconfig(&options)
            .await
            .map_err(|e| Error::Configuration(format!("kubeconfig context {}: {}", context, e)))?;
        Ok(Self::new(Client::try_from(config)?))
    }

    fn api(&self, kind: ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = api_resource(kind);
        match namespace {
            Some(ns) if kind.is_namespaced() => {
                Api::namespaced_with(self.client.clone(), ns, &resource)
            }
            _ => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        options: &ListOptions,
    ) -> Result<Vec<DynamicObject>> {
        let mut params = ListParams::default();
        params.label_selector = options.label_selector.clone();
        params.field_selector = options.field_selector.clone();

        let list = self.api(kind, namespace).list(&params).await?;
        debug!(kind = %kind, namespace = ?namespace, items = list.items.len(), "listed");
        Ok(list.items)
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        let object = self.api(kind, namespace).get(name).await?;
        debug!(kind = %kind, namespace = ?namespace, name, "fetched");
        Ok(object)
    }
}
