//! Single object detail with its events

use super::bundle::FetchBundle;
use super::channel::decode;
use super::common::{Aggregated, ObjectMetaView, ResourceList, TypeMeta};
use super::kinds::ListedResource;
use super::list::list_from_bundle;
use super::namespace::NamespaceQuery;
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::{ClusterClient, ListOptions, ResourceKind};
use crate::error::{Error, NonCriticalErrors, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    ConfigMap, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod,
    ReplicationController, Secret, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, Role};
use k8s_openapi::api::storage::v1::StorageClass;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetail {
    pub object_meta: ObjectMetaView,
    pub type_meta: TypeMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Full object as returned by the cluster
    pub object: serde_json::Value,
    pub event_list: ResourceList,
    pub errors: NonCriticalErrors,
}

impl Aggregated for ResourceDetail {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}

/// Fetch one object of `kind` and the events that involve it.
///
/// `namespace` is ignored for cluster-scoped kinds. Failing to fetch the
/// object itself is always returned as an error; event failures follow the
/// usual critical/non-critical split.
pub async fn get_detail(
    kind: ResourceKind,
    client: Arc<dyn ClusterClient>,
    namespace: &str,
    name: &str,
    ds_query: &DataSelectQuery,
) -> Result<ResourceDetail> {
    let namespace = kind.is_namespaced().then_some(namespace);
    info!(kind = %kind, namespace = ?namespace, name, "getting detail");

    match kind {
        ResourceKind::Pod => detail::<Pod>(client, namespace, name, ds_query).await,
        ResourceKind::Event => detail::<Event>(client, namespace, name, ds_query).await,
        ResourceKind::Namespace => detail::<Namespace>(client, namespace, name, ds_query).await,
        ResourceKind::Deployment => detail::<Deployment>(client, namespace, name, ds_query).await,
        ResourceKind::ReplicaSet => detail::<ReplicaSet>(client, namespace, name, ds_query).await,
        ResourceKind::ReplicationController => {
            detail::<ReplicationController>(client, namespace, name, ds_query).await
        }
        ResourceKind::DaemonSet => detail::<DaemonSet>(client, namespace, name, ds_query).await,
        ResourceKind::StatefulSet => detail::<StatefulSet>(client, namespace, name, ds_query).await,
        ResourceKind::Job => detail::<Job>(client, namespace, name, ds_query).await,
        ResourceKind::CronJob => detail::<CronJob>(client, namespace, name, ds_query).await,
        ResourceKind::Service => detail::<Service>(client, namespace, name, ds_query).await,
        ResourceKind::Ingress => detail::<Ingress>(client, namespace, name, ds_query).await,
        ResourceKind::ConfigMap => detail::<ConfigMap>(client, namespace, name, ds_query).await,
        ResourceKind::Secret => detail::<Secret>(client, namespace, name, ds_query).await,
        ResourceKind::PersistentVolumeClaim => {
            detail::<PersistentVolumeClaim>(client, namespace, name, ds_query).await
        }
        ResourceKind::Node => detail::<Node>(client, namespace, name, ds_query).await,
        ResourceKind::PersistentVolume => detail::<PersistentVolume>(client, namespace, name, ds_query).await,
        ResourceKind::StorageClass => detail::<StorageClass>(client, namespace, name, ds_query).await,
        ResourceKind::Role => detail::<Role>(client, namespace, name, ds_query).await,
        ResourceKind::ClusterRole => detail::<ClusterRole>(client, namespace, name, ds_query).await,
    }
}

async fn detail<K: ListedResource>(
    client: Arc<dyn ClusterClient>,
    namespace: Option<&str>,
    name: &str,
    ds_query: &DataSelectQuery,
) -> Result<ResourceDetail> {
    let ns_query = namespace.map_or_else(NamespaceQuery::all, NamespaceQuery::one);
    let events = FetchBundle::builder(client.clone(), ns_query)
        .list_with::<Event>(ListOptions::everything().with_field_selector(format!("involvedObject.name={}", name)))
        .build();

    let object: K = decode(client.get(K::KIND, namespace, name).await?)?;
    let raw = serde_json::to_value(&object).map_err(|e| Error::Decode {
        kind: K::KIND.to_string(),
        reason: e.to_string(),
    })?;

    let event_list = list_from_bundle::<Event>(&events, ds_query).await?;
    Ok(ResourceDetail {
        object_meta: object.meta().into(),
        type_meta: TypeMeta::new(K::KIND),
        status: object.status(),
        object: raw,
        errors: event_list.errors.clone(),
        event_list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use crate::resource::testing::{pod, warning};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_detail_with_events() {
        let client = Arc::new(InMemoryClusterClient::new());
        let web = pod("prod", "web-0", "Pending");
        let db = pod("prod", "db-0", "Pending");
        client.insert(&web).unwrap();
        client.insert(&db).unwrap();
        client.insert(&warning(&web, "FailedScheduling", "no nodes")).unwrap();
        client.insert(&warning(&db, "FailedMount", "volume missing")).unwrap();

        let detail = get_detail(ResourceKind::Pod, client, "prod", "web-0", &DataSelectQuery::everything())
            .await
            .unwrap();

        assert_eq!(detail.object_meta.name, "web-0");
        assert_eq!(detail.status.as_deref(), Some("Pending"));
        assert_eq!(detail.object["kind"], "Pod");
        assert_eq!(detail.event_list.list_meta.total_items, 1);
        assert_eq!(detail.event_list.items[0].status.as_deref(), Some("Warning"));
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let client = Arc::new(InMemoryClusterClient::new());
        let result = get_detail(ResourceKind::Service, client, "prod", "missing", &DataSelectQuery::everything()).await;

        assert_matches!(result, Err(Error::Api { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_detail_forbidden_events_are_non_critical() {
        let client = Arc::new(InMemoryClusterClient::new());
        client.insert(&pod("prod", "web-0", "Running")).unwrap();
        client.fail_list(
            ResourceKind::Event,
            Error::Api {
                code: 403,
                reason: "Forbidden".into(),
                message: "events is forbidden".into(),
            },
        );

        let detail = get_detail(ResourceKind::Pod, client, "prod", "web-0", &DataSelectQuery::everything())
            .await
            .unwrap();
        assert!(detail.event_list.items.is_empty());
        assert_eq!(detail.errors.len(), 1);
    }
}
