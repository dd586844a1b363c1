//! Per-kind list workers
//!
//! Each worker reads its kinds from a shared [`FetchBundle`], runs the data
//! selector and turns the selected page into summaries.

use super::bundle::FetchBundle;
use super::common::{pod_warnings, ListMeta, PodInfo, ResourceList, ResourceSummary, TypeMeta};
use super::kinds::{matching_pods, Controller, ListedResource};
use super::namespace::NamespaceQuery;
use crate::dataselect::{select, ComparableValue, DataCell, DataSelectQuery, PropertyName};
use crate::domain::ports::{ClusterClient, ResourceKind};
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
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Borrowed view of an item for selection without cloning it
struct Borrowed<'a, K>(&'a K);

impl<K: DataCell> DataCell for Borrowed<'_, K> {
    fn get_property(&self, name: &PropertyName) -> Option<ComparableValue> {
        self.0.get_property(name)
    }
}

/// Summary of one item without pod info
pub fn summarize<K: ListedResource>(item: &K) -> ResourceSummary {
    ResourceSummary {
        object_meta: item.meta().into(),
        type_meta: TypeMeta::new(K::KIND),
        status: item.status(),
        pods: None,
    }
}

fn select_summaries<'a, K, F>(
    items: &'a [K],
    errors: NonCriticalErrors,
    ds_query: &DataSelectQuery,
    summarize: F,
) -> ResourceList
where
    K: ListedResource,
    F: FnMut(&'a K) -> ResourceSummary,
{
    let cells: Vec<Borrowed<'a, K>> = items.iter().map(Borrowed).collect();
    let (page, total) = select(cells, ds_query);
    debug!(kind = %K::KIND, fetched = items.len(), total, page = page.len(), "selected");

    ResourceList {
        list_meta: ListMeta { total_items: total },
        items: page.into_iter().map(|cell| cell.0).map(summarize).collect(),
        errors,
    }
}

// =============================================================================
// Bundle Workers
// =============================================================================

/// Select the list of `K` read from `bundle`
pub async fn list_from_bundle<K: ListedResource>(
    bundle: &FetchBundle,
    ds_query: &DataSelectQuery,
) -> Result<ResourceList> {
    let (items, errors) = bundle.read_collecting::<K>(NonCriticalErrors::new()).await?;
    Ok(select_summaries(&items, errors, ds_query, summarize::<K>))
}

/// Select the list of controller `C` read from `bundle`, with pod info.
///
/// Also reads pods and events, and replica sets for controllers that own
/// pods through them.
pub async fn controller_list_from_bundle<C: Controller>(
    bundle: &FetchBundle,
    ds_query: &DataSelectQuery,
) -> Result<ResourceList> {
    let (controllers, errors) = bundle.read_collecting::<C>(NonCriticalErrors::new()).await?;
    let (pods, errors) = bundle.read_collecting::<Pod>(errors).await?;
    let (events, errors) = bundle.read_collecting::<Event>(errors).await?;
    let (replica_sets, errors) = if C::OWNS_THROUGH_REPLICA_SETS {
        bundle.read_collecting::<ReplicaSet>(errors).await?
    } else {
        (Arc::new(Vec::new()), errors)
    };

    Ok(select_summaries(&controllers, errors, ds_query, |controller| {
        let owned = matching_pods(controller, &pods, &replica_sets);
        let info = PodInfo::new(controller.current_replicas(), controller.desired_replicas(), &owned)
            .with_warnings(pod_warnings(&events, &owned));
        ResourceSummary {
            pods: Some(info),
            ..summarize(controller)
        }
    }))
}

/// Select roles and cluster roles as one list.
///
/// Both kinds are read from `bundle`; their non-critical errors are
/// collected together.
pub async fn role_list_from_bundle(bundle: &FetchBundle, ds_query: &DataSelectQuery) -> Result<ResourceList> {
    let (roles, errors) = bundle.read_collecting::<Role>(NonCriticalErrors::new()).await?;
    let (cluster_roles, errors) = bundle.read_collecting::<ClusterRole>(errors).await?;

    let summaries: Vec<ResourceSummary> = roles
        .iter()
        .map(summarize::<Role>)
        .chain(cluster_roles.iter().map(summarize::<ClusterRole>))
        .collect();
    let fetched = summaries.len();
    let (page, total) = select(summaries, ds_query);
    debug!(kind = "role", fetched, total, page = page.len(), "selected");

    Ok(ResourceList {
        list_meta: ListMeta { total_items: total },
        items: page,
        errors,
    })
}

pub(crate) fn spawn_list<K: ListedResource>(
    bundle: &FetchBundle,
    ds_query: &Arc<DataSelectQuery>,
) -> JoinHandle<Result<ResourceList>> {
    let bundle = bundle.clone();
    let ds_query = ds_query.clone();
    tokio::spawn(async move { list_from_bundle::<K>(&bundle, &ds_query).await })
}

pub(crate) fn spawn_controller_list<C: Controller>(
    bundle: &FetchBundle,
    ds_query: &Arc<DataSelectQuery>,
) -> JoinHandle<Result<ResourceList>> {
    let bundle = bundle.clone();
    let ds_query = ds_query.clone();
    tokio::spawn(async move { controller_list_from_bundle::<C>(&bundle, &ds_query).await })
}

/// Wait for a spawned worker
pub(crate) async fn join_worker<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|e| Error::Internal(format!("aggregation worker failed: {}", e)))?
}

// =============================================================================
// Single-kind Entry Points
// =============================================================================

/// List one kind in the namespaces selected by `ns_query`
pub async fn list_resources<K: ListedResource>(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<ResourceList> {
    let bundle = FetchBundle::builder(client, ns_query.clone()).list::<K>().build();
    list_from_bundle::<K>(&bundle, ds_query).await
}

/// List one controller kind together with the pods it manages
pub async fn list_controllers<C: Controller>(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<ResourceList> {
    let mut builder = FetchBundle::builder(client, ns_query.clone())
        .list::<C>()
        .list::<Pod>()
        .list::<Event>();
    if C::OWNS_THROUGH_REPLICA_SETS {
        builder = builder.list::<ReplicaSet>();
    }
    controller_list_from_bundle::<C>(&builder.build(), ds_query).await
}

/// List any kind by name. Controllers carry pod info.
pub async fn list_kind(
    kind: ResourceKind,
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<ResourceList> {
    match kind {
        ResourceKind::Pod => list_resources::<Pod>(client, ns_query, ds_query).await,
        ResourceKind::Event => list_resources::<Event>(client, ns_query, ds_query).await,
        ResourceKind::Namespace => list_resources::<Namespace>(client, ns_query, ds_query).await,
        ResourceKind::Deployment => list_controllers::<Deployment>(client, ns_query, ds_query).await,
        ResourceKind::ReplicaSet => list_controllers::<ReplicaSet>(client, ns_query, ds_query).await,
        ResourceKind::ReplicationController => {
            list_controllers::<ReplicationController>(client, ns_query, ds_query).await
        }
        ResourceKind::DaemonSet => list_controllers::<DaemonSet>(client, ns_query, ds_query).await,
        ResourceKind::StatefulSet => list_controllers::<StatefulSet>(client, ns_query, ds_query).await,
        ResourceKind::Job => list_controllers::<Job>(client, ns_query, ds_query).await,
        ResourceKind::CronJob => list_resources::<CronJob>(client, ns_query, ds_query).await,
        ResourceKind::Service => list_resources::<Service>(client, ns_query, ds_query).await,
        ResourceKind::Ingress => list_resources::<Ingress>(client, ns_query, ds_query).await,
        ResourceKind::ConfigMap => list_resources::<ConfigMap>(client, ns_query, ds_query).await,
        ResourceKind::Secret => list_resources::<Secret>(client, ns_query, ds_query).await,
        ResourceKind::PersistentVolumeClaim => {
            list_resources::<PersistentVolumeClaim>(client, ns_query, ds_query).await
        }
        ResourceKind::Node => list_resources::<Node>(client, ns_query, ds_query).await,
        ResourceKind::PersistentVolume => list_resources::<PersistentVolume>(client, ns_query, ds_query).await,
        ResourceKind::StorageClass => list_resources::<StorageClass>(client, ns_query, ds_query).await,
        ResourceKind::Role => list_resources::<Role>(client, ns_query, ds_query).await,
        ResourceKind::ClusterRole => list_resources::<ClusterRole>(client, ns_query, ds_query).await,
    }
}

/// List namespaces. Cluster-scoped, so no namespace query applies.
pub async fn list_namespaces(
    client: Arc<dyn ClusterClient>,
    ds_query: &DataSelectQuery,
) -> Result<ResourceList> {
    list_resources::<Namespace>(client, &NamespaceQuery::all(), ds_query).await
}
