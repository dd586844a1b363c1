//! Cluster view
//!
//! Namespaces, nodes, persistent volumes, roles and storage classes. Every
//! kind here is read across the whole cluster, so the view takes no
//! namespace query.

use super::bundle::{FetchBundle, FetchBundleBuilder};
use super::common::{Aggregated, ResourceList};
use super::list::{join_worker, role_list_from_bundle, spawn_list};
use super::namespace::NamespaceQuery;
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::ClusterClient;
use crate::error::{NonCriticalErrors, Result};
use k8s_openapi::api::core::v1::{Namespace, Node, PersistentVolume};
use k8s_openapi::api::rbac::v1::{ClusterRole, Role};
use k8s_openapi::api::storage::v1::StorageClass;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub namespace_list: ResourceList,
    pub node_list: ResourceList,
    pub persistent_volume_list: ResourceList,
    /// Roles and cluster roles together
    pub role_list: ResourceList,
    pub storage_class_list: ResourceList,
    pub errors: NonCriticalErrors,
}

impl Aggregated for Cluster {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}

pub fn request_cluster(builder: FetchBundleBuilder) -> FetchBundleBuilder {
    builder
        .list::<Namespace>()
        .list::<Node>()
        .list::<PersistentVolume>()
        .list::<Role>()
        .list::<ClusterRole>()
        .list::<StorageClass>()
}

pub async fn get_cluster(client: Arc<dyn ClusterClient>, ds_query: &DataSelectQuery) -> Result<Cluster> {
    info!("getting cluster");
    let bundle = request_cluster(FetchBundle::builder(client, NamespaceQuery::all())).build();
    cluster_from_bundle(&bundle, Arc::new(ds_query.clone())).await
}

pub async fn cluster_from_bundle(bundle: &FetchBundle, ds_query: Arc<DataSelectQuery>) -> Result<Cluster> {
    let namespaces = spawn_list::<Namespace>(bundle, &ds_query);
    let nodes = spawn_list::<Node>(bundle, &ds_query);
    let volumes = spawn_list::<PersistentVolume>(bundle, &ds_query);
    let roles = {
        let bundle = bundle.clone();
        let ds_query = ds_query.clone();
        tokio::spawn(async move { role_list_from_bundle(&bundle, &ds_query).await })
    };
    let storage_classes = spawn_list::<StorageClass>(bundle, &ds_query);

    let (namespace_list, node_list, persistent_volume_list, role_list, storage_class_list) = tokio::try_join!(
        join_worker(namespaces),
        join_worker(nodes),
        join_worker(volumes),
        join_worker(roles),
        join_worker(storage_classes),
    )?;

    let errors = NonCriticalErrors::merge([
        &namespace_list.errors,
        &node_list.errors,
        &persistent_volume_list.errors,
        &role_list.errors,
        &storage_class_list.errors,
    ]);
    if !errors.is_empty() {
        warn!(warnings = errors.len(), "cluster assembled with non-critical errors");
    }

    Ok(Cluster {
        namespace_list,
        node_list,
        persistent_volume_list,
        role_list,
        storage_class_list,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use crate::dataselect::{FilterQuery, PaginationQuery, SortQuery};
    use crate::domain::ports::ResourceKind;
    use crate::error::Error;
    use crate::resource::testing::meta;
    use assert_matches::assert_matches;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn cluster_meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.into()),
            uid: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cluster_merges_roles_and_cluster_roles() {
        let client = Arc::new(InMemoryClusterClient::new());
        client
            .insert(&Node {
                metadata: cluster_meta("node-1"),
                ..Default::default()
            })
            .unwrap();
        client
            .insert(&Role {
                metadata: meta("prod", "reader"),
                ..Default::default()
            })
            .unwrap();
        client
            .insert(&Role {
                metadata: meta("dev", "deployer"),
                ..Default::default()
            })
            .unwrap();
        client
            .insert(&ClusterRole {
                metadata: cluster_meta("admin"),
                ..Default::default()
            })
            .unwrap();

        let by_name = DataSelectQuery::new(
            SortQuery::from_tokens(&["a", "name"]),
            FilterQuery::none(),
            PaginationQuery::none(),
        );
        let cluster = get_cluster(client.clone(), &by_name).await.unwrap();

        assert_eq!(cluster.node_list.names(), vec!["node-1"]);
        assert_eq!(cluster.node_list.items[0].status.as_deref(), Some("Unknown"));
        assert_eq!(cluster.role_list.names(), vec!["admin", "deployer", "reader"]);
        assert_eq!(cluster.role_list.list_meta.total_items, 3);
        assert_eq!(cluster.role_list.items[0].type_meta.kind, ResourceKind::ClusterRole);
        assert!(cluster.errors.is_empty());

        for kind in [
            ResourceKind::Namespace,
            ResourceKind::Node,
            ResourceKind::PersistentVolume,
            ResourceKind::Role,
            ResourceKind::ClusterRole,
            ResourceKind::StorageClass,
        ] {
            assert_eq!(client.list_calls(kind), 1, "{} listed more than once", kind);
        }
    }

    #[tokio::test]
    async fn test_cluster_forbidden_roles_are_non_critical() {
        let client = Arc::new(InMemoryClusterClient::new());
        client
            .insert(&ClusterRole {
                metadata: cluster_meta("admin"),
                ..Default::default()
            })
            .unwrap();
        client.fail_list(
            ResourceKind::Role,
            Error::Api {
                code: 403,
                reason: "Forbidden".into(),
                message: "roles.rbac.authorization.k8s.io is forbidden".into(),
            },
        );

        let cluster = get_cluster(client, &DataSelectQuery::everything()).await.unwrap();

        assert_eq!(cluster.role_list.names(), vec!["admin"]);
        assert_eq!(
            cluster.errors.messages(),
            &["roles.rbac.authorization.k8s.io is forbidden".to_string()]
        );
    }

    #[tokio::test]
    async fn test_cluster_node_transport_failure_is_critical() {
        let client = Arc::new(InMemoryClusterClient::new());
        client.fail_list(ResourceKind::Node, Error::Transport("connection refused".into()));

        let result = get_cluster(client, &DataSelectQuery::everything()).await;
        assert_matches!(result, Err(Error::Transport(_)));
    }
}
