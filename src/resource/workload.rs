//! Workloads view
//!
//! Deployments, replica sets, jobs, cron jobs, replication controllers,
//! pods, daemon sets and stateful sets, aggregated over one fetch bundle.

use super::bundle::{FetchBundle, FetchBundleBuilder};
use super::common::{Aggregated, ResourceList};
use super::list::{join_worker, spawn_controller_list, spawn_list};
use super::namespace::NamespaceQuery;
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::ClusterClient;
use crate::error::{NonCriticalErrors, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Event, Pod, ReplicationController};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workloads {
    pub deployment_list: ResourceList,
    pub replica_set_list: ResourceList,
    pub job_list: ResourceList,
    pub cron_job_list: ResourceList,
    pub replication_controller_list: ResourceList,
    pub pod_list: ResourceList,
    pub daemon_set_list: ResourceList,
    pub stateful_set_list: ResourceList,
    pub errors: NonCriticalErrors,
}

impl Aggregated for Workloads {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}

/// Request every kind the workloads view reads
pub fn request_workloads(builder: FetchBundleBuilder) -> FetchBundleBuilder {
    builder
        .list::<ReplicationController>()
        .list::<ReplicaSet>()
        .list::<Deployment>()
        .list::<DaemonSet>()
        .list::<StatefulSet>()
        .list::<Job>()
        .list::<CronJob>()
        .list::<Pod>()
        .list::<Event>()
}

/// Fetch and aggregate the workloads view
pub async fn get_workloads(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<Workloads> {
    info!(namespaces = ?ns_query.namespaces(), "getting workloads");
    let bundle = request_workloads(FetchBundle::builder(client, ns_query.clone())).build();
    workloads_from_bundle(&bundle, Arc::new(ds_query.clone())).await
}

/// Aggregate the workloads view from an already started bundle.
///
/// All eight lists are selected concurrently. The first critical failure
/// aborts the view.
pub async fn workloads_from_bundle(
    bundle: &FetchBundle,
    ds_query: Arc<DataSelectQuery>,
) -> Result<Workloads> {
    let deployments = spawn_controller_list::<Deployment>(bundle, &ds_query);
    let replica_sets = spawn_controller_list::<ReplicaSet>(bundle, &ds_query);
    let jobs = spawn_controller_list::<Job>(bundle, &ds_query);
    let cron_jobs = spawn_list::<CronJob>(bundle, &ds_query);
    let replication_controllers = spawn_controller_list::<ReplicationController>(bundle, &ds_query);
    let pods = spawn_list::<Pod>(bundle, &ds_query);
    let daemon_sets = spawn_controller_list::<DaemonSet>(bundle, &ds_query);
    let stateful_sets = spawn_controller_list::<StatefulSet>(bundle, &ds_query);

    let (
        deployment_list,
        replica_set_list,
        job_list,
        cron_job_list,
        replication_controller_list,
        pod_list,
        daemon_set_list,
        stateful_set_list,
    ) = tokio::try_join!(
        join_worker(deployments),
        join_worker(replica_sets),
        join_worker(jobs),
        join_worker(cron_jobs),
        join_worker(replication_controllers),
        join_worker(pods),
        join_worker(daemon_sets),
        join_worker(stateful_sets),
    )?;

    let errors = NonCriticalErrors::merge([
        &deployment_list.errors,
        &replica_set_list.errors,
        &job_list.errors,
        &cron_job_list.errors,
        &replication_controller_list.errors,
        &pod_list.errors,
        &daemon_set_list.errors,
        &stateful_set_list.errors,
    ]);
    if !errors.is_empty() {
        warn!(warnings = errors.len(), "workloads assembled with non-critical errors");
    }

    Ok(Workloads {
        deployment_list,
        replica_set_list,
        job_list,
        cron_job_list,
        replication_controller_list,
        pod_list,
        daemon_set_list,
        stateful_set_list,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use crate::domain::ports::ResourceKind;
    use crate::error::Error;
    use crate::resource::testing::pod;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_workloads_merge_non_critical_errors() {
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

        let workloads = get_workloads(client.clone(), &NamespaceQuery::all(), &DataSelectQuery::everything())
            .await
            .unwrap();

        assert_eq!(workloads.pod_list.list_meta.total_items, 1);
        assert_eq!(workloads.errors.messages(), &["events is forbidden".to_string()]);
        assert_eq!(workloads.deployment_list.errors.len(), 1);

        for kind in [ResourceKind::Pod, ResourceKind::Event, ResourceKind::ReplicaSet] {
            assert_eq!(client.list_calls(kind), 1, "{} listed more than once", kind);
        }
    }

    #[tokio::test]
    async fn test_workloads_abort_on_critical_error() {
        let client = Arc::new(InMemoryClusterClient::new());
        client.fail_list(ResourceKind::Job, Error::Transport("connection refused".into()));

        let result = get_workloads(client, &NamespaceQuery::all(), &DataSelectQuery::everything()).await;
        assert_matches!(result, Err(Error::Transport(_)));
    }
}
