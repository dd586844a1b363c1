//! Overview view
//!
//! Config, discovery and workloads assembled from a single fetch bundle, so
//! that kinds read by several sections are listed only once.

use super::bundle::FetchBundle;
use super::common::{Aggregated, ResourceList};
use super::config::{config_from_bundle, request_config, Config};
use super::discovery::{discovery_from_bundle, request_discovery, Discovery};
use super::namespace::NamespaceQuery;
use super::workload::{request_workloads, workloads_from_bundle, Workloads};
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::ClusterClient;
use crate::error::{NonCriticalErrors, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Every list of the config, discovery and workloads views, side by side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub config_map_list: ResourceList,
    pub persistent_volume_claim_list: ResourceList,
    pub secret_list: ResourceList,

    pub service_list: ResourceList,
    pub ingress_list: ResourceList,

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

impl Overview {
    fn assemble(config: Config, discovery: Discovery, workloads: Workloads) -> Self {
        let errors = NonCriticalErrors::merge([&config.errors, &discovery.errors, &workloads.errors]);
        Self {
            config_map_list: config.config_map_list,
            persistent_volume_claim_list: config.persistent_volume_claim_list,
            secret_list: config.secret_list,
            service_list: discovery.service_list,
            ingress_list: discovery.ingress_list,
            deployment_list: workloads.deployment_list,
            replica_set_list: workloads.replica_set_list,
            job_list: workloads.job_list,
            cron_job_list: workloads.cron_job_list,
            replication_controller_list: workloads.replication_controller_list,
            pod_list: workloads.pod_list,
            daemon_set_list: workloads.daemon_set_list,
            stateful_set_list: workloads.stateful_set_list,
            errors,
        }
    }
}

impl Aggregated for Overview {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}

/// Fetch and aggregate the overview
pub async fn get_overview(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<Overview> {
    info!(namespaces = ?ns_query.namespaces(), "getting overview");

    let builder = FetchBundle::builder(client, ns_query.clone());
    let bundle = request_workloads(request_discovery(request_config(builder))).build();
    let ds_query = Arc::new(ds_query.clone());

    let (config, discovery, workloads) = tokio::try_join!(
        config_from_bundle(&bundle, ds_query.clone()),
        discovery_from_bundle(&bundle, ds_query.clone()),
        workloads_from_bundle(&bundle, ds_query),
    )?;

    let overview = Overview::assemble(config, discovery, workloads);
    if !overview.errors.is_empty() {
        warn!(warnings = overview.errors.len(), "overview assembled with non-critical errors");
    }
    Ok(overview)
}
