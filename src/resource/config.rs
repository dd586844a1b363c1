//! Config and storage view

use super::bundle::{FetchBundle, FetchBundleBuilder};
use super::common::{Aggregated, ResourceList};
use super::list::{join_worker, spawn_list};
use super::namespace::NamespaceQuery;
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::ClusterClient;
use crate::error::{NonCriticalErrors, Result};
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub config_map_list: ResourceList,
    pub persistent_volume_claim_list: ResourceList,
    pub secret_list: ResourceList,
    pub errors: NonCriticalErrors,
}

impl Aggregated for Config {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}

pub fn request_config(builder: FetchBundleBuilder) -> FetchBundleBuilder {
    builder
        .list::<ConfigMap>()
        .list::<Secret>()
        .list::<PersistentVolumeClaim>()
}

pub async fn get_config(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<Config> {
    info!(namespaces = ?ns_query.namespaces(), "getting config and storage");
    let bundle = request_config(FetchBundle::builder(client, ns_query.clone())).build();
    config_from_bundle(&bundle, Arc::new(ds_query.clone())).await
}

pub async fn config_from_bundle(bundle: &FetchBundle, ds_query: Arc<DataSelectQuery>) -> Result<Config> {
    let config_maps = spawn_list::<ConfigMap>(bundle, &ds_query);
    let claims = spawn_list::<PersistentVolumeClaim>(bundle, &ds_query);
    let secrets = spawn_list::<Secret>(bundle, &ds_query);

    let (config_map_list, persistent_volume_claim_list, secret_list) =
        tokio::try_join!(join_worker(config_maps), join_worker(claims), join_worker(secrets))?;

    let errors = NonCriticalErrors::merge([
        &config_map_list.errors,
        &persistent_volume_claim_list.errors,
        &secret_list.errors,
    ]);
    if !errors.is_empty() {
        warn!(warnings = errors.len(), "config assembled with non-critical errors");
    }

    Ok(Config {
        config_map_list,
        persistent_volume_claim_list,
        secret_list,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use crate::domain::ports::ResourceKind;
    use crate::error::Error;
    use crate::resource::testing::meta;
    use k8s_openapi::api::core::v1::PersistentVolumeClaimStatus;

    #[tokio::test]
    async fn test_config_lists_and_forbidden_secrets() {
        let client = Arc::new(InMemoryClusterClient::new());
        client
            .insert(&ConfigMap {
                metadata: meta("prod", "settings"),
                ..Default::default()
            })
            .unwrap();
        client
            .insert(&PersistentVolumeClaim {
                metadata: meta("prod", "data"),
                status: Some(PersistentVolumeClaimStatus {
                    phase: Some("Bound".into()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        client.fail_list(
            ResourceKind::Secret,
            Error::Api {
                code: 403,
                reason: "Forbidden".into(),
                message: "secrets is forbidden".into(),
            },
        );

        let config = get_config(client, &NamespaceQuery::one("prod"), &DataSelectQuery::everything())
            .await
            .unwrap();

        assert_eq!(config.config_map_list.names(), vec!["settings"]);
        assert_eq!(
            config.persistent_volume_claim_list.items[0].status.as_deref(),
            Some("Bound")
        );
        assert!(config.secret_list.items.is_empty());
        assert_eq!(config.errors.len(), 1);
    }
}
