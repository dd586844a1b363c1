//! Discovery and load balancing view

use super::bundle::{FetchBundle, FetchBundleBuilder};
use super::common::{Aggregated, ResourceList};
use super::list::{join_worker, spawn_list};
use super::namespace::NamespaceQuery;
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::ClusterClient;
use crate::error::{NonCriticalErrors, Result};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub service_list: ResourceList,
    pub ingress_list: ResourceList,
    pub errors: NonCriticalErrors,
}

impl Aggregated for Discovery {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}

pub fn request_discovery(builder: FetchBundleBuilder) -> FetchBundleBuilder {
    builder.list::<Service>().list::<Ingress>()
}

pub async fn get_discovery(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    ds_query: &DataSelectQuery,
) -> Result<Discovery> {
    info!(namespaces = ?ns_query.namespaces(), "getting discovery and load balancing");
    let bundle = request_discovery(FetchBundle::builder(client, ns_query.clone())).build();
    discovery_from_bundle(&bundle, Arc::new(ds_query.clone())).await
}

pub async fn discovery_from_bundle(
    bundle: &FetchBundle,
    ds_query: Arc<DataSelectQuery>,
) -> Result<Discovery> {
    let services = spawn_list::<Service>(bundle, &ds_query);
    let ingresses = spawn_list::<Ingress>(bundle, &ds_query);

    let (service_list, ingress_list) = tokio::try_join!(join_worker(services), join_worker(ingresses))?;

    let errors = NonCriticalErrors::merge([&service_list.errors, &ingress_list.errors]);
    if !errors.is_empty() {
        warn!(warnings = errors.len(), "discovery assembled with non-critical errors");
    }

    Ok(Discovery {
        service_list,
        ingress_list,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use crate::dataselect::{FilterQuery, PaginationQuery, SortQuery};
    use crate::resource::testing::meta;

    #[tokio::test]
    async fn test_discovery_applies_selection_per_list() {
        let client = Arc::new(InMemoryClusterClient::new());
        for name in ["api", "web", "web-internal"] {
            client
                .insert(&Service {
                    metadata: meta("prod", name),
                    ..Default::default()
                })
                .unwrap();
        }
        client
            .insert(&Ingress {
                metadata: meta("prod", "web"),
                ..Default::default()
            })
            .unwrap();

        let query = DataSelectQuery::new(
            SortQuery::from_tokens(&["d", "name"]),
            FilterQuery::from_tokens(&["name", "web"]),
            PaginationQuery::none(),
        );
        let discovery = get_discovery(client, &NamespaceQuery::all(), &query).await.unwrap();

        assert_eq!(discovery.service_list.names(), vec!["web-internal", "web"]);
        assert_eq!(discovery.service_list.list_meta.total_items, 2);
        assert_eq!(discovery.ingress_list.names(), vec!["web"]);
        assert!(discovery.errors.is_empty());
    }
}
