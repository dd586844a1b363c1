//! Resource Aggregation
//!
//! Concurrent fetching and composite views:
//! - [`channel`] / [`bundle`]: one shared fetch per kind per request
//! - [`kinds`]: typed resources as data cells, controller pod ownership
//! - [`list`]: per-kind workers and single-kind entry points
//! - [`workload`], [`config`], [`discovery`], [`cluster`], [`overview`]: composite views
//! - [`detail`]: one object with its events

pub mod bundle;
pub mod channel;
pub mod cluster;
pub mod common;
pub mod config;
pub mod detail;
pub mod discovery;
pub mod kinds;
pub mod list;
pub mod namespace;
pub mod overview;
pub mod workload;

#[cfg(test)]
pub(crate) mod testing;

pub use bundle::{FetchBundle, FetchBundleBuilder};
pub use channel::{list_channel, FetchChannel, FetchResult};
pub use cluster::{get_cluster, Cluster};
pub use common::{Aggregated, EventWarning, ListMeta, ObjectMetaView, PodInfo, ResourceList, ResourceSummary, TypeMeta};
pub use config::{get_config, Config};
pub use detail::{get_detail, ResourceDetail};
pub use discovery::{get_discovery, Discovery};
pub use kinds::{Controller, ListedResource};
pub use list::{list_controllers, list_kind, list_namespaces, list_resources};
pub use namespace::NamespaceQuery;
pub use overview::{get_overview, Overview};
pub use workload::{get_workloads, Workloads};
