//! Kubernetes Console Backend - Aggregation Core
//!
//! Fetches resources from a Kubernetes API server concurrently, shares each
//! fetch between every view that needs it, and filters, sorts and paginates
//! the results for display.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         REST API (axum)                             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   Overview ── Workloads ── Config ── Discovery ── Cluster ── Detail │
//! │        (concurrent workers, non-critical errors merged)             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   Data Selector: filter → count → stable sort → paginate            │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   Fetch Bundle: one shared fetch channel per resource kind          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   ClusterClient port: kube::Client  |  in-memory                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`api`]: REST router, server and metrics
//! - [`client`]: cluster client adapters
//! - [`dataselect`]: comparable values, queries and the selector
//! - [`domain`]: the cluster client port and resource kinds
//! - [`resource`]: fetch channels, bundles and composite views
//! - [`error`]: error types and the critical/non-critical classifier

pub mod api;
pub mod client;
pub mod dataselect;
pub mod domain;
pub mod error;
pub mod resource;

// Re-export commonly used types
pub use api::{ApiMetrics, ApiServer, ApiServerConfig, AppState, RestRouter};

pub use client::{InMemoryClusterClient, KubeClusterClient};

pub use dataselect::{
    ComparableValue, DataCell, DataSelectQuery, FilterQuery, PaginationQuery, PropertyName,
    SortQuery,
};

pub use domain::ports::{ClusterClient, ListOptions, ResourceKind};

pub use error::{Error, ErrorClass, NonCriticalErrors, Result};

pub use resource::{
    Cluster, FetchBundle, FetchChannel, NamespaceQuery, Overview, ResourceDetail, ResourceList,
    Workloads,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
