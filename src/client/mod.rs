//! Cluster Client Adapters
//!
//! Provides adapters implementing the [`ClusterClient`](crate::domain::ports::ClusterClient) port:
//! - Kubernetes: a live API server through `kube`
//! - Memory: in-process objects for standalone mode and tests

pub mod kubernetes;
pub mod memory;

pub use kubernetes::*;
pub use memory::*;
