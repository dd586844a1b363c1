//! Listed resource kinds
//!
//! Binds every k8s-openapi type the console lists to its [`ResourceKind`],
//! exposes its selectable properties as a data cell and, for controllers,
//! the replica counts and pod ownership used to build pod info.

use crate::dataselect::{ComparableValue, DataCell, PropertyName};
use crate::domain::ports::ResourceKind;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    ConfigMap, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod,
    ReplicationController, Secret, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, Role};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

// =============================================================================
// Listed Resource
// =============================================================================

/// A typed Kubernetes object the console can list
pub trait ListedResource:
    Resource<DynamicType = ()> + DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static
{
    const KIND: ResourceKind;

    /// Short status string exposed as the `status` property
    fn status(&self) -> Option<String> {
        None
    }
}

impl<K: ListedResource> DataCell for K {
    fn get_property(&self, name: &PropertyName) -> Option<ComparableValue> {
        let meta = self.meta();
        match name {
            PropertyName::Name => meta.name.clone().map(ComparableValue::from),
            PropertyName::Namespace => meta.namespace.clone().map(ComparableValue::from),
            PropertyName::CreationTimestamp => meta
                .creation_timestamp
                .as_ref()
                .map(|t| ComparableValue::Time(t.0)),
            PropertyName::Status => self.status().map(ComparableValue::from),
            PropertyName::Other(_) => None,
        }
    }
}

macro_rules! listed_resource {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl ListedResource for $ty {
                const KIND: ResourceKind = ResourceKind::$kind;
            }
        )+
    };
}

listed_resource! {
    Deployment => Deployment,
    ReplicaSet => ReplicaSet,
    ReplicationController => ReplicationController,
    DaemonSet => DaemonSet,
    StatefulSet => StatefulSet,
    Job => Job,
    CronJob => CronJob,
    Service => Service,
    Ingress => Ingress,
    ConfigMap => ConfigMap,
    Secret => Secret,
    StorageClass => StorageClass,
    Role => Role,
    ClusterRole => ClusterRole,
}

impl ListedResource for Pod {
    const KIND: ResourceKind = ResourceKind::Pod;

    fn status(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.phase.clone())
    }
}

impl ListedResource for Namespace {
    const KIND: ResourceKind = ResourceKind::Namespace;

    fn status(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.phase.clone())
    }
}

impl ListedResource for PersistentVolumeClaim {
    const KIND: ResourceKind = ResourceKind::PersistentVolumeClaim;

    fn status(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.phase.clone())
    }
}

impl ListedResource for PersistentVolume {
    const KIND: ResourceKind = ResourceKind::PersistentVolume;

    fn status(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.phase.clone())
    }
}

/// Status of the `Ready` condition, `Unknown` when the node does not report it
impl ListedResource for Node {
    const KIND: ResourceKind = ResourceKind::Node;

    fn status(&self) -> Option<String> {
        let ready = self
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
            .map(|c| c.status.clone());
        Some(ready.unwrap_or_else(|| "Unknown".to_string()))
    }
}

impl ListedResource for Event {
    const KIND: ResourceKind = ResourceKind::Event;

    fn status(&self) -> Option<String> {
        self.type_.clone()
    }
}

// =============================================================================
// Controllers
// =============================================================================

/// A resource that owns pods
pub trait Controller: ListedResource {
    /// Pods are owned by this controller's replica sets, not by it directly
    const OWNS_THROUGH_REPLICA_SETS: bool = false;

    fn current_replicas(&self) -> i32;

    fn desired_replicas(&self) -> Option<i32>;
}

impl Controller for Deployment {
    const OWNS_THROUGH_REPLICA_SETS: bool = true;

    fn current_replicas(&self) -> i32 {
        self.status.as_ref().and_then(|s| s.replicas).unwrap_or(0)
    }

    fn desired_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}

impl Controller for ReplicaSet {
    fn current_replicas(&self) -> i32 {
        self.status.as_ref().map_or(0, |s| s.replicas)
    }

    fn desired_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}

impl Controller for ReplicationController {
    fn current_replicas(&self) -> i32 {
        self.status.as_ref().map_or(0, |s| s.replicas)
    }

    fn desired_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}

impl Controller for StatefulSet {
    fn current_replicas(&self) -> i32 {
        self.status.as_ref().map_or(0, |s| s.replicas)
    }

    fn desired_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}

impl Controller for DaemonSet {
    fn current_replicas(&self) -> i32 {
        self.status.as_ref().map_or(0, |s| s.current_number_scheduled)
    }

    fn desired_replicas(&self) -> Option<i32> {
        self.status.as_ref().map(|s| s.desired_number_scheduled)
    }
}

impl Controller for Job {
    fn current_replicas(&self) -> i32 {
        self.status.as_ref().and_then(|s| s.active).unwrap_or(0)
    }

    fn desired_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.completions)
    }
}

/// True when `owner` is the managing controller of the object described by `meta`
pub fn is_controlled_by(meta: &ObjectMeta, owner: &ObjectMeta) -> bool {
    let Some(uid) = owner.uid.as_deref() else {
        return false;
    };
    meta.owner_references
        .iter()
        .flatten()
        .any(|r| r.controller == Some(true) && r.uid == uid)
}

/// Pods managed by `controller`.
///
/// For controllers that own pods through replica sets, the pods of every
/// replica set controlled by `controller` are returned.
pub fn matching_pods<'a, C: Controller>(
    controller: &C,
    pods: &'a [Pod],
    replica_sets: &[ReplicaSet],
) -> Vec<&'a Pod> {
    let owner = controller.meta();
    if C::OWNS_THROUGH_REPLICA_SETS {
        replica_sets
            .iter()
            .filter(|rs| is_controlled_by(rs.meta(), owner))
            .flat_map(move |rs| pods.iter().filter(move |p| is_controlled_by(p.meta(), rs.meta())))
            .collect()
    } else {
        pods.iter().filter(|p| is_controlled_by(p.meta(), owner)).collect()
    }
}
