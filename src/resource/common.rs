//! Result records shared by every view

use crate::dataselect::{ComparableValue, DataCell, PropertyName};
use crate::domain::ports::ResourceKind;
use crate::error::NonCriticalErrors;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Event, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// Metadata
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Items that passed the filter, before pagination
    pub total_items: usize,
}

/// Object metadata as presented to clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetaView {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl From<&ObjectMeta> for ObjectMetaView {
    fn from(meta: &ObjectMeta) -> Self {
        Self {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone(),
            labels: meta.labels.clone().unwrap_or_default(),
            annotations: meta.annotations.clone().unwrap_or_default(),
            creation_timestamp: meta.creation_timestamp.as_ref().map(|t| t.0),
            uid: meta.uid.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMeta {
    pub kind: ResourceKind,
}

impl TypeMeta {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

// =============================================================================
// Pod Info
// =============================================================================

/// Warning event attached to a group of pods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWarning {
    pub message: String,
    pub reason: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// Aggregate state of the pods managed by one controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInfo {
    pub current: i32,
    pub desired: Option<i32>,
    pub running: i32,
    pub pending: i32,
    pub failed: i32,
    pub succeeded: i32,
    pub warnings: Vec<EventWarning>,
}

impl PodInfo {
    /// Count `pods` by phase
    pub fn new(current: i32, desired: Option<i32>, pods: &[&Pod]) -> Self {
        let mut info = Self {
            current,
            desired,
            ..Default::default()
        };
        for pod in pods {
            match pod_phase(pod) {
                Some("Running") => info.running += 1,
                Some("Pending") => info.pending += 1,
                Some("Failed") => info.failed += 1,
                Some("Succeeded") => info.succeeded += 1,
                _ => {}
            }
        }
        info
    }

    pub fn with_warnings(mut self, warnings: Vec<EventWarning>) -> Self {
        self.warnings = warnings;
        self
    }
}

fn pod_phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref().and_then(|s| s.phase.as_deref())
}

fn is_ready_or_succeeded(pod: &Pod) -> bool {
    match pod_phase(pod) {
        Some("Succeeded") => true,
        Some("Running") => !pod
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .into_iter()
            .flatten()
            .any(|c| c.type_ == "Ready" && c.status == "False"),
        _ => false,
    }
}

/// Warning events targeting pods that are neither ready nor succeeded,
/// one per distinct reason
pub fn pod_warnings(events: &[Event], pods: &[&Pod]) -> Vec<EventWarning> {
    let unhealthy: HashSet<&str> = pods
        .iter()
        .filter(|p| !is_ready_or_succeeded(p))
        .filter_map(|p| p.metadata.uid.as_deref())
        .collect();
    if unhealthy.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|e| e.type_.as_deref() == Some("Warning"))
        .filter(|e| {
            e.involved_object
                .uid
                .as_deref()
                .map_or(false, |uid| unhealthy.contains(uid))
        })
        .filter(|e| seen.insert(e.reason.clone().unwrap_or_default()))
        .map(|e| EventWarning {
            message: e.message.clone().unwrap_or_default(),
            reason: e.reason.clone().unwrap_or_default(),
            type_: e.type_.clone().unwrap_or_default(),
        })
        .collect()
}

// =============================================================================
// Lists
// =============================================================================

/// A view that carries non-critical errors next to its data
pub trait Aggregated {
    fn non_critical_errors(&self) -> &NonCriticalErrors;
}

/// One listed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub object_meta: ObjectMetaView,
    pub type_meta: TypeMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<PodInfo>,
}

/// Summaries of mixed kinds are selected on their presented fields
impl DataCell for ResourceSummary {
    fn get_property(&self, name: &PropertyName) -> Option<ComparableValue> {
        match name {
            PropertyName::Name => Some(self.object_meta.name.clone().into()),
            PropertyName::Namespace => self.object_meta.namespace.clone().map(ComparableValue::from),
            PropertyName::CreationTimestamp => self.object_meta.creation_timestamp.map(ComparableValue::Time),
            PropertyName::Status => self.status.clone().map(ComparableValue::from),
            PropertyName::Other(_) => None,
        }
    }
}

/// A selected page of one kind together with the non-critical errors met
/// while fetching it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    pub list_meta: ListMeta,
    pub items: Vec<ResourceSummary>,
    pub errors: NonCriticalErrors,
}

impl ResourceList {
    pub fn empty(errors: NonCriticalErrors) -> Self {
        Self {
            list_meta: ListMeta::default(),
            items: Vec::new(),
            errors,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.object_meta.name.as_str()).collect()
    }
}

impl Aggregated for ResourceList {
    fn non_critical_errors(&self) -> &NonCriticalErrors {
        &self.errors
    }
}
