//! In-Memory Cluster Client
//!
//! A [`ClusterClient`] over objects held in process. Used by standalone mode
//! and by tests, which can inject per-kind list failures and inspect how
//! many remote list calls each kind received.

use crate::domain::ports::{ClusterClient, ListOptions, ResourceKind};
use crate::error::{Error, Result};
use crate::resource::kinds::ListedResource;
use async_trait::async_trait;
use kube::core::DynamicObject;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Cluster client serving objects from memory
#[derive(Default)]
pub struct InMemoryClusterClient {
    objects: RwLock<BTreeMap<ResourceKind, Vec<DynamicObject>>>,
    failures: RwLock<HashMap<ResourceKind, Error>>,
    list_calls: Mutex<HashMap<ResourceKind, usize>>,
    latency: Option<Duration>,
}

impl InMemoryClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every list and get by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store a typed object under its kind
    pub fn insert<K>(&self, object: &K) -> Result<()>
    where
        K: ListedResource + Serialize,
    {
        let value = serde_json::to_value(object).map_err(|e| Error::Decode {
            kind: K::KIND.to_string(),
            reason: e.to_string(),
        })?;
        let dynamic: DynamicObject = serde_json::from_value(value).map_err(|e| Error::Decode {
            kind: K::KIND.to_string(),
            reason: e.to_string(),
        })?;
        self.objects.write().entry(K::KIND).or_default().push(dynamic);
        Ok(())
    }

    /// Make every list of `kind` fail with `err`
    pub fn fail_list(&self, kind: ResourceKind, err: Error) {
        self.failures.write().insert(kind, err);
    }

    /// Number of list calls received for `kind`
    pub fn list_calls(&self, kind: ResourceKind) -> usize {
        self.list_calls.lock().get(&kind).copied().unwrap_or(0)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ClusterClient for InMemoryClusterClient {
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        options: &ListOptions,
    ) -> Result<Vec<DynamicObject>> {
        *self.list_calls.lock().entry(kind).or_insert(0) += 1;
        self.simulate_latency().await;

        if let Some(err) = self.failures.read().get(&kind) {
            return Err(err.clone());
        }

        let objects = self.objects.read();
        let items: Vec<DynamicObject> = objects
            .get(&kind)
            .map(|items| {
                items
                    .iter()
                    .filter(|o| namespace.map_or(true, |ns| o.metadata.namespace.as_deref() == Some(ns)))
                    .filter(|o| matches_labels(o, options.label_selector.as_deref()))
                    .filter(|o| matches_fields(o, options.field_selector.as_deref()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(kind = %kind, namespace = ?namespace, items = items.len(), "listed from memory");
        Ok(items)
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        self.simulate_latency().await;

        let objects = self.objects.read();
        objects
            .get(&kind)
            .and_then(|items| {
                items.iter().find(|o| {
                    o.metadata.name.as_deref() == Some(name)
                        && (!kind.is_namespaced() || o.metadata.namespace.as_deref() == namespace)
                })
            })
            .cloned()
            .ok_or_else(|| Error::Api {
                code: 404,
                reason: "NotFound".into(),
                message: format!("{} \"{}\" not found", kind, name),
            })
    }
}

/// Equality-based label selector: `a=b`, `a==b`, `a!=b`, comma separated
fn matches_labels(object: &DynamicObject, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    let labels = object.metadata.labels.clone().unwrap_or_default();
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match parse_term(term) {
            Some((key, value, true)) => labels.get(key).map(String::as_str) == Some(value),
            Some((key, value, false)) => labels.get(key).map(String::as_str) != Some(value),
            None => labels.contains_key(term),
        })
}

/// Equality-based field selector over dotted JSON paths, e.g. `involvedObject.name=web`
fn matches_fields(object: &DynamicObject, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    let Ok(value) = serde_json::to_value(object) else {
        return false;
    };
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match parse_term(term) {
            Some((path, expected, equal)) => {
                let actual = path
                    .split('.')
                    .try_fold(&value, |v, segment| v.get(segment))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                (actual == expected) == equal
            }
            None => false,
        })
}

fn parse_term(term: &str) -> Option<(&str, &str, bool)> {
    if let Some((key, value)) = term.split_once("!=") {
        return Some((key.trim(), value.trim(), false));
    }
    if let Some((key, value)) = term.split_once("==") {
        return Some((key.trim(), value.trim(), true));
    }
    term.split_once('=').map(|(key, value)| (key.trim(), value.trim(), true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::{Event, ObjectReference, Pod};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn pod(ns: &str, name: &str, app: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(ns.into()),
                labels: Some(BTreeMap::from([("app".to_string(), app.to_string())])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_by_namespace_and_labels() {
        let client = InMemoryClusterClient::new();
        client.insert(&pod("a", "web-0", "web")).unwrap();
        client.insert(&pod("a", "db-0", "db")).unwrap();
        client.insert(&pod("b", "web-1", "web")).unwrap();

        let all = client.list(ResourceKind::Pod, None, &ListOptions::everything()).await.unwrap();
        assert_eq!(all.len(), 3);

        let in_a = client.list(ResourceKind::Pod, Some("a"), &ListOptions::everything()).await.unwrap();
        assert_eq!(in_a.len(), 2);

        let web = client
            .list(ResourceKind::Pod, None, &ListOptions::everything().with_label_selector("app=web"))
            .await
            .unwrap();
        assert_eq!(web.len(), 2);

        let not_web = client
            .list(ResourceKind::Pod, None, &ListOptions::everything().with_label_selector("app!=web"))
            .await
            .unwrap();
        assert_eq!(not_web.len(), 1);

        assert_eq!(client.list_calls(ResourceKind::Pod), 4);
        assert_eq!(client.list_calls(ResourceKind::Event), 0);
    }

    #[tokio::test]
    async fn test_field_selector() {
        let client = InMemoryClusterClient::new();
        for target in ["web-0", "web-1"] {
            client
                .insert(&Event {
                    metadata: ObjectMeta {
                        name: Some(format!("{}.1", target)),
                        namespace: Some("a".into()),
                        ..Default::default()
                    },
                    involved_object: ObjectReference {
                        name: Some(target.into()),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .unwrap();
        }

        let events = client
            .list(
                ResourceKind::Event,
                Some("a"),
                &ListOptions::everything().with_field_selector("involvedObject.name=web-1"),
            )
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata.name.as_deref(), Some("web-1.1"));
    }

    #[tokio::test]
    async fn test_injected_failure_and_get() {
        let client = InMemoryClusterClient::new();
        client.insert(&pod("a", "web-0", "web")).unwrap();
        client.fail_list(ResourceKind::Pod, Error::Transport("connection reset".into()));

        let result = client.list(ResourceKind::Pod, None, &ListOptions::everything()).await;
        assert_matches!(result, Err(Error::Transport(_)));

        let found = client.get(ResourceKind::Pod, Some("a"), "web-0").await.unwrap();
        assert_eq!(found.metadata.name.as_deref(), Some("web-0"));

        let missing = client.get(ResourceKind::Pod, Some("b"), "web-0").await;
        assert_matches!(missing, Err(Error::Api { code: 404, .. }));
    }
}
