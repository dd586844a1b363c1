//! Broadcast Fetch Channel
//!
//! A fetch channel starts one remote fetch as soon as it is created and hands
//! the single outcome to any number of readers. The fetch runs on the tokio
//! runtime whether or not anyone reads it; every reader of a completed
//! channel receives a clone of the same `Arc`.

use super::kinds::ListedResource;
use super::namespace::NamespaceQuery;
use crate::domain::ports::{ClusterClient, ListOptions, ResourceKind};
use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use kube::core::DynamicObject;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Outcome delivered to every reader of a channel
pub type FetchResult<T> = Result<Arc<Vec<T>>>;

/// Memoized, multi-reader result of one fetch
pub struct FetchChannel<T> {
    outcome: Shared<BoxFuture<'static, FetchResult<T>>>,
}

impl<T> Clone for FetchChannel<T> {
    fn clone(&self) -> Self {
        Self {
            outcome: self.outcome.clone(),
        }
    }
}

impl<T> FetchChannel<T>
where
    T: Send + Sync + 'static,
{
    /// Spawn `fetch` now and return the channel that will carry its outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(kind: ResourceKind, fetch: F) -> Self
    where
        F: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        let handle = tokio::spawn(fetch);
        let outcome = async move {
            match handle.await {
                Ok(result) => result.map(Arc::new),
                Err(e) => Err(Error::FetchAborted {
                    kind: kind.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        .boxed()
        .shared();

        Self { outcome }
    }

    /// Wait for the fetch outcome. May be called any number of times.
    pub async fn read(&self) -> FetchResult<T> {
        self.outcome.clone().await
    }
}

/// Start listing `K` in the namespaces selected by `ns_query`.
///
/// Issues exactly one remote list. A single-namespace query narrows the
/// remote call; otherwise namespaced kinds are narrowed after the fact.
pub fn list_channel<K: ListedResource>(
    client: Arc<dyn ClusterClient>,
    ns_query: &NamespaceQuery,
    options: ListOptions,
) -> FetchChannel<K> {
    let ns_query = ns_query.clone();
    FetchChannel::spawn(K::KIND, async move {
        let namespaced = K::KIND.is_namespaced();
        let namespace = if namespaced { ns_query.to_request_param() } else { None };

        let objects = client.list(K::KIND, namespace, &options).await?;
        let fetched = objects.len();

        let mut items = Vec::with_capacity(fetched);
        for object in objects {
            let in_scope = !namespaced
                || ns_query.matches(object.metadata.namespace.as_deref().unwrap_or_default());
            if in_scope {
                items.push(decode::<K>(object)?);
            }
        }

        debug!(kind = %K::KIND, namespace = ?namespace, fetched, items = items.len(), "fetch complete");
        Ok(items)
    })
}

/// Decode a dynamic object into `K`.
///
/// List responses usually omit `apiVersion` and `kind` on their items; they
/// are filled in from `K` when missing.
pub fn decode<K: ListedResource>(object: DynamicObject) -> Result<K> {
    let decode_error = |e: serde_json::Error| Error::Decode {
        kind: K::KIND.to_string(),
        reason: e.to_string(),
    };

    let mut value = serde_json::to_value(object).map_err(decode_error)?;
    if let Some(fields) = value.as_object_mut() {
        fields
            .entry("apiVersion")
            .or_insert_with(|| Value::String(K::api_version(&()).into_owned()));
        fields
            .entry("kind")
            .or_insert_with(|| Value::String(K::kind(&()).into_owned()));
    }
    serde_json::from_value(value).map_err(decode_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use crate::resource::testing::pod;
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::{Namespace, Pod};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_reader_sees_the_same_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let channel = FetchChannel::spawn(ResourceKind::Pod, async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(vec![1, 2, 3])
        });

        let other = channel.clone();
        let (a, b, c) = tokio::join!(channel.read(), other.read(), channel.read());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(*a, vec![1, 2, 3]);

        let late = channel.read().await.unwrap();
        assert!(Arc::ptr_eq(&a, &late));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_shared() {
        let channel: FetchChannel<u8> =
            FetchChannel::spawn(ResourceKind::Event, async { Err(Error::Transport("reset".into())) });

        assert_matches!(channel.read().await, Err(Error::Transport(_)));
        assert_matches!(channel.read().await, Err(Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_runs_without_readers() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let _channel = FetchChannel::spawn(ResourceKind::Pod, async move {
            let _ = tx.send(());
            Ok(Vec::<u8>::new())
        });

        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("fetch should complete unread")
            .unwrap();
    }

    #[tokio::test]
    async fn test_panicking_fetch_reports_aborted() {
        let channel = FetchChannel::spawn(ResourceKind::Job, async {
            let items: Vec<u8> = Vec::new();
            if items.is_empty() {
                panic!("boom");
            }
            Ok(items)
        });
        assert_matches!(channel.read().await, Err(Error::FetchAborted { .. }));
    }

    #[tokio::test]
    async fn test_list_channel_filters_namespaces() {
        let client = Arc::new(InMemoryClusterClient::new());
        for (ns, name) in [("x", "a"), ("x", "b"), ("y", "c"), ("z", "d")] {
            client.insert(&pod(ns, name, "Running")).unwrap();
        }

        let query = NamespaceQuery::new(vec!["x".into(), "y".into()]);
        let pods = list_channel::<Pod>(client.clone(), &query, ListOptions::everything())
            .read()
            .await
            .unwrap();
        assert_eq!(pods.len(), 3);
        assert!(pods.iter().all(|p| p.metadata.namespace.as_deref() != Some("z")));

        let single = list_channel::<Pod>(client.clone(), &NamespaceQuery::one("z"), ListOptions::everything())
            .read()
            .await
            .unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(client.list_calls(ResourceKind::Pod), 2);
    }

    #[tokio::test]
    async fn test_cluster_scoped_kind_ignores_namespace_query() {
        let client = Arc::new(InMemoryClusterClient::new());
        let mut ns = Namespace::default();
        ns.metadata.name = Some("kube-system".into());
        client.insert(&ns).unwrap();

        let namespaces = list_channel::<Namespace>(client, &NamespaceQuery::one("default"), ListOptions::everything())
            .read()
            .await
            .unwrap();
        assert_eq!(namespaces.len(), 1);
    }

    #[test]
    fn test_decode_fills_type_meta() {
        let object: DynamicObject = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "web-0", "namespace": "prod" },
            "status": { "phase": "Running" }
        }))
        .unwrap();

        let decoded: Pod = decode(object).unwrap();
        assert_eq!(decoded.metadata.name.as_deref(), Some("web-0"));
        assert_eq!(decoded.status.and_then(|s| s.phase).as_deref(), Some("Running"));
    }

    #[test]
    fn test_decode_failure_is_critical() {
        let object: DynamicObject = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "web-0" },
            "spec": { "containers": "not-a-list" }
        }))
        .unwrap();

        let err = decode::<Pod>(object).unwrap_err();
        assert!(err.is_critical());
        assert_matches!(err, Error::Decode { .. });
    }
}
