//! Fetch Bundle
//!
//! One fetch channel per requested resource kind, created together for a
//! single request and shared by every worker that aggregates over it.

use super::channel::{list_channel, FetchChannel};
use super::kinds::ListedResource;
use super::namespace::NamespaceQuery;
use crate::domain::ports::{ClusterClient, ListOptions, ResourceKind};
use crate::error::{Error, NonCriticalErrors, Result};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

type AnyChannel = Arc<dyn Any + Send + Sync>;

/// Builder that starts one fetch per requested kind
pub struct FetchBundleBuilder {
    client: Arc<dyn ClusterClient>,
    ns_query: NamespaceQuery,
    channels: HashMap<ResourceKind, AnyChannel>,
}

impl FetchBundleBuilder {
    /// Request a full list of `K`
    pub fn list<K: ListedResource>(self) -> Self {
        self.list_with::<K>(ListOptions::everything())
    }

    /// Request a list of `K` with explicit list options.
    ///
    /// The fetch starts immediately. Requesting a kind twice keeps the first
    /// channel.
    pub fn list_with<K: ListedResource>(mut self, options: ListOptions) -> Self {
        if !self.channels.contains_key(&K::KIND) {
            let channel = list_channel::<K>(self.client.clone(), &self.ns_query, options);
            self.channels.insert(K::KIND, Arc::new(channel));
        }
        self
    }

    pub fn build(self) -> FetchBundle {
        FetchBundle {
            channels: Arc::new(self.channels),
        }
    }
}

/// Set of in-flight fetches for one request
#[derive(Clone)]
pub struct FetchBundle {
    channels: Arc<HashMap<ResourceKind, AnyChannel>>,
}

impl FetchBundle {
    pub fn builder(client: Arc<dyn ClusterClient>, ns_query: NamespaceQuery) -> FetchBundleBuilder {
        FetchBundleBuilder {
            client,
            ns_query,
            channels: HashMap::new(),
        }
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.channels.contains_key(&kind)
    }

    /// Channel carrying `K`.
    ///
    /// A kind that was not requested when the bundle was built is an
    /// internal error.
    pub fn channel<K: ListedResource>(&self) -> Result<FetchChannel<K>> {
        self.channels
            .get(&K::KIND)
            .and_then(|channel| channel.downcast_ref::<FetchChannel<K>>())
            .cloned()
            .ok_or_else(|| Error::Internal(format!("{} was not requested from the fetch bundle", K::KIND)))
    }

    /// Wait for the list of `K`
    pub async fn read<K: ListedResource>(&self) -> Result<Arc<Vec<K>>> {
        self.channel::<K>()?.read().await
    }

    /// Wait for the list of `K`, recording a non-critical failure in `errors`.
    ///
    /// A non-critical failure yields an empty list; a critical one is
    /// returned.
    pub async fn read_collecting<K: ListedResource>(
        &self,
        errors: NonCriticalErrors,
    ) -> Result<(Arc<Vec<K>>, NonCriticalErrors)> {
        match self.read::<K>().await {
            Ok(items) => Ok((items, errors)),
            Err(err) => {
                if !err.is_critical() {
                    warn!(kind = %K::KIND, error = %err, "non-critical fetch failure");
                }
                let errors = errors.append(Some(err))?;
                Ok((Arc::new(Vec::new()), errors))
            }
        }
    }
}
