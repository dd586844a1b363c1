//! Namespace Query

use serde::{Deserialize, Serialize};

/// Set of namespaces a request is scoped to. Empty means all namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceQuery {
    namespaces: Vec<String>,
}

impl NamespaceQuery {
    pub fn new(namespaces: Vec<String>) -> Self {
        Self { namespaces }
    }

    /// All namespaces
    pub fn all() -> Self {
        Self::default()
    }

    pub fn one(namespace: impl Into<String>) -> Self {
        Self::new(vec![namespace.into()])
    }

    /// Parse a comma-separated namespace list, dropping blank entries
    pub fn parse(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Namespace to pass to the remote list call.
    ///
    /// Only a single-namespace query narrows the remote call; zero or several
    /// namespaces list across all of them and are narrowed by [`matches`].
    ///
    /// [`matches`]: NamespaceQuery::matches
    pub fn to_request_param(&self) -> Option<&str> {
        match self.namespaces.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// True when the query is empty or contains `namespace`
    pub fn matches(&self, namespace: &str) -> bool {
        self.namespaces.is_empty() || self.namespaces.iter().any(|ns| ns == namespace)
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn is_all(&self) -> bool {
        self.namespaces.is_empty()
    }
}
