//! Error types for the console backend
//!
//! Provides the crate-wide error type together with the classifier that
//! decides whether a failure aborts an aggregation (critical) or is only
//! reported back to the caller as a warning (non-critical).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the console backend
///
/// The type is `Clone` because one remote fetch result is handed out to every
/// reader of a fetch channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("{message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("Kubernetes transport error: {0}")]
    Transport(String),

    #[error("Failed to decode {kind}: {reason}")]
    Decode { kind: String, reason: String },

    #[error("Fetch of {kind} did not complete: {reason}")]
    FetchAborted { kind: String, reason: String },

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => Error::Api {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => Error::Transport(other.to_string()),
        }
    }
}

/// Severity of an error inside an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Aborts the enclosing aggregation branch
    Critical,
    /// Recorded as a warning, aggregation continues
    NonCritical,
}

impl Error {
    /// Classify this error for aggregation purposes.
    ///
    /// Only "unauthorized" and "forbidden" statuses from the remote API are
    /// non-critical; transport failures, decode failures and every other
    /// status (including not-found) are critical.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Api { code: 401 | 403, .. } => ErrorClass::NonCritical,
            _ => ErrorClass::Critical,
        }
    }

    /// Check if this error aborts an aggregation
    pub fn is_critical(&self) -> bool {
        self.class() == ErrorClass::Critical
    }

    /// HTTP status code to report for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Api { code, .. } if matches!(code, 401 | 403 | 404) => *code,
            Error::UnknownKind(_) => 404,
            _ => 500,
        }
    }
}

/// Result type alias for the console backend
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Non-critical error set
// =============================================================================

/// Distinct non-critical error messages collected during an aggregation.
///
/// Messages are deduplicated by exact string equality, keeping first-seen
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonCriticalErrors(Vec<String>);

impl NonCriticalErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a set from a single optional error.
    ///
    /// Returns the critical error instead when `err` is critical.
    pub fn handle(err: Option<Error>) -> Result<Self> {
        Self::new().append(err)
    }

    /// Add `err` to this set.
    ///
    /// `None` leaves the set unchanged, a non-critical error is appended
    /// unless its message is already present, and a critical error is
    /// returned for the caller to short-circuit on (the set is discarded).
    pub fn append(mut self, err: Option<Error>) -> Result<Self> {
        match err {
            None => Ok(self),
            Some(err) if err.is_critical() => Err(err),
            Some(err) => {
                self.push(err.to_string());
                Ok(self)
            }
        }
    }

    /// Concatenate several sets, deduplicating by message.
    pub fn merge<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a NonCriticalErrors>,
    {
        let mut merged = Self::new();
        for set in sets {
            for message in &set.0 {
                merged.push(message.clone());
            }
        }
        merged
    }

    fn push(&mut self, message: String) {
        if !self.0.contains(&message) {
            self.0.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}
