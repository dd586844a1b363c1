//! Comparable values and the data cell contract

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

// =============================================================================
// Property Names
// =============================================================================

/// Name of a selectable property of a data cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyName {
    Name,
    Namespace,
    CreationTimestamp,
    Status,
    /// Any name outside the well-known set; never resolves to a value
    Other(String),
}

impl PropertyName {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyName::Name => "name",
            PropertyName::Namespace => "namespace",
            PropertyName::CreationTimestamp => "creationTimestamp",
            PropertyName::Status => "status",
            PropertyName::Other(name) => name,
        }
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        match s {
            "name" => PropertyName::Name,
            "namespace" => PropertyName::Namespace,
            "creationTimestamp" => PropertyName::CreationTimestamp,
            "status" => PropertyName::Status,
            other => PropertyName::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Comparable Value
// =============================================================================

/// A single scalar that can be ordered and matched against its own kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparableValue {
    String(String),
    Time(DateTime<Utc>),
    Int(i64),
}

impl ComparableValue {
    /// Three-way comparison against a value of the same kind.
    ///
    /// Values of different kinds are never compared by correct data cells;
    /// such a pair reports `Equal`.
    pub fn compare(&self, other: &ComparableValue) -> Ordering {
        match (self, other) {
            (ComparableValue::String(a), ComparableValue::String(b)) => a.cmp(b),
            (ComparableValue::Time(a), ComparableValue::Time(b)) => a.cmp(b),
            (ComparableValue::Int(a), ComparableValue::Int(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    /// Substring containment for strings, equality for times and ints
    pub fn matches(&self, other: &ComparableValue) -> bool {
        match (self, other) {
            (ComparableValue::String(a), ComparableValue::String(b)) => a.contains(b.as_str()),
            (ComparableValue::Time(a), ComparableValue::Time(b)) => a == b,
            (ComparableValue::Int(a), ComparableValue::Int(b)) => a == b,
            _ => false,
        }
    }

    /// Match against a raw filter value, read as this value's kind.
    ///
    /// Times are read as RFC 3339; a raw value that does not parse never
    /// matches.
    pub fn matches_raw(&self, raw: &str) -> bool {
        let other = match self {
            ComparableValue::String(_) => Some(ComparableValue::String(raw.to_string())),
            ComparableValue::Time(_) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|t| ComparableValue::Time(t.with_timezone(&Utc))),
            ComparableValue::Int(_) => raw.trim().parse().ok().map(ComparableValue::Int),
        };
        other.map_or(false, |other| self.matches(&other))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ComparableValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ComparableValue {
    fn from(s: &str) -> Self {
        ComparableValue::String(s.to_string())
    }
}

impl From<String> for ComparableValue {
    fn from(s: String) -> Self {
        ComparableValue::String(s)
    }
}

impl From<DateTime<Utc>> for ComparableValue {
    fn from(t: DateTime<Utc>) -> Self {
        ComparableValue::Time(t)
    }
}

impl From<i64> for ComparableValue {
    fn from(i: i64) -> Self {
        ComparableValue::Int(i)
    }
}

// =============================================================================
// Data Cell
// =============================================================================

/// Exposes the selectable fields of one domain object.
///
/// `get_property` is pure and returns `None` for any property the concrete
/// kind does not have.
pub trait DataCell {
    fn get_property(&self, name: &PropertyName) -> Option<ComparableValue>;
}
