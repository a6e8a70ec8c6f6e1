//! Query descriptors, canonical cache keys, and consistency tags.

use std::collections::BTreeMap;
use std::fmt;

/// Tag kinds used by the refcheck endpoints.
pub mod kinds {
    pub const REFERENCE: &str = "Reference";
    pub const REFEREE: &str = "Referee";
    pub const REPORT: &str = "Report";
}

/// Identifier half of a [`Tag`]: a concrete record or the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagId {
    Id(String),
    List,
}

/// Coarse-grained consistency label. Cache entries carry the tags their
/// endpoint provides; mutations declare the tags they invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub kind: &'static str,
    pub id: TagId,
}

impl Tag {
    pub fn id(kind: &'static str, id: impl fmt::Display) -> Self {
        Self {
            kind,
            id: TagId::Id(id.to_string()),
        }
    }

    pub fn list(kind: &'static str) -> Self {
        Self {
            kind,
            id: TagId::List,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::Id(id) => write!(f, "{}:{}", self.kind, id),
            TagId::List => write!(f, "{}:LIST", self.kind),
        }
    }
}

/// Identifies one query: an endpoint name plus its arguments.
///
/// Two descriptors with the same endpoint and the same arguments, in any
/// order, share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub endpoint: &'static str,
    pub args: Vec<(String, String)>,
}

impl QueryDescriptor {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.args.push((key.into(), value.to_string()));
        self
    }

    /// Canonical cache key: the endpoint plus its arguments sorted by key,
    /// so argument order never splits the cache.
    pub fn cache_key(&self) -> CacheKey {
        let sorted: BTreeMap<&str, &str> = self
            .args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut key = String::from(self.endpoint);
        for (k, v) in sorted {
            key.push('\u{1f}');
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        CacheKey(key)
    }
}

/// Canonical identity of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
