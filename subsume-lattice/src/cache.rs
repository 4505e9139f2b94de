//! Query memoization
//!
//! Answers are keyed by the structural hashes of the canonicalized inputs,
//! the query kind, and the resolver identity. A new ontology means a new
//! resolver identity, which is how stale semantic answers are invalidated.
//! The maps are read-mostly; concurrent writers all compute equivalent
//! values, so insert-or-ignore semantics are fine.

use crate::driver::Diagnostic;
use dashmap::DashMap;
use serde_json::Value;
use subsume_core::decision::Decision;

/// What was asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Subtype,
    Meet,
    Join,
}

/// Cache key for one query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Structural hash of the canonicalized left schema
    pub lhs: u64,
    /// Structural hash of the canonicalized right schema
    pub rhs: u64,
    pub kind: QueryKind,
    /// Resolver identity the answer depended on
    pub resolver: u64,
}

/// In-memory memoization for engine queries
#[derive(Debug, Default)]
pub struct QueryCache {
    decisions: DashMap<CacheKey, (Decision, Vec<Diagnostic>)>,
    schemas: DashMap<CacheKey, Value>,
}

impl QueryCache {
    /// Create an empty cache
    pub fn new() -> QueryCache {
        QueryCache::default()
    }

    /// Look up a memoized subtype decision
    pub fn decision(&self, key: &CacheKey) -> Option<(Decision, Vec<Diagnostic>)> {
        self.decisions.get(key).map(|entry| entry.clone())
    }

    /// Memoize a subtype decision
    pub fn store_decision(&self, key: CacheKey, decision: Decision, diagnostics: Vec<Diagnostic>) {
        self.decisions.insert(key, (decision, diagnostics));
    }

    /// Look up a memoized meet/join result
    pub fn schema(&self, key: &CacheKey) -> Option<Value> {
        self.schemas.get(key).map(|entry| entry.clone())
    }

    /// Memoize a meet/join result
    pub fn store_schema(&self, key: CacheKey, value: Value) {
        self.schemas.insert(key, value);
    }

    /// Number of memoized answers
    pub fn len(&self) -> usize {
        self.decisions.len() + self.schemas.len()
    }

    /// True when nothing is memoized
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
