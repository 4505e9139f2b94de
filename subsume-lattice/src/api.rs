//! Public façade
//!
//! The free functions answer one-off queries with the default (null)
//! resolver, mirroring the way most callers use the library. An [`Engine`]
//! carries an injected resolver and a memoization cache across queries;
//! building a new engine around a new resolver is the cache-invalidation
//! story.

use crate::cache::{CacheKey, QueryCache, QueryKind};
use crate::canon::{canonicalize_document, CanonOptions};
use crate::driver::{Diagnostic, Merger, Subtyper};
use crate::serialize::serialize;
use serde_json::Value;
use std::sync::Arc;
use subsume_core::canonical::SchemaGraph;
use subsume_core::decision::Decision;
use subsume_core::error::Result;
use subsume_semantic::{NullResolver, SemanticResolver};
use tracing::debug;

/// Outcome of a tri-valued subtype query
#[derive(Debug, Clone)]
pub struct SubtypeReport {
    pub decision: Decision,
    /// Resolver pairs the engine could not settle; lets callers tell
    /// "no" apart from "don't know"
    pub diagnostics: Vec<Diagnostic>,
}

impl SubtypeReport {
    /// The conservative boolean reading (`Unknown` counts as not proven)
    pub fn holds(&self) -> bool {
        self.decision.to_bool_conservative()
    }
}

/// Reusable query engine with an injected resolver and a memo cache
pub struct Engine {
    resolver: Arc<dyn SemanticResolver>,
    cache: QueryCache,
    options: CanonOptions,
}

impl Engine {
    /// Engine with the default null resolver (purely structural semantics)
    pub fn new() -> Engine {
        Engine::with_resolver(Arc::new(NullResolver::new()))
    }

    /// Engine around an injected resolver
    pub fn with_resolver(resolver: Arc<dyn SemanticResolver>) -> Engine {
        Engine {
            resolver,
            cache: QueryCache::new(),
            options: CanonOptions::default(),
        }
    }

    /// Override canonicalization options
    pub fn with_options(mut self, options: CanonOptions) -> Engine {
        self.options = options;
        self
    }

    /// Tri-valued subtype check with diagnostics
    pub fn check_subschema(&self, lhs: &Value, rhs: &Value) -> Result<SubtypeReport> {
        let mut graph = SchemaGraph::new();
        let left = canonicalize_document(&mut graph, lhs, self.resolver.as_ref(), &self.options)?;
        let right = canonicalize_document(&mut graph, rhs, self.resolver.as_ref(), &self.options)?;

        let key = CacheKey {
            lhs: graph.structural_hash(left),
            rhs: graph.structural_hash(right),
            kind: QueryKind::Subtype,
            resolver: self.resolver.resolver_id(),
        };
        if let Some((decision, diagnostics)) = self.cache.decision(&key) {
            debug!(?decision, "subtype answer from cache");
            return Ok(SubtypeReport {
                decision,
                diagnostics,
            });
        }

        let mut checker = Subtyper::new(&graph, self.resolver.as_ref());
        let decision = checker.subtype_nodes(left, right)?;
        let diagnostics = checker.diagnostics;
        self.cache
            .store_decision(key, decision, diagnostics.clone());
        debug!(?decision, "subtype decided");
        Ok(SubtypeReport {
            decision,
            diagnostics,
        })
    }

    /// `lhs <: rhs` as a boolean (`Unknown` maps to `false`)
    pub fn is_subschema(&self, lhs: &Value, rhs: &Value) -> Result<bool> {
        Ok(self.check_subschema(lhs, rhs)?.holds())
    }

    /// Mutual subtyping
    pub fn is_equivalent(&self, lhs: &Value, rhs: &Value) -> Result<bool> {
        Ok(self.is_subschema(lhs, rhs)? && self.is_subschema(rhs, lhs)?)
    }

    /// Greatest schema accepted by both inputs
    pub fn meet(&self, lhs: &Value, rhs: &Value) -> Result<Value> {
        self.merge(lhs, rhs, QueryKind::Meet)
    }

    /// Least schema accepting either input
    pub fn join(&self, lhs: &Value, rhs: &Value) -> Result<Value> {
        self.merge(lhs, rhs, QueryKind::Join)
    }

    fn merge(&self, lhs: &Value, rhs: &Value, kind: QueryKind) -> Result<Value> {
        let mut graph = SchemaGraph::new();
        let left = canonicalize_document(&mut graph, lhs, self.resolver.as_ref(), &self.options)?;
        let right = canonicalize_document(&mut graph, rhs, self.resolver.as_ref(), &self.options)?;

        let key = CacheKey {
            lhs: graph.structural_hash(left),
            rhs: graph.structural_hash(right),
            kind,
            resolver: self.resolver.resolver_id(),
        };
        if let Some(value) = self.cache.schema(&key) {
            return Ok(value);
        }

        let mut merger = Merger::new(&mut graph, self.resolver.as_ref());
        let merged = match kind {
            QueryKind::Meet => merger.meet_nodes(left, right),
            QueryKind::Join => merger.join_nodes(left, right),
            QueryKind::Subtype => unreachable!("merge is only called for meet/join"),
        };
        let value = serialize(&graph, merged);
        self.cache.store_schema(key, value.clone());
        Ok(value)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

/// One-off subtype check with the null resolver
pub fn is_subschema(lhs: &Value, rhs: &Value) -> Result<bool> {
    Engine::new().is_subschema(lhs, rhs)
}

/// One-off equivalence check with the null resolver
pub fn is_equivalent(lhs: &Value, rhs: &Value) -> Result<bool> {
    Engine::new().is_equivalent(lhs, rhs)
}

/// One-off meet with the null resolver
pub fn meet(lhs: &Value, rhs: &Value) -> Result<Value> {
    Engine::new().meet(lhs, rhs)
}

/// One-off join with the null resolver
pub fn join(lhs: &Value, rhs: &Value) -> Result<Value> {
    Engine::new().join(lhs, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_subtype() {
        assert!(is_subschema(&json!({"type": "integer"}), &json!({"type": "number"})).unwrap());
        assert!(!is_subschema(&json!({"type": "number"}), &json!({"type": "integer"})).unwrap());
    }

    #[test]
    fn test_cache_hit_answers_consistently() {
        let engine = Engine::new();
        let lhs = json!({"type": "integer", "minimum": 0});
        let rhs = json!({"type": "number"});
        assert!(engine.is_subschema(&lhs, &rhs).unwrap());
        // Second call hits the cache
        assert!(engine.is_subschema(&lhs, &rhs).unwrap());
    }

    #[test]
    fn test_meet_and_join_return_schemas() {
        let a = json!({"type": "number", "minimum": 0});
        let b = json!({"type": "number", "maximum": 10});
        let met = meet(&a, &b).unwrap();
        assert!(is_subschema(&met, &a).unwrap());
        assert!(is_subschema(&met, &b).unwrap());

        let joined = join(&a, &b).unwrap();
        assert!(is_subschema(&a, &joined).unwrap());
        assert!(is_subschema(&b, &joined).unwrap());
    }
}
