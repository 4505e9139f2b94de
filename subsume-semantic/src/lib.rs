//! Semantic-type resolution
//!
//! The subtype lattice consults a [`SemanticResolver`] whenever two atoms
//! carry `stype` annotations. The resolver is the *only* source of semantic
//! truth: the engine never parses ontology formats itself, it only asks
//! subsumption questions about already-normalized IRIs.
//!
//! Two implementations ship here:
//! - [`NullResolver`] (the default): equal IRIs are subsumed, everything
//!   else is not. Schemas without `stype` behave exactly as they would
//!   without semantic reasoning.
//! - [`ConceptGraph`]: an in-memory edge store over `skos:broader` /
//!   `rdfs:subClassOf` with a precomputed transitive closure.

mod graph;
mod null;

pub use graph::{ConceptGraph, ConceptGraphBuilder};
pub use null::NullResolver;

use std::sync::atomic::{AtomicU64, Ordering};
use subsume_vocab::Iri;

/// Answer to an ontological subsumption query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsumption {
    /// The narrower concept is subsumed by the broader one
    Yes,
    /// Both concepts are known and unrelated
    No,
    /// At least one concept is unknown to the resolver
    Unknown,
}

/// Oracle answering subsumption queries over concept IRIs.
///
/// Implementations must be pure: repeated calls with the same arguments
/// return the same answer, and calls are safe from multiple threads.
pub trait SemanticResolver: Send + Sync {
    /// Expand an `stype` value (compact or full) to a full IRI
    fn normalize(&self, stype: &str) -> Iri;

    /// Is `narrower` subsumed by `broader` (transitively, reflexively)?
    fn is_subconcept(&self, narrower: &Iri, broader: &Iri) -> Subsumption;

    /// Mutual subsumption
    fn equivalent(&self, a: &Iri, b: &Iri) -> bool {
        self.is_subconcept(a, b) == Subsumption::Yes
            && self.is_subconcept(b, a) == Subsumption::Yes
    }

    /// Stable identity used for cache keying.
    ///
    /// Loading a new ontology produces a resolver with a fresh identity,
    /// which invalidates every memoized answer that depended on the old one.
    fn resolver_id(&self) -> u64;
}

static NEXT_RESOLVER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique resolver identity
pub fn next_resolver_id() -> u64 {
    NEXT_RESOLVER_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_ids_are_unique() {
        let a = next_resolver_id();
        let b = next_resolver_id();
        assert_ne!(a, b);
    }
}
