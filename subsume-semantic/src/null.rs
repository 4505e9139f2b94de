//! The default resolver: no ontology, exact-match semantics

use crate::{next_resolver_id, SemanticResolver, Subsumption};
use subsume_vocab::{Iri, PrefixMap};

/// Resolver with no ontology behind it.
///
/// `is_subconcept(a, b)` is `Yes` iff `a == b` after prefix expansion and
/// `No` otherwise (never `Unknown`). With this resolver, schemas without
/// `stype` annotations behave exactly as purely structural schemas.
#[derive(Debug)]
pub struct NullResolver {
    prefixes: PrefixMap,
    id: u64,
}

impl NullResolver {
    /// Create a null resolver with the standard prefix bindings
    pub fn new() -> NullResolver {
        NullResolver::with_prefixes(PrefixMap::with_defaults())
    }

    /// Create a null resolver with custom prefix bindings
    pub fn with_prefixes(prefixes: PrefixMap) -> NullResolver {
        NullResolver {
            prefixes,
            id: next_resolver_id(),
        }
    }
}

impl Default for NullResolver {
    fn default() -> Self {
        NullResolver::new()
    }
}

impl SemanticResolver for NullResolver {
    fn normalize(&self, stype: &str) -> Iri {
        self.prefixes.normalize(stype)
    }

    fn is_subconcept(&self, narrower: &Iri, broader: &Iri) -> Subsumption {
        if narrower == broader {
            Subsumption::Yes
        } else {
            Subsumption::No
        }
    }

    fn resolver_id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_iris_subsume() {
        let resolver = NullResolver::new();
        let a = resolver.normalize("quantitykind:Temperature");
        let b = resolver.normalize("http://qudt.org/vocab/quantitykind/Temperature");
        assert_eq!(a, b);
        assert_eq!(resolver.is_subconcept(&a, &b), Subsumption::Yes);
        assert!(resolver.equivalent(&a, &b));
    }

    #[test]
    fn test_distinct_iris_do_not() {
        let resolver = NullResolver::new();
        let a = resolver.normalize("foaf:Person");
        let b = resolver.normalize("foaf:Agent");
        assert_eq!(resolver.is_subconcept(&a, &b), Subsumption::No);
        assert!(!resolver.equivalent(&a, &b));
    }
}
