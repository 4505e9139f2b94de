//! In-memory concept graph with precomputed subsumption closure
//!
//! Edges come from `skos:broader` and `rdfs:subClassOf` statements (both
//! mean "narrower concept points at broader concept" here). The transitive
//! closure of each concept's ancestors is computed once at build time with
//! a cycle-safe BFS, so queries are a set lookup plus a small cache.

use crate::{next_resolver_id, SemanticResolver, Subsumption};
use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use subsume_vocab::{Iri, PrefixMap};
use tracing::debug;

/// Builder collecting concept relations before closure computation
#[derive(Debug)]
pub struct ConceptGraphBuilder {
    prefixes: PrefixMap,
    /// narrower -> immediate broader concepts
    direct_broader: FxHashMap<Iri, SmallVec<[Iri; 2]>>,
    known: FxHashSet<Iri>,
}

impl ConceptGraphBuilder {
    /// Start a builder with the standard prefix bindings
    pub fn new() -> ConceptGraphBuilder {
        ConceptGraphBuilder::with_prefixes(PrefixMap::with_defaults())
    }

    /// Start a builder with custom prefix bindings
    pub fn with_prefixes(prefixes: PrefixMap) -> ConceptGraphBuilder {
        ConceptGraphBuilder {
            prefixes,
            direct_broader: FxHashMap::default(),
            known: FxHashSet::default(),
        }
    }

    /// Record `narrower skos:broader broader`.
    ///
    /// Both arguments may be compact (`prefix:local`) or full IRIs.
    pub fn add_broader(&mut self, narrower: &str, broader: &str) -> &mut Self {
        let narrower = self.prefixes.normalize(narrower);
        let broader = self.prefixes.normalize(broader);
        self.known.insert(narrower.clone());
        self.known.insert(broader.clone());
        self.direct_broader
            .entry(narrower)
            .or_default()
            .push(broader);
        self
    }

    /// Record `sub rdfs:subClassOf sup` (same lattice direction as
    /// `skos:broader`)
    pub fn add_subclass_of(&mut self, sub: &str, sup: &str) -> &mut Self {
        self.add_broader(sub, sup)
    }

    /// Declare a concept with no relations, making it *known* (queries
    /// against it answer `No` rather than `Unknown`)
    pub fn declare(&mut self, concept: &str) -> &mut Self {
        let iri = self.prefixes.normalize(concept);
        self.known.insert(iri);
        self
    }

    /// Compute closures and freeze the graph
    pub fn build(self) -> ConceptGraph {
        let closure = compute_ancestor_closure(&self.direct_broader);
        debug!(
            concepts = self.known.len(),
            edges = self.direct_broader.values().map(|v| v.len()).sum::<usize>(),
            "built concept graph"
        );
        ConceptGraph {
            prefixes: self.prefixes,
            known: self.known,
            closure,
            cache: DashMap::new(),
            id: next_resolver_id(),
        }
    }
}

impl Default for ConceptGraphBuilder {
    fn default() -> Self {
        ConceptGraphBuilder::new()
    }
}

/// Immutable concept graph answering subsumption queries
#[derive(Debug)]
pub struct ConceptGraph {
    prefixes: PrefixMap,
    known: FxHashSet<Iri>,
    /// concept -> all broader ancestors (transitively, excluding itself)
    closure: FxHashMap<Iri, Arc<[Iri]>>,
    /// Relation cache; writers all compute the same value, so
    /// insert-or-ignore semantics are fine
    cache: DashMap<(Iri, Iri), Subsumption>,
    id: u64,
}

impl ConceptGraph {
    /// Start building a graph
    pub fn builder() -> ConceptGraphBuilder {
        ConceptGraphBuilder::new()
    }

    /// Number of known concepts
    pub fn concept_count(&self) -> usize {
        self.known.len()
    }

    /// All broader ancestors of a concept (transitively)
    pub fn ancestors_of(&self, concept: &Iri) -> &[Iri] {
        self.closure
            .get(concept)
            .map(|arc| arc.as_ref())
            .unwrap_or(&[])
    }

    fn resolve(&self, narrower: &Iri, broader: &Iri) -> Subsumption {
        if narrower == broader {
            return Subsumption::Yes;
        }
        if !self.known.contains(narrower) || !self.known.contains(broader) {
            return Subsumption::Unknown;
        }
        if self.ancestors_of(narrower).contains(broader) {
            Subsumption::Yes
        } else {
            Subsumption::No
        }
    }
}

impl SemanticResolver for ConceptGraph {
    fn normalize(&self, stype: &str) -> Iri {
        self.prefixes.normalize(stype)
    }

    fn is_subconcept(&self, narrower: &Iri, broader: &Iri) -> Subsumption {
        let key = (narrower.clone(), broader.clone());
        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }
        let answer = self.resolve(narrower, broader);
        self.cache.insert(key, answer);
        answer
    }

    fn resolver_id(&self) -> u64 {
        self.id
    }
}

/// BFS ancestor closure per concept; cycles terminate because visited
/// concepts are never re-enqueued
fn compute_ancestor_closure(
    direct: &FxHashMap<Iri, SmallVec<[Iri; 2]>>,
) -> FxHashMap<Iri, Arc<[Iri]>> {
    let mut closure: FxHashMap<Iri, Arc<[Iri]>> = FxHashMap::default();
    for start in direct.keys() {
        let mut visited: FxHashSet<&Iri> = FxHashSet::default();
        let mut queue: VecDeque<&Iri> = VecDeque::new();
        let mut ancestors: Vec<Iri> = Vec::new();

        visited.insert(start);
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if let Some(parents) = direct.get(current) {
                for parent in parents {
                    if visited.insert(parent) {
                        ancestors.push(parent.clone());
                        queue.push_back(parent);
                    }
                }
            }
        }
        if !ancestors.is_empty() {
            closure.insert(start.clone(), ancestors.into());
        }
    }
    closure
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(edges: &[(&str, &str)]) -> ConceptGraph {
        let mut builder = ConceptGraph::builder();
        for (narrower, broader) in edges {
            builder.add_broader(narrower, broader);
        }
        builder.build()
    }

    fn check(graph: &ConceptGraph, narrower: &str, broader: &str) -> Subsumption {
        let a = graph.normalize(narrower);
        let b = graph.normalize(broader);
        graph.is_subconcept(&a, &b)
    }

    #[test]
    fn test_reflexive() {
        let graph = graph_of(&[("ex:Dog", "ex:Animal")]);
        assert_eq!(check(&graph, "ex:Dog", "ex:Dog"), Subsumption::Yes);
    }

    #[test]
    fn test_direct_and_transitive() {
        // Poodle -> Dog -> Animal
        let graph = graph_of(&[("ex:Poodle", "ex:Dog"), ("ex:Dog", "ex:Animal")]);
        assert_eq!(check(&graph, "ex:Poodle", "ex:Dog"), Subsumption::Yes);
        assert_eq!(check(&graph, "ex:Poodle", "ex:Animal"), Subsumption::Yes);
        // Direction matters
        assert_eq!(check(&graph, "ex:Animal", "ex:Poodle"), Subsumption::No);
    }

    #[test]
    fn test_unrelated_known_concepts() {
        let graph = graph_of(&[("ex:Dog", "ex:Animal"), ("ex:Oak", "ex:Tree")]);
        assert_eq!(check(&graph, "ex:Dog", "ex:Tree"), Subsumption::No);
    }

    #[test]
    fn test_unknown_concept() {
        let graph = graph_of(&[("ex:Dog", "ex:Animal")]);
        assert_eq!(check(&graph, "ex:Cat", "ex:Animal"), Subsumption::Unknown);
        assert_eq!(check(&graph, "ex:Dog", "ex:Plant"), Subsumption::Unknown);
    }

    #[test]
    fn test_declared_concept_answers_no() {
        let mut builder = ConceptGraph::builder();
        builder.add_broader("ex:Dog", "ex:Animal");
        builder.declare("ex:Mineral");
        let graph = builder.build();
        assert_eq!(check(&graph, "ex:Dog", "ex:Mineral"), Subsumption::No);
    }

    #[test]
    fn test_diamond() {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        let graph = graph_of(&[
            ("ex:D", "ex:B"),
            ("ex:D", "ex:C"),
            ("ex:B", "ex:A"),
            ("ex:C", "ex:A"),
        ]);
        assert_eq!(check(&graph, "ex:D", "ex:A"), Subsumption::Yes);
        let d = graph.normalize("ex:D");
        assert_eq!(graph.ancestors_of(&d).len(), 3);
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = graph_of(&[
            ("ex:A", "ex:B"),
            ("ex:B", "ex:C"),
            ("ex:C", "ex:A"),
        ]);
        assert_eq!(check(&graph, "ex:A", "ex:C"), Subsumption::Yes);
        assert_eq!(check(&graph, "ex:C", "ex:A"), Subsumption::Yes);
    }

    #[test]
    fn test_equivalent_via_mutual_subsumption() {
        let graph = graph_of(&[("ex:A", "ex:B"), ("ex:B", "ex:A")]);
        let a = graph.normalize("ex:A");
        let b = graph.normalize("ex:B");
        assert!(graph.equivalent(&a, &b));
    }

    #[test]
    fn test_skos_example() {
        let graph = graph_of(&[(
            "quantitykind:ThermodynamicTemperature",
            "quantitykind:Temperature",
        )]);
        assert_eq!(
            check(
                &graph,
                "quantitykind:ThermodynamicTemperature",
                "quantitykind:Temperature"
            ),
            Subsumption::Yes
        );
        assert_eq!(
            check(
                &graph,
                "quantitykind:Temperature",
                "quantitykind:ThermodynamicTemperature"
            ),
            Subsumption::No
        );
    }
}
