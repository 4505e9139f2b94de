//! Canonical schema representation
//!
//! A canonical schema is a disjunction of typed atoms. Nodes live in a
//! [`SchemaGraph`] arena and reference each other by [`SchemaId`], so cyclic
//! `$ref` structures are expressible without ownership cycles: edges are
//! indices, and a node under construction can be reserved first and patched
//! once its parts exist.
//!
//! Canonical values are immutable once built; operations always produce
//! fresh nodes. Two sentinels exist by construction:
//! - **Bottom** is the empty disjunction (accepts nothing),
//! - **Top** is one unconstrained atom per base type (accepts everything);
//!   its array/object atoms point back at Top itself.

use crate::numeric::NumConstraint;
use crate::types::{BaseType, ALL_BASE_TYPES};
use crate::value::hash_value;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde_json::Value;
use std::hash::{Hash, Hasher};
use subsume_pattern::Pattern;
use subsume_vocab::Iri;

/// Index of a canonical node within its [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub u32);

/// A canonical node: the disjunction of its atoms
#[derive(Debug, Clone, Default)]
pub struct Disjunction {
    pub atoms: Vec<Atom>,
}

impl Disjunction {
    /// The empty disjunction (Bottom)
    pub fn empty() -> Disjunction {
        Disjunction::default()
    }

    /// A single-atom disjunction
    pub fn of(atom: Atom) -> Disjunction {
        Disjunction { atoms: vec![atom] }
    }

    /// True when this node accepts nothing
    pub fn is_bottom(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// A single-base-type constraint bundle
#[derive(Debug, Clone)]
pub struct Atom {
    pub base: BaseType,
    /// Optional ontology concept constraining instances semantically
    pub semantic: Option<Iri>,
    /// Optional finite value restriction
    pub enumeration: Option<Vec<Value>>,
    /// Complemented atom whose complement the kernels cannot represent
    /// exactly; treated as opaque by the kernels
    pub negated: bool,
    pub constraint: Constraint,
}

impl Atom {
    /// An atom with no constraints for base types that carry none
    /// beyond the enum (Null, Boolean)
    pub fn bare(base: BaseType) -> Atom {
        Atom {
            base,
            semantic: None,
            enumeration: None,
            negated: false,
            constraint: Constraint::None,
        }
    }

    /// An atom wrapping a numeric constraint
    pub fn numeric(base: BaseType, constraint: NumConstraint) -> Atom {
        Atom {
            base,
            semantic: None,
            enumeration: None,
            negated: false,
            constraint: Constraint::Numeric(constraint),
        }
    }
}

/// Per-base-type constraint payload
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Null and Boolean carry nothing beyond the enum
    None,
    Numeric(NumConstraint),
    String(StrConstraint),
    Array(ArrayConstraint),
    Object(ObjectConstraint),
}

/// String constraints: length interval plus an optional anchored pattern
#[derive(Debug, Clone, Default)]
pub struct StrConstraint {
    pub min_length: u64,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
}

impl StrConstraint {
    /// Length interval emptiness
    pub fn is_length_empty(&self) -> bool {
        self.max_length.is_some_and(|max| self.min_length > max)
    }
}

/// Array constraints
#[derive(Debug, Clone)]
pub struct ArrayConstraint {
    pub min_items: u64,
    pub max_items: Option<u64>,
    pub unique: bool,
    pub items: Items,
}

/// The element shape of an array
#[derive(Debug, Clone)]
pub enum Items {
    /// One schema applied at every position
    Uniform(SchemaId),
    /// A positional prefix followed by a schema for the remaining positions
    /// (`rest` pointing at Bottom forbids extra items)
    Tuple {
        prefix: Vec<SchemaId>,
        rest: SchemaId,
    },
}

/// Object constraints
#[derive(Debug, Clone)]
pub struct ObjectConstraint {
    pub min_properties: u64,
    pub max_properties: Option<u64>,
    /// Sorted, deduplicated required property names
    pub required: Vec<String>,
    /// Declared properties in input order (order never affects answers)
    pub properties: Vec<(String, SchemaId)>,
    /// Pattern-keyed properties in input order
    pub pattern_properties: Vec<(Pattern, SchemaId)>,
    /// Schema for undeclared properties (Bottom forbids them)
    pub additional: SchemaId,
}

impl ObjectConstraint {
    /// Look up a declared property schema by name
    pub fn property(&self, name: &str) -> Option<SchemaId> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }
}

/// Arena holding canonical nodes; edges are [`SchemaId`] indices
#[derive(Debug, Default)]
pub struct SchemaGraph {
    nodes: Vec<Disjunction>,
    top: Option<SchemaId>,
    bottom: Option<SchemaId>,
}

impl SchemaGraph {
    /// Create an empty graph
    pub fn new() -> SchemaGraph {
        SchemaGraph::default()
    }

    /// Append a node
    pub fn add(&mut self, node: Disjunction) -> SchemaId {
        let id = SchemaId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Reserve an index for a node whose parts are still being built
    /// (cyclic `$ref` recursion points). Must be patched before use.
    pub fn reserve(&mut self) -> SchemaId {
        self.add(Disjunction::empty())
    }

    /// Fill in a reserved node
    pub fn patch(&mut self, id: SchemaId, node: Disjunction) {
        self.nodes[id.0 as usize] = node;
    }

    /// Read a node
    pub fn node(&self, id: SchemaId) -> &Disjunction {
        &self.nodes[id.0 as usize]
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The Bottom sentinel (memoized)
    pub fn bottom(&mut self) -> SchemaId {
        if let Some(id) = self.bottom {
            return id;
        }
        let id = self.add(Disjunction::empty());
        self.bottom = Some(id);
        id
    }

    /// The Top sentinel (memoized): one unconstrained atom per base type.
    ///
    /// Array and Object atoms reference Top itself, so the node is reserved
    /// before its atoms are built.
    pub fn top(&mut self) -> SchemaId {
        if let Some(id) = self.top {
            return id;
        }
        let id = self.reserve();
        self.top = Some(id);
        let atoms = ALL_BASE_TYPES
            .iter()
            .map(|&base| self.unconstrained_atom(base, id))
            .collect();
        self.patch(id, Disjunction { atoms });
        id
    }

    /// An atom accepting its whole base-type domain; `top` supplies the
    /// nested schema for array/object positions
    pub fn unconstrained_atom(&mut self, base: BaseType, top: SchemaId) -> Atom {
        let constraint = match base {
            BaseType::Null | BaseType::Boolean => Constraint::None,
            BaseType::Integer => Constraint::Numeric(NumConstraint::unconstrained(true)),
            BaseType::Number => Constraint::Numeric(NumConstraint::unconstrained(false)),
            BaseType::String => Constraint::String(StrConstraint::default()),
            BaseType::Array => Constraint::Array(ArrayConstraint {
                min_items: 0,
                max_items: None,
                unique: false,
                items: Items::Uniform(top),
            }),
            BaseType::Object => Constraint::Object(ObjectConstraint {
                min_properties: 0,
                max_properties: None,
                required: Vec::new(),
                properties: Vec::new(),
                pattern_properties: Vec::new(),
                additional: top,
            }),
        };
        Atom {
            base,
            semantic: None,
            enumeration: None,
            negated: false,
            constraint,
        }
    }

    /// True when the node accepts nothing
    pub fn is_bottom(&self, id: SchemaId) -> bool {
        self.node(id).is_bottom()
    }

    /// Cycle-aware structural hash of the subgraph rooted at `root`.
    ///
    /// Back-edges hash as the DFS discovery index of their target, so
    /// isomorphic cyclic graphs built in the same traversal order agree.
    pub fn structural_hash(&self, root: SchemaId) -> u64 {
        let mut hasher = FxHasher::default();
        let mut discovery: FxHashMap<u32, u32> = FxHashMap::default();
        self.hash_node(root, &mut discovery, &mut hasher);
        hasher.finish()
    }

    fn hash_node(
        &self,
        id: SchemaId,
        discovery: &mut FxHashMap<u32, u32>,
        state: &mut FxHasher,
    ) {
        if let Some(&index) = discovery.get(&id.0) {
            state.write_u8(0xFE);
            state.write_u32(index);
            return;
        }
        discovery.insert(id.0, discovery.len() as u32);

        let node = self.node(id);
        state.write_usize(node.atoms.len());
        for atom in &node.atoms {
            self.hash_atom(atom, discovery, state);
        }
    }

    fn hash_atom(
        &self,
        atom: &Atom,
        discovery: &mut FxHashMap<u32, u32>,
        state: &mut FxHasher,
    ) {
        atom.base.hash(state);
        atom.negated.hash(state);
        match &atom.semantic {
            Some(iri) => {
                state.write_u8(1);
                iri.as_str().hash(state);
            }
            None => state.write_u8(0),
        }
        match &atom.enumeration {
            Some(values) => {
                state.write_u8(1);
                state.write_usize(values.len());
                for value in values {
                    hash_value(value, state);
                }
            }
            None => state.write_u8(0),
        }
        match &atom.constraint {
            Constraint::None => state.write_u8(0),
            Constraint::Numeric(num) => {
                state.write_u8(1);
                num.hash(state);
            }
            Constraint::String(s) => {
                state.write_u8(2);
                s.min_length.hash(state);
                s.max_length.hash(state);
                match &s.pattern {
                    Some(p) => p.source().hash(state),
                    None => state.write_u8(0),
                }
            }
            Constraint::Array(a) => {
                state.write_u8(3);
                a.min_items.hash(state);
                a.max_items.hash(state);
                a.unique.hash(state);
                match &a.items {
                    Items::Uniform(id) => {
                        state.write_u8(0);
                        self.hash_node(*id, discovery, state);
                    }
                    Items::Tuple { prefix, rest } => {
                        state.write_u8(1);
                        state.write_usize(prefix.len());
                        for id in prefix {
                            self.hash_node(*id, discovery, state);
                        }
                        self.hash_node(*rest, discovery, state);
                    }
                }
            }
            Constraint::Object(o) => {
                state.write_u8(4);
                o.min_properties.hash(state);
                o.max_properties.hash(state);
                o.required.hash(state);
                // Property order is not semantic; hash name-sorted
                let mut names: Vec<&(String, SchemaId)> = o.properties.iter().collect();
                names.sort_by(|a, b| a.0.cmp(&b.0));
                state.write_usize(names.len());
                for (name, id) in names {
                    name.hash(state);
                    self.hash_node(*id, discovery, state);
                }
                let mut patterns: Vec<&(Pattern, SchemaId)> =
                    o.pattern_properties.iter().collect();
                patterns.sort_by(|a, b| a.0.source().cmp(b.0.source()));
                state.write_usize(patterns.len());
                for (pattern, id) in patterns {
                    pattern.source().hash(state);
                    self.hash_node(*id, discovery, state);
                }
                self.hash_node(o.additional, discovery, state);
            }
        }
    }
}

/// Coinductive structural equality of two canonical nodes.
///
/// Pairs currently being compared are assumed equal on revisit, which gives
/// the greatest-fixed-point reading cyclic schemas need. Atoms are matched
/// as a multiset; patterns compare by source text (conservative: equivalent
/// spellings may differ).
pub fn nodes_equal(a: &SchemaGraph, ai: SchemaId, b: &SchemaGraph, bi: SchemaId) -> bool {
    let mut visiting = FxHashSet::default();
    nodes_equal_inner(a, ai, b, bi, &mut visiting)
}

fn nodes_equal_inner(
    a: &SchemaGraph,
    ai: SchemaId,
    b: &SchemaGraph,
    bi: SchemaId,
    visiting: &mut FxHashSet<(u32, u32)>,
) -> bool {
    if !visiting.insert((ai.0, bi.0)) {
        return true;
    }
    let (na, nb) = (a.node(ai), b.node(bi));
    if na.atoms.len() != nb.atoms.len() {
        visiting.remove(&(ai.0, bi.0));
        return false;
    }
    // Greedy multiset match; atom counts are small
    let mut used = vec![false; nb.atoms.len()];
    let matched = na.atoms.iter().all(|atom_a| {
        nb.atoms.iter().enumerate().any(|(i, atom_b)| {
            if used[i] {
                return false;
            }
            if atoms_equal_inner(a, atom_a, b, atom_b, visiting) {
                used[i] = true;
                true
            } else {
                false
            }
        })
    });
    visiting.remove(&(ai.0, bi.0));
    matched
}

/// Structural equality of two atoms (recursing through nested schemas)
pub fn atoms_equal(a: &SchemaGraph, atom_a: &Atom, b: &SchemaGraph, atom_b: &Atom) -> bool {
    let mut visiting = FxHashSet::default();
    atoms_equal_inner(a, atom_a, b, atom_b, &mut visiting)
}

fn atoms_equal_inner(
    a: &SchemaGraph,
    atom_a: &Atom,
    b: &SchemaGraph,
    atom_b: &Atom,
    visiting: &mut FxHashSet<(u32, u32)>,
) -> bool {
    if atom_a.base != atom_b.base
        || atom_a.negated != atom_b.negated
        || atom_a.semantic != atom_b.semantic
    {
        return false;
    }
    match (&atom_a.enumeration, &atom_b.enumeration) {
        (None, None) => {}
        (Some(xs), Some(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let all_in = xs.iter().all(|x| crate::value::json_contains(ys, x))
                && ys.iter().all(|y| crate::value::json_contains(xs, y));
            if !all_in {
                return false;
            }
        }
        _ => return false,
    }
    match (&atom_a.constraint, &atom_b.constraint) {
        (Constraint::None, Constraint::None) => true,
        (Constraint::Numeric(x), Constraint::Numeric(y)) => x == y,
        (Constraint::String(x), Constraint::String(y)) => {
            x.min_length == y.min_length
                && x.max_length == y.max_length
                && match (&x.pattern, &y.pattern) {
                    (None, None) => true,
                    (Some(p), Some(q)) => p.source() == q.source(),
                    _ => false,
                }
        }
        (Constraint::Array(x), Constraint::Array(y)) => {
            x.min_items == y.min_items
                && x.max_items == y.max_items
                && x.unique == y.unique
                && match (&x.items, &y.items) {
                    (Items::Uniform(i), Items::Uniform(j)) => {
                        nodes_equal_inner(a, *i, b, *j, visiting)
                    }
                    (
                        Items::Tuple { prefix: pa, rest: ra },
                        Items::Tuple { prefix: pb, rest: rb },
                    ) => {
                        pa.len() == pb.len()
                            && pa
                                .iter()
                                .zip(pb)
                                .all(|(i, j)| nodes_equal_inner(a, *i, b, *j, visiting))
                            && nodes_equal_inner(a, *ra, b, *rb, visiting)
                    }
                    _ => false,
                }
        }
        (Constraint::Object(x), Constraint::Object(y)) => {
            if x.min_properties != y.min_properties
                || x.max_properties != y.max_properties
                || x.required != y.required
                || x.properties.len() != y.properties.len()
                || x.pattern_properties.len() != y.pattern_properties.len()
            {
                return false;
            }
            let props_match = x.properties.iter().all(|(name, i)| {
                y.property(name)
                    .is_some_and(|j| nodes_equal_inner(a, *i, b, j, visiting))
            });
            if !props_match {
                return false;
            }
            let patterns_match = x.pattern_properties.iter().all(|(p, i)| {
                y.pattern_properties
                    .iter()
                    .find(|(q, _)| q.source() == p.source())
                    .is_some_and(|(_, j)| nodes_equal_inner(a, *i, b, *j, visiting))
            });
            patterns_match && nodes_equal_inner(a, x.additional, b, y.additional, visiting)
        }
        _ => false,
    }
}
