//! Top-level lattice driver
//!
//! Dispatches per-type kernels across canonical disjunctions. The subtype
//! rule is ∀∃: every left atom needs some right atom of a compatible base
//! type that covers it. Kernel verdicts combine with Kleene logic; semantic
//! subsumption is consulted per atom pair.
//!
//! Cyclic schemas: `subtype_nodes` keeps a visited-pair set and answers
//! `Yes` on revisit (greatest fixed point); `Merger` keeps an in-progress
//! map from node pairs to reserved arena slots, so meets/joins of cyclic
//! schemas tie the knot through the reservation.

use crate::kernels::string as string_kernel;
use crate::satisfies::value_satisfies_atom;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use subsume_core::canonical::{atoms_equal, Atom, Constraint, Disjunction, SchemaGraph, SchemaId};
use subsume_core::decision::Decision;
use subsume_core::error::{Error, Result};
use subsume_core::types::BaseType;
use subsume_core::value::json_contains;
use subsume_semantic::{SemanticResolver, Subsumption};
use subsume_vocab::Iri;
use tracing::trace;

/// Non-fatal findings produced while answering a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The resolver could not settle a subsumption pair the answer
    /// depends on; the engine answered conservatively
    ResolverUnknown { narrower: Iri, broader: Iri },
}

/// Subtype checker over one schema graph
pub struct Subtyper<'g, 'r> {
    pub(crate) graph: &'g SchemaGraph,
    pub(crate) resolver: &'r dyn SemanticResolver,
    visiting: FxHashSet<(u32, u32)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'g, 'r> Subtyper<'g, 'r> {
    /// Create a checker over `graph`
    pub fn new(graph: &'g SchemaGraph, resolver: &'r dyn SemanticResolver) -> Subtyper<'g, 'r> {
        Subtyper {
            graph,
            resolver,
            visiting: FxHashSet::default(),
            diagnostics: Vec::new(),
        }
    }

    /// `a <: b` over whole disjunctions
    pub fn subtype_nodes(&mut self, a: SchemaId, b: SchemaId) -> Result<Decision> {
        // Coinduction: a pair already being proved holds by assumption
        if !self.visiting.insert((a.0, b.0)) {
            return Ok(Decision::Yes);
        }
        let result = self.subtype_nodes_inner(a, b);
        self.visiting.remove(&(a.0, b.0));
        result
    }

    fn subtype_nodes_inner(&mut self, a: SchemaId, b: SchemaId) -> Result<Decision> {
        let graph = self.graph;
        let mut overall = Decision::Yes;
        for atom_a in &graph.node(a).atoms {
            let mut best = Decision::No;
            let mut unsupported: Option<Error> = None;
            for atom_b in &graph.node(b).atoms {
                if !bases_comparable(atom_a.base, atom_b.base) {
                    continue;
                }
                match self.atom_subtype(atom_a, atom_b) {
                    Ok(decision) => best = best.or(decision),
                    Err(err @ Error::Unsupported { .. }) => unsupported = Some(err),
                    Err(err) => return Err(err),
                }
                if best == Decision::Yes {
                    break;
                }
            }
            if best != Decision::Yes {
                if let Some(err) = unsupported {
                    return Err(err);
                }
            }
            overall = overall.and(best);
            if overall == Decision::No {
                return Ok(Decision::No);
            }
        }
        Ok(overall)
    }

    /// `x <: y` for two atoms of comparable base types
    pub(crate) fn atom_subtype(&mut self, x: &Atom, y: &Atom) -> Result<Decision> {
        let semantic = self.semantic_decision(&x.semantic, &y.semantic);
        if semantic == Decision::No {
            return Ok(Decision::No);
        }

        // Complemented atoms are opaque; only the structural fallbacks
        // decide them
        if x.negated || y.negated {
            if atoms_equal(self.graph, x, self.graph, y) {
                return Ok(semantic);
            }
            // ¬X <: ¬Y within one base iff Y <: X
            if x.negated && y.negated && x.base == y.base {
                let mut plain_x = x.clone();
                let mut plain_y = y.clone();
                plain_x.negated = false;
                plain_x.semantic = None;
                plain_y.negated = false;
                plain_y.semantic = None;
                let inner = self.atom_subtype(&plain_y, &plain_x)?;
                return Ok(inner.and(semantic));
            }
            if !y.negated && x.base.refines(&y.base) && atom_is_full_domain(self.graph, y) {
                return Ok(semantic);
            }
            // The full domain fits a complement only when nothing was
            // complemented away
            if y.negated && !x.negated && x.base == y.base && atom_is_full_domain(self.graph, x)
            {
                let mut plain_y = y.clone();
                plain_y.negated = false;
                plain_y.semantic = None;
                let empty = crate::canon::atom_is_empty(self.graph, &plain_y);
                return Ok(Decision::from_bool(empty).and(semantic));
            }
            return Err(Error::unsupported(
                "not",
                "complemented subschema cannot be compared structurally",
            ));
        }

        // Enum on the left: pointwise containment in the right atom
        if let Some(values) = &x.enumeration {
            let all_in = values
                .iter()
                .all(|v| value_satisfies_atom(self.graph, y, v));
            return Ok(Decision::from_bool(all_in).and(semantic));
        }

        // Enum on the right only: the left side must have a small finite
        // domain that enumerates into it
        if y.enumeration.is_some() {
            let contained = self.finite_domain_subtype(x, y);
            return Ok(contained.and(semantic));
        }

        let structural = match (&x.constraint, &y.constraint) {
            (Constraint::None, Constraint::None) => Decision::Yes,
            (Constraint::Numeric(cx), Constraint::Numeric(cy)) => {
                Decision::from_bool(cx.is_subtype_of(cy))
            }
            (Constraint::String(sx), Constraint::String(sy)) => {
                Decision::from_bool(string_kernel::subtype(sx, sy))
            }
            (Constraint::Array(ax), Constraint::Array(ay)) => {
                let (ax, ay) = (ax.clone(), ay.clone());
                self.array_subtype(&ax, &ay)?
            }
            (Constraint::Object(ox), Constraint::Object(oy)) => {
                let (ox, oy) = (ox.clone(), oy.clone());
                self.object_subtype(&ox, &oy)?
            }
            _ => Decision::No,
        };
        Ok(structural.and(semantic))
    }

    /// Semantic subsumption of two optional `stype` annotations.
    ///
    /// An absent right-hand stype is the top concept; an absent left-hand
    /// stype against a present right-hand one is not a subtype.
    fn semantic_decision(&mut self, x: &Option<Iri>, y: &Option<Iri>) -> Decision {
        match (x, y) {
            (_, None) => Decision::Yes,
            (None, Some(_)) => Decision::No,
            (Some(narrower), Some(broader)) => {
                match self.resolver.is_subconcept(narrower, broader) {
                    Subsumption::Yes => Decision::Yes,
                    Subsumption::No => Decision::No,
                    Subsumption::Unknown => {
                        self.diagnostics.push(Diagnostic::ResolverUnknown {
                            narrower: narrower.clone(),
                            broader: broader.clone(),
                        });
                        Decision::Unknown
                    }
                }
            }
        }
    }

    /// Left atom without enum against a right enum atom: decide by
    /// enumerating the left domain when it is provably small enough
    fn finite_domain_subtype(&mut self, x: &Atom, y: &Atom) -> Decision {
        let graph = self.graph;
        let candidates: Option<Vec<Value>> = match (&x.base, &x.constraint) {
            (BaseType::Null, _) => Some(vec![Value::Null]),
            (BaseType::Boolean, _) => Some(vec![Value::Bool(false), Value::Bool(true)]),
            (_, Constraint::Numeric(num)) => {
                let limit = y
                    .enumeration
                    .as_ref()
                    .map(|values| values.len())
                    .unwrap_or(0);
                match enumerate_numeric(num, limit) {
                    // More admissible points than enum entries: cannot be
                    // contained
                    None => return Decision::No,
                    Some(points) => Some(points),
                }
            }
            (_, Constraint::String(s)) => {
                // Compare as languages: the enum is a finite language
                let Some(language) = string_kernel::combined_language(s) else {
                    return Decision::No;
                };
                let Some(values) = &y.enumeration else {
                    return Decision::No;
                };
                let literals: Vec<&str> =
                    values.iter().filter_map(|v| v.as_str()).collect();
                let enum_language = string_kernel::literal_language(&literals);
                return Decision::from_bool(language.is_subset(&enum_language));
            }
            (_, Constraint::Array(a)) if a.max_items == Some(0) => {
                Some(vec![Value::Array(Vec::new())])
            }
            (_, Constraint::Object(o)) if o.max_properties == Some(0) => {
                Some(vec![Value::Object(serde_json::Map::new())])
            }
            _ => None,
        };
        match candidates {
            Some(points) => Decision::from_bool(
                points
                    .iter()
                    .all(|point| value_satisfies_atom(graph, y, point)),
            ),
            // Infinite or unbounded domain against a finite enum
            None => Decision::No,
        }
    }
}

/// Enumerate the admissible values of a numeric constraint when there are
/// at most `limit` of them
fn enumerate_numeric(
    num: &subsume_core::NumConstraint,
    limit: usize,
) -> Option<Vec<Value>> {
    use subsume_core::number::number_from_rational;

    let n = num.normalized();
    let step = n.step()?;
    let (min, max) = (n.min.as_ref()?, n.max.as_ref()?);
    if min.value > max.value {
        return Some(Vec::new());
    }
    let span = (&max.value - &min.value) / &step;
    // Number of admissible points is floor(span) + 1; more points than enum
    // entries can never be contained
    if span.to_integer() >= num_bigint::BigInt::from(limit as u64) {
        return None;
    }
    let mut points = Vec::new();
    let mut current = min.value.clone();
    while current <= max.value {
        points.push(Value::Number(number_from_rational(&current)));
        current += &step;
    }
    Some(points)
}

/// Base types a kernel can compare: equal, or both numeric
/// (the Integer/Number refinement is decided by the numeric kernel)
pub(crate) fn bases_comparable(a: BaseType, b: BaseType) -> bool {
    a == b || (a.is_numeric() && b.is_numeric())
}

/// True when the atom accepts its entire base-type domain
pub(crate) fn atom_is_full_domain(graph: &SchemaGraph, atom: &Atom) -> bool {
    if atom.enumeration.is_some() || atom.negated || atom.semantic.is_some() {
        return false;
    }
    match &atom.constraint {
        Constraint::None => true,
        Constraint::Numeric(num) => {
            num.min.is_none() && num.max.is_none() && num.multiple_of.is_none()
        }
        Constraint::String(s) => {
            s.min_length == 0 && s.max_length.is_none() && s.pattern.is_none()
        }
        Constraint::Array(a) => {
            a.min_items == 0
                && a.max_items.is_none()
                && !a.unique
                && match &a.items {
                    subsume_core::Items::Uniform(id) => node_is_top(graph, *id),
                    subsume_core::Items::Tuple { .. } => false,
                }
        }
        Constraint::Object(o) => {
            o.min_properties == 0
                && o.max_properties.is_none()
                && o.required.is_empty()
                && o.properties.is_empty()
                && o.pattern_properties.is_empty()
                && node_is_top(graph, o.additional)
        }
    }
}

/// True when a node accepts every JSON value: for every base type there is
/// a full-domain atom of that base (or of a base it refines)
pub(crate) fn node_is_top(graph: &SchemaGraph, id: SchemaId) -> bool {
    use subsume_core::ALL_BASE_TYPES;
    ALL_BASE_TYPES.iter().all(|&base| {
        graph.node(id).atoms.iter().any(|atom| {
            base.refines(&atom.base) && atom_is_full_domain(graph, atom)
        })
    })
}

/// Meet/join builder over one (mutable) schema graph
pub struct Merger<'g, 'r> {
    pub(crate) graph: &'g mut SchemaGraph,
    pub(crate) resolver: &'r dyn SemanticResolver,
    /// (left, right, is_join) pairs currently under construction, mapped
    /// to their reserved arena slots
    in_progress: FxHashMap<(u32, u32, bool), SchemaId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'g, 'r> Merger<'g, 'r> {
    /// Create a merger over `graph`
    pub fn new(graph: &'g mut SchemaGraph, resolver: &'r dyn SemanticResolver) -> Merger<'g, 'r> {
        Merger {
            graph,
            resolver,
            in_progress: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Greatest lower bound of two nodes.
    ///
    /// Distributes over the disjunctions: same-base atom pairs meet through
    /// their kernels, cross-type pairs vanish (Bottom).
    pub fn meet_nodes(&mut self, a: SchemaId, b: SchemaId) -> SchemaId {
        let key = (a.0, b.0, false);
        if let Some(&reserved) = self.in_progress.get(&key) {
            return reserved;
        }
        let reserved = self.graph.reserve();
        self.in_progress.insert(key, reserved);

        let left_atoms = self.graph.node(a).atoms.clone();
        let right_atoms = self.graph.node(b).atoms.clone();
        let mut atoms = Vec::new();
        for x in &left_atoms {
            for y in &right_atoms {
                if !bases_comparable(x.base, y.base) {
                    continue;
                }
                if let Some(atom) = self.meet_atoms(x, y) {
                    atoms.push(atom);
                }
            }
        }
        let atoms = self.coalesce(atoms);
        trace!(atoms = atoms.len(), "meet");
        self.graph.patch(reserved, Disjunction { atoms });
        self.in_progress.remove(&key);
        reserved
    }

    /// Least upper bound of two nodes: concatenate and coalesce
    pub fn join_nodes(&mut self, a: SchemaId, b: SchemaId) -> SchemaId {
        let key = (a.0, b.0, true);
        if let Some(&reserved) = self.in_progress.get(&key) {
            return reserved;
        }
        let reserved = self.graph.reserve();
        self.in_progress.insert(key, reserved);

        let mut atoms = self.graph.node(a).atoms.clone();
        atoms.extend(self.graph.node(b).atoms.clone());
        let atoms = self.coalesce(atoms);
        trace!(atoms = atoms.len(), "join");
        self.graph.patch(reserved, Disjunction { atoms });
        self.in_progress.remove(&key);
        reserved
    }

    /// Meet two atoms of comparable bases; `None` means Bottom
    pub(crate) fn meet_atoms(&mut self, x: &Atom, y: &Atom) -> Option<Atom> {
        let semantic = match self.semantic_meet(&x.semantic, &y.semantic) {
            Ok(semantic) => semantic,
            // Semantically incompatible pair meets to Bottom
            Err(()) => return None,
        };

        // Complemented atoms: exact only against an identical atom or a
        // full-domain side; anything else under-approximates to Bottom
        if x.negated || y.negated {
            if atoms_equal(self.graph, x, self.graph, y) {
                let mut out = x.clone();
                out.semantic = semantic;
                return Some(out);
            }
            if !y.negated && atom_is_full_domain(self.graph, y) {
                let mut out = x.clone();
                out.semantic = semantic;
                return Some(out);
            }
            if !x.negated && atom_is_full_domain(self.graph, x) {
                let mut out = y.clone();
                out.semantic = semantic;
                return Some(out);
            }
            trace!("meet of complemented atoms under-approximated to Bottom");
            return None;
        }

        // Enum on either side: filter pointwise against the other atom
        if x.enumeration.is_some() || y.enumeration.is_some() {
            let (enum_side, other) = if x.enumeration.is_some() {
                (x, y)
            } else {
                (y, x)
            };
            let values = enum_side.enumeration.as_ref()?;
            let kept: Vec<Value> = values
                .iter()
                .filter(|v| value_satisfies_atom(self.graph, other, v))
                .cloned()
                .collect();
            if kept.is_empty() {
                return None;
            }
            let mut out = enum_side.clone();
            out.enumeration = Some(kept);
            out.semantic = semantic;
            return Some(out);
        }

        let constraint = match (&x.constraint, &y.constraint) {
            (Constraint::None, Constraint::None) => Constraint::None,
            (Constraint::Numeric(cx), Constraint::Numeric(cy)) => {
                Constraint::Numeric(cx.meet(cy))
            }
            (Constraint::String(sx), Constraint::String(sy)) => {
                Constraint::String(string_kernel::meet(sx, sy))
            }
            (Constraint::Array(ax), Constraint::Array(ay)) => {
                let (ax, ay) = (ax.clone(), ay.clone());
                Constraint::Array(self.array_meet(&ax, &ay))
            }
            (Constraint::Object(ox), Constraint::Object(oy)) => {
                let (ox, oy) = (ox.clone(), oy.clone());
                Constraint::Object(self.object_meet(&ox, &oy))
            }
            _ => return None,
        };

        let base = match (&constraint, x.base, y.base) {
            (Constraint::Numeric(num), _, _) => {
                if num.integral {
                    BaseType::Integer
                } else {
                    BaseType::Number
                }
            }
            (_, base, _) => base,
        };

        let atom = Atom {
            base,
            semantic,
            enumeration: None,
            negated: false,
            constraint,
        };
        if crate::canon::atom_is_empty(self.graph, &atom) {
            None
        } else {
            Some(atom)
        }
    }

    /// The narrower of two optional stypes; `Err(())` when both are present
    /// and incomparable (the pair is semantically uninhabited)
    fn semantic_meet(&mut self, x: &Option<Iri>, y: &Option<Iri>) -> std::result::Result<Option<Iri>, ()> {
        match (x, y) {
            (None, None) => Ok(None),
            (Some(iri), None) | (None, Some(iri)) => Ok(Some(iri.clone())),
            (Some(a), Some(b)) => {
                if self.resolver.is_subconcept(a, b) == Subsumption::Yes {
                    return Ok(Some(a.clone()));
                }
                if self.resolver.is_subconcept(b, a) == Subsumption::Yes {
                    return Ok(Some(b.clone()));
                }
                if self.resolver.is_subconcept(a, b) == Subsumption::Unknown {
                    self.diagnostics.push(Diagnostic::ResolverUnknown {
                        narrower: a.clone(),
                        broader: b.clone(),
                    });
                }
                Err(())
            }
        }
    }

    /// Drop empty and subsumed atoms, merge mergeable same-base pairs.
    ///
    /// Same-base atoms either end up disjoint-or-distinct or get coalesced,
    /// which keeps disjunctions free of redundant duplicates.
    pub(crate) fn coalesce(&mut self, atoms: Vec<Atom>) -> Vec<Atom> {
        let mut kept: Vec<Atom> = Vec::with_capacity(atoms.len());
        for atom in atoms {
            if crate::canon::atom_is_empty(self.graph, &atom) {
                continue;
            }
            if kept
                .iter()
                .any(|existing| atoms_equal(self.graph, existing, self.graph, &atom))
            {
                continue;
            }
            kept.push(atom);
        }

        // Pairwise merges until nothing changes
        loop {
            let mut merged: Option<(usize, usize, Atom)> = None;
            'outer: for i in 0..kept.len() {
                for j in 0..kept.len() {
                    if i == j {
                        continue;
                    }
                    if let Some(atom) = merge_atoms(self.graph, self.resolver, &kept[i], &kept[j])
                    {
                        merged = Some((i, j, atom));
                        break 'outer;
                    }
                }
            }
            match merged {
                Some((i, j, atom)) => {
                    let (first, second) = if i < j { (j, i) } else { (i, j) };
                    kept.remove(first);
                    kept.remove(second);
                    kept.push(atom);
                }
                None => break,
            }
        }
        kept
    }
}

/// Try to merge two atoms into one covering exactly their union
fn merge_atoms(
    graph: &SchemaGraph,
    resolver: &dyn SemanticResolver,
    x: &Atom,
    y: &Atom,
) -> Option<Atom> {
    // Subsumption: the narrower atom disappears into the wider one.
    // Full-domain atoms never disappear across bases, so Top keeps its
    // one-atom-per-base shape (Integer included).
    if bases_comparable(x.base, y.base)
        && (x.base == y.base || !atom_is_full_domain(graph, x))
    {
        let mut checker = Subtyper::new(graph, resolver);
        if let Ok(Decision::Yes) = checker.atom_subtype(x, y) {
            return Some(y.clone());
        }
    }

    if x.base != y.base || x.semantic != y.semantic || x.negated || y.negated {
        return None;
    }

    // Enum union
    if let (Some(xs), Some(ys)) = (&x.enumeration, &y.enumeration) {
        if constraints_shallow_equal(x, y) {
            let mut union = xs.clone();
            for v in ys {
                if !json_contains(&union, v) {
                    union.push(v.clone());
                }
            }
            let mut out = x.clone();
            out.enumeration = Some(union);
            return Some(out);
        }
        return None;
    }
    if x.enumeration.is_some() || y.enumeration.is_some() {
        return None;
    }

    match (&x.constraint, &y.constraint) {
        (Constraint::Numeric(cx), Constraint::Numeric(cy)) => {
            let joined = cx.join(cy)?;
            let base = if joined.integral {
                BaseType::Integer
            } else {
                BaseType::Number
            };
            let mut out = x.clone();
            out.base = base;
            out.constraint = Constraint::Numeric(joined);
            Some(out)
        }
        (Constraint::String(sx), Constraint::String(sy)) => {
            let joined = string_kernel::try_join(sx, sy)?;
            let mut out = x.clone();
            out.constraint = Constraint::String(joined);
            Some(out)
        }
        _ => None,
    }
}

/// Equal constraints ignoring nested schema contents (enum merging only
/// applies to enum atoms with default constraints, so shallow is enough)
fn constraints_shallow_equal(x: &Atom, y: &Atom) -> bool {
    match (&x.constraint, &y.constraint) {
        (Constraint::None, Constraint::None) => true,
        (Constraint::Numeric(a), Constraint::Numeric(b)) => a == b,
        (Constraint::String(a), Constraint::String(b)) => {
            a.min_length == b.min_length
                && a.max_length == b.max_length
                && match (&a.pattern, &b.pattern) {
                    (None, None) => true,
                    (Some(p), Some(q)) => p.source() == q.source(),
                    _ => false,
                }
        }
        _ => false,
    }
}
