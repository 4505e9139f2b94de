//! Canonicalizer: arbitrary Draft-04 schemas into canonical disjunctions
//!
//! A fixed-point reduction over the raw schema: per-type keywords become
//! typed atoms, `enum`/`const` become finite atoms met with the rest,
//! `allOf` meets, `anyOf`/`oneOf` union, `not` complements, and `$ref`
//! resolves through a reservation table so cyclic references tie into
//! arena recursion points instead of diverging.
//!
//! Unsatisfiable atoms collapse here, so kernels only ever see atoms whose
//! constraint sets are internally satisfiable (or Bottom itself).

use crate::complement::complement_node;
use crate::driver::Merger;
use crate::raw::{BoolOrSchema, ItemsShape, RawSchema};
use crate::refs::RefTable;
use rustc_hash::FxHashMap;
use serde_json::Value;
use subsume_core::canonical::{
    ArrayConstraint, Atom, Constraint, Disjunction, Items, ObjectConstraint, SchemaGraph,
    SchemaId, StrConstraint,
};
use subsume_core::error::{Error, Result};
use subsume_core::numeric::{Bound, NumConstraint};
use subsume_core::types::{BaseType, ALL_BASE_TYPES};
use subsume_core::value::base_type_of;
use subsume_pattern::Pattern;
use subsume_semantic::SemanticResolver;
use subsume_vocab::Iri;
use tracing::warn;

/// Canonicalization knobs
#[derive(Debug, Clone, Default)]
pub struct CanonOptions {
    /// Emit a warning when a subschema canonicalizes to Bottom
    /// (accepts nothing)
    pub warn_uninhabited: bool,
}

/// Canonicalize a schema document into `graph`, returning the root node
pub fn canonicalize_document(
    graph: &mut SchemaGraph,
    document: &Value,
    resolver: &dyn SemanticResolver,
    options: &CanonOptions,
) -> Result<SchemaId> {
    let mut canonicalizer = Canonicalizer {
        graph,
        refs: RefTable::new(document),
        resolver,
        options,
        ref_states: FxHashMap::default(),
    };
    canonicalizer.node(document, "#")
}

enum RefState {
    /// Reserved arena slot for a reference currently being expanded
    /// (a later encounter is a cycle and reuses the slot)
    InProgress(SchemaId),
    Done(SchemaId),
}

struct Canonicalizer<'g, 'd, 'r> {
    graph: &'g mut SchemaGraph,
    refs: RefTable<'d>,
    resolver: &'r dyn SemanticResolver,
    options: &'r CanonOptions,
    ref_states: FxHashMap<String, RefState>,
}

impl<'g, 'd, 'r> Canonicalizer<'g, 'd, 'r> {
    fn node(&mut self, value: &'d Value, location: &str) -> Result<SchemaId> {
        let raw = RawSchema::new(value, location)?;

        // $ref wins; Draft-04 ignores its siblings
        if let Some(reference) = raw.reference()? {
            return self.reference(reference, location);
        }

        let stype = match raw.stype()? {
            Some(compact) => Some(self.resolver.normalize(compact)),
            None => None,
        };
        let bases = raw
            .types()?
            .unwrap_or_else(|| ALL_BASE_TYPES.to_vec());

        let mut atoms = Vec::with_capacity(bases.len());
        for base in bases {
            atoms.push(self.typed_atom(&raw, base, stype.clone())?);
        }
        let mut result = self.add_node(atoms);

        if let Some(values) = raw.enumeration()? {
            let enum_id = self.enum_node(values, &stype);
            result = self.meet(result, enum_id);
        }
        if let Some(value) = raw.const_value() {
            let const_id = self.enum_node(std::slice::from_ref(value), &stype);
            result = self.meet(result, const_id);
        }

        if let Some(parts) = raw.schema_array("allOf")? {
            for (i, part) in parts.iter().enumerate() {
                let sub = self.node(part, &format!("{location}/allOf/{i}"))?;
                result = self.meet(result, sub);
            }
        }
        if let Some(parts) = raw.schema_array("anyOf")? {
            let union = self.union_of(parts, location, "anyOf")?;
            result = self.meet(result, union);
        }
        if let Some(parts) = raw.schema_array("oneOf")? {
            let union = self.union_of(parts, location, "oneOf")?;
            result = self.meet(result, union);
        }
        if let Some(sub) = raw.get("not") {
            let not_location = format!("{location}/not");
            let inner = self.node(sub, &not_location)?;
            let complement =
                complement_node(self.graph, self.resolver, inner, &not_location)?;
            result = self.meet(result, complement);
        }

        if self.options.warn_uninhabited && self.graph.is_bottom(result) {
            warn!(location, "schema is uninhabited (accepts nothing)");
        }
        Ok(result)
    }

    fn reference(&mut self, reference: &'d str, location: &str) -> Result<SchemaId> {
        match self.ref_states.get(reference) {
            Some(RefState::Done(id)) | Some(RefState::InProgress(id)) => return Ok(*id),
            None => {}
        }
        let target = self.refs.resolve(reference, location)?;
        let placeholder = self.graph.reserve();
        self.ref_states
            .insert(reference.to_string(), RefState::InProgress(placeholder));
        let resolved = self.node(target, reference)?;
        let node = self.graph.node(resolved).clone();
        self.graph.patch(placeholder, node);
        self.ref_states
            .insert(reference.to_string(), RefState::Done(placeholder));
        Ok(placeholder)
    }

    /// One atom for one listed base type, inheriting the keywords that
    /// apply to it
    fn typed_atom(
        &mut self,
        raw: &RawSchema<'d>,
        base: BaseType,
        stype: Option<Iri>,
    ) -> Result<Atom> {
        let constraint = match base {
            BaseType::Null | BaseType::Boolean => Constraint::None,
            BaseType::Integer => Constraint::Numeric(self.numeric_constraint(raw, true)?),
            BaseType::Number => Constraint::Numeric(self.numeric_constraint(raw, false)?),
            BaseType::String => Constraint::String(self.string_constraint(raw)?),
            BaseType::Array => Constraint::Array(self.array_constraint(raw)?),
            BaseType::Object => Constraint::Object(self.object_constraint(raw)?),
        };
        Ok(Atom {
            base,
            semantic: stype,
            enumeration: None,
            negated: false,
            constraint,
        })
    }

    fn numeric_constraint(&self, raw: &RawSchema<'d>, integral: bool) -> Result<NumConstraint> {
        let minimum = raw.number_keyword("minimum")?;
        let maximum = raw.number_keyword("maximum")?;

        // Draft-04 spells exclusivity as boolean modifiers; the later
        // numeric spelling is accepted as a standalone bound
        let min = match (minimum, raw.get("exclusiveMinimum")) {
            (Some(value), Some(Value::Bool(exclusive))) => Some(Bound {
                value,
                exclusive: *exclusive,
            }),
            (Some(value), None) => Some(Bound::inclusive(value)),
            (None, Some(Value::Bool(_))) => None,
            (bound, Some(_)) => {
                let exclusive = raw.number_keyword("exclusiveMinimum")?;
                match (bound, exclusive) {
                    (Some(value), None) => Some(Bound::inclusive(value)),
                    (None, Some(value)) => Some(Bound::exclusive(value)),
                    (Some(inclusive), Some(exclusive)) => {
                        // Both present: the tighter lower bound wins
                        if exclusive >= inclusive {
                            Some(Bound::exclusive(exclusive))
                        } else {
                            Some(Bound::inclusive(inclusive))
                        }
                    }
                    (None, None) => None,
                }
            }
            (None, None) => None,
        };
        let max = match (maximum, raw.get("exclusiveMaximum")) {
            (Some(value), Some(Value::Bool(exclusive))) => Some(Bound {
                value,
                exclusive: *exclusive,
            }),
            (Some(value), None) => Some(Bound::inclusive(value)),
            (None, Some(Value::Bool(_))) => None,
            (bound, Some(_)) => {
                let exclusive = raw.number_keyword("exclusiveMaximum")?;
                match (bound, exclusive) {
                    (Some(value), None) => Some(Bound::inclusive(value)),
                    (None, Some(value)) => Some(Bound::exclusive(value)),
                    (Some(inclusive), Some(exclusive)) => {
                        if exclusive <= inclusive {
                            Some(Bound::exclusive(exclusive))
                        } else {
                            Some(Bound::inclusive(inclusive))
                        }
                    }
                    (None, None) => None,
                }
            }
            (None, None) => None,
        };

        Ok(NumConstraint {
            min,
            max,
            multiple_of: raw.multiple_of()?,
            integral,
        }
        .normalized())
    }

    fn string_constraint(&self, raw: &RawSchema<'d>) -> Result<StrConstraint> {
        let pattern = match raw.string_keyword("pattern")? {
            Some(source) => Some(
                Pattern::parse(source)
                    .map_err(|e| Error::from_pattern(raw.keyword_location("pattern"), e))?,
            ),
            None => None,
        };
        Ok(StrConstraint {
            min_length: raw.count_keyword("minLength")?.unwrap_or(0),
            max_length: raw.count_keyword("maxLength")?,
            pattern,
        })
    }

    fn array_constraint(&mut self, raw: &RawSchema<'d>) -> Result<ArrayConstraint> {
        let min_items = raw.count_keyword("minItems")?.unwrap_or(0);
        let mut max_items = raw.count_keyword("maxItems")?;
        let unique = raw.bool_keyword("uniqueItems")?.unwrap_or(false);

        let items = match raw.items()? {
            None => Items::Uniform(self.graph.top()),
            Some(ItemsShape::Single(schema)) => {
                let id = self.node_at(schema, raw, "items")?;
                if self.graph.is_bottom(id) {
                    // No element is admissible; only the empty array fits
                    max_items = Some(0);
                }
                Items::Uniform(id)
            }
            Some(ItemsShape::Tuple(tuple)) => {
                let mut prefix = Vec::with_capacity(tuple.len());
                for (i, slot) in tuple.iter().enumerate() {
                    let id = self.node_at(slot, raw, &format!("items/{i}"))?;
                    prefix.push(id);
                }
                let rest = match raw.additional("additionalItems")? {
                    None | Some(BoolOrSchema::Bool(true)) => self.graph.top(),
                    Some(BoolOrSchema::Bool(false)) => self.graph.bottom(),
                    Some(BoolOrSchema::Schema(schema)) => {
                        self.node_at(schema, raw, "additionalItems")?
                    }
                };
                // A Bottom position caps the reachable length
                if let Some(first_bottom) =
                    prefix.iter().position(|id| self.graph.is_bottom(*id))
                {
                    let cap = first_bottom as u64;
                    max_items = Some(max_items.map_or(cap, |m| m.min(cap)));
                }
                if self.graph.is_bottom(rest) {
                    let cap = prefix.len() as u64;
                    max_items = Some(max_items.map_or(cap, |m| m.min(cap)));
                }
                if let Some(max) = max_items {
                    prefix.truncate(max as usize);
                }
                Items::Tuple { prefix, rest }
            }
        };

        Ok(ArrayConstraint {
            min_items,
            max_items,
            unique,
            items,
        })
    }

    fn object_constraint(&mut self, raw: &RawSchema<'d>) -> Result<ObjectConstraint> {
        let mut properties = Vec::new();
        if let Some(map) = raw.schema_map("properties")? {
            for (name, schema) in map {
                let id = self.node_at(schema, raw, &format!("properties/{name}"))?;
                properties.push((name.clone(), id));
            }
        }
        let mut pattern_properties = Vec::new();
        if let Some(map) = raw.schema_map("patternProperties")? {
            for (source, schema) in map {
                let pattern = Pattern::parse(source).map_err(|e| {
                    Error::from_pattern(raw.keyword_location("patternProperties"), e)
                })?;
                let id = self.node_at(schema, raw, &format!("patternProperties/{source}"))?;
                pattern_properties.push((pattern, id));
            }
        }
        let pattern_properties = self.disjoint_pattern_regions(pattern_properties);

        // Fold matching pattern schemas into each declared property, so a
        // declared entry carries the name's full domain and the kernels
        // never juggle several pieces for one name
        for (name, slot) in &mut properties {
            for (pattern, pattern_slot) in &pattern_properties {
                if pattern.matches(name) {
                    let mut merger = Merger::new(self.graph, self.resolver);
                    *slot = merger.meet_nodes(*slot, *pattern_slot);
                }
            }
        }

        let additional = match raw.additional("additionalProperties")? {
            None | Some(BoolOrSchema::Bool(true)) => self.graph.top(),
            Some(BoolOrSchema::Bool(false)) => self.graph.bottom(),
            Some(BoolOrSchema::Schema(schema)) => {
                self.node_at(schema, raw, "additionalProperties")?
            }
        };

        Ok(ObjectConstraint {
            min_properties: raw.count_keyword("minProperties")?.unwrap_or(0),
            max_properties: raw.count_keyword("maxProperties")?,
            required: raw.required()?,
            properties,
            pattern_properties,
            additional,
        })
    }

    /// Rewrite overlapping `patternProperties` into disjoint name regions.
    ///
    /// A name matching several patterns must satisfy every matched schema,
    /// so each non-empty boolean region of the patterns becomes one entry
    /// carrying the meet of the schemas covering it. Afterwards an
    /// undeclared name matches at most one entry and the object kernels can
    /// compare single pieces exactly.
    ///
    /// Region count is exponential in the pattern count; past
    /// `REGION_SOURCE_LIMIT` patterns the list is kept as-is and the
    /// kernels fall back to their sound one-piece-at-a-time checks.
    fn disjoint_pattern_regions(
        &mut self,
        patterns: Vec<(Pattern, SchemaId)>,
    ) -> Vec<(Pattern, SchemaId)> {
        const REGION_SOURCE_LIMIT: usize = 4;

        if patterns.len() < 2 {
            return patterns;
        }
        let overlapping = patterns.iter().enumerate().any(|(i, (p, _))| {
            patterns[i + 1..]
                .iter()
                .any(|(q, _)| !p.intersect(q).is_empty())
        });
        if !overlapping {
            return patterns;
        }
        if patterns.len() > REGION_SOURCE_LIMIT {
            warn!(
                count = patterns.len(),
                "too many overlapping patternProperties to split into regions"
            );
            return patterns;
        }

        let mut regions = Vec::new();
        for mask in 1u32..(1 << patterns.len()) {
            let mut language = Pattern::universal();
            for (i, (pattern, _)) in patterns.iter().enumerate() {
                language = if mask & (1 << i) != 0 {
                    language.intersect(pattern)
                } else {
                    language.intersect(&pattern.complement())
                };
            }
            if language.is_empty() {
                continue;
            }
            let mut covered = patterns
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << *i) != 0)
                .map(|(_, (_, id))| *id);
            let first = match covered.next() {
                Some(id) => id,
                None => continue,
            };
            let mut merger = Merger::new(self.graph, self.resolver);
            let schema = covered.fold(first, |acc, id| merger.meet_nodes(acc, id));
            regions.push((language, schema));
        }
        regions
    }

    fn node_at(
        &mut self,
        schema: &'d Value,
        raw: &RawSchema<'d>,
        suffix: &str,
    ) -> Result<SchemaId> {
        let location = format!("{}/{suffix}", raw.location());
        self.node(schema, &location)
    }

    /// One finite atom per base type occurring among the values
    fn enum_node(&mut self, values: &[Value], stype: &Option<Iri>) -> SchemaId {
        let top = self.graph.top();
        let mut groups: Vec<(BaseType, Vec<Value>)> = Vec::new();
        for value in values {
            let base = base_type_of(value);
            match groups.iter_mut().find(|(b, _)| *b == base) {
                Some((_, group)) => group.push(value.clone()),
                None => groups.push((base, vec![value.clone()])),
            }
        }
        let atoms = groups
            .into_iter()
            .map(|(base, group)| {
                let mut atom = self.graph.unconstrained_atom(base, top);
                atom.enumeration = Some(group);
                atom.semantic = stype.clone();
                atom
            })
            .collect();
        self.add_node(atoms)
    }

    /// Union of canonicalized subschemas (`anyOf`/`oneOf`); overlapping
    /// `oneOf` components are reported, then treated as `anyOf`
    fn union_of(&mut self, parts: &'d [Value], location: &str, keyword: &str) -> Result<SchemaId> {
        let mut ids = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            ids.push(self.node(part, &format!("{location}/{keyword}/{i}"))?);
        }
        if keyword == "oneOf" {
            let mut merger = Merger::new(self.graph, self.resolver);
            for i in 0..ids.len() {
                for j in i + 1..ids.len() {
                    let overlap = merger.meet_nodes(ids[i], ids[j]);
                    if !merger.graph.is_bottom(overlap) {
                        warn!(
                            location,
                            components = format!("{i},{j}"),
                            "oneOf components overlap; treating as anyOf"
                        );
                    }
                }
            }
        }
        let mut merger = Merger::new(self.graph, self.resolver);
        let mut union = match ids.first() {
            Some(&first) => first,
            None => merger.graph.bottom(),
        };
        for &id in &ids[1..] {
            union = merger.join_nodes(union, id);
        }
        Ok(union)
    }

    fn add_node(&mut self, atoms: Vec<Atom>) -> SchemaId {
        let mut merger = Merger::new(self.graph, self.resolver);
        let atoms = merger.coalesce(atoms);
        self.graph.add(Disjunction { atoms })
    }

    fn meet(&mut self, a: SchemaId, b: SchemaId) -> SchemaId {
        let mut merger = Merger::new(self.graph, self.resolver);
        merger.meet_nodes(a, b)
    }
}

/// Is this atom's constraint set unsatisfiable?
///
/// Shallow where it must be: nested nodes were canonicalized bottom-up, so
/// a nested unsatisfiable schema is already Bottom and a plain `is_bottom`
/// probe suffices.
pub(crate) fn atom_is_empty(graph: &SchemaGraph, atom: &Atom) -> bool {
    if let Some(values) = &atom.enumeration {
        if values.is_empty() {
            return true;
        }
    }
    if atom.negated {
        // The complement of a full base-type domain is empty
        return atom.enumeration.is_none()
            && crate::driver::atom_is_full_domain(
                graph,
                &Atom {
                    negated: false,
                    semantic: None,
                    ..atom.clone()
                },
            );
    }
    match &atom.constraint {
        Constraint::None => false,
        Constraint::Numeric(num) => num.is_empty(),
        Constraint::String(s) => {
            if s.is_length_empty() {
                return true;
            }
            match &s.pattern {
                Some(pattern) => match crate::kernels::string::combined_language(s) {
                    Some(language) => language.is_empty(),
                    None => pattern.is_empty(),
                },
                None => false,
            }
        }
        Constraint::Array(a) => {
            if a.max_items.is_some_and(|max| a.min_items > max) {
                return true;
            }
            match &a.items {
                Items::Uniform(id) => graph.is_bottom(*id) && a.min_items > 0,
                Items::Tuple { prefix, .. } => prefix
                    .iter()
                    .enumerate()
                    .any(|(i, id)| (i as u64) < a.min_items && graph.is_bottom(*id)),
            }
        }
        Constraint::Object(o) => {
            if o.max_properties.is_some_and(|max| o.min_properties > max) {
                return true;
            }
            if o.max_properties
                .is_some_and(|max| (o.required.len() as u64) > max)
            {
                return true;
            }
            // Every required name needs at least one satisfiable source
            o.required.iter().any(|name| {
                if let Some(id) = o.property(name) {
                    return graph.is_bottom(id);
                }
                let matching: Vec<SchemaId> = o
                    .pattern_properties
                    .iter()
                    .filter(|(p, _)| p.matches(name))
                    .map(|(_, id)| *id)
                    .collect();
                if matching.is_empty() {
                    graph.is_bottom(o.additional)
                } else {
                    matching.iter().any(|id| graph.is_bottom(*id))
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use subsume_core::decision::Decision;
    use subsume_semantic::NullResolver;

    fn canon(value: &Value) -> (SchemaGraph, SchemaId) {
        let mut graph = SchemaGraph::new();
        let resolver = NullResolver::new();
        let id = canonicalize_document(
            &mut graph,
            value,
            &resolver,
            &CanonOptions::default(),
        )
        .unwrap();
        (graph, id)
    }

    #[test]
    fn test_absent_type_expands_to_all_bases() {
        let (graph, id) = canon(&json!({}));
        assert_eq!(graph.node(id).atoms.len(), ALL_BASE_TYPES.len());
    }

    #[test]
    fn test_type_array_expansion() {
        let (graph, id) = canon(&json!({"type": ["integer", "string"], "minimum": 0}));
        let atoms = &graph.node(id).atoms;
        assert_eq!(atoms.len(), 2);
        let integer = atoms.iter().find(|a| a.base == BaseType::Integer).unwrap();
        match &integer.constraint {
            Constraint::Numeric(num) => assert!(num.min.is_some()),
            other => panic!("unexpected constraint {other:?}"),
        }
        // minimum does not apply to the string atom
        let string = atoms.iter().find(|a| a.base == BaseType::String).unwrap();
        assert!(matches!(&string.constraint, Constraint::String(s) if s.pattern.is_none()));
    }

    #[test]
    fn test_unsatisfiable_collapses_to_bottom() {
        let (graph, id) = canon(&json!({"type": "integer", "minimum": 5, "maximum": 3}));
        assert!(graph.is_bottom(id));

        let (graph, id) = canon(&json!({
            "type": "number", "minimum": 1, "maximum": 9, "multipleOf": 10
        }));
        assert!(graph.is_bottom(id));
    }

    #[test]
    fn test_enum_restricts_by_type() {
        let (graph, id) = canon(&json!({"type": "integer", "enum": [1, 2, "x", 3.5]}));
        let atoms = &graph.node(id).atoms;
        assert_eq!(atoms.len(), 1);
        let values = atoms[0].enumeration.as_ref().unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_const_is_single_enum() {
        let (graph, id) = canon(&json!({"const": "only"}));
        let atoms = &graph.node(id).atoms;
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].base, BaseType::String);
    }

    #[test]
    fn test_all_of_meets() {
        let (graph, id) = canon(&json!({
            "allOf": [
                {"type": "integer", "minimum": 0},
                {"type": "integer", "maximum": 10}
            ]
        }));
        let atoms = &graph.node(id).atoms;
        assert_eq!(atoms.len(), 1);
        match &atoms[0].constraint {
            Constraint::Numeric(num) => {
                assert!(num.min.is_some() && num.max.is_some());
            }
            other => panic!("unexpected constraint {other:?}"),
        }
    }

    #[test]
    fn test_any_of_unions() {
        let (graph, id) = canon(&json!({
            "anyOf": [{"type": "integer"}, {"type": "string"}]
        }));
        assert_eq!(graph.node(id).atoms.len(), 2);
    }

    #[test]
    fn test_ref_resolution() {
        let (graph, id) = canon(&json!({
            "definitions": {"count": {"type": "integer", "minimum": 0}},
            "$ref": "#/definitions/count"
        }));
        let atoms = &graph.node(id).atoms;
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].base, BaseType::Integer);
    }

    #[test]
    fn test_cyclic_ref_builds_recursion_point() {
        // A linked list: {value: integer, next: <self>}
        let doc = json!({
            "definitions": {
                "list": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "integer"},
                        "next": {"$ref": "#/definitions/list"}
                    }
                }
            },
            "$ref": "#/definitions/list"
        });
        let (graph, id) = canon(&doc);
        let atoms = &graph.node(id).atoms;
        assert_eq!(atoms.len(), 1);
        let Constraint::Object(o) = &atoms[0].constraint else {
            panic!("expected object constraint");
        };
        let next = o.property("next").unwrap();
        // The cycle refers back to the same arena node
        assert_eq!(next, id);

        // Subtype over the cyclic schema terminates (coinduction)
        let resolver = NullResolver::new();
        let mut checker = crate::driver::Subtyper::new(&graph, &resolver);
        assert_eq!(checker.subtype_nodes(id, id).unwrap(), Decision::Yes);
    }

    #[test]
    fn test_unresolved_ref_errors() {
        let mut graph = SchemaGraph::new();
        let resolver = NullResolver::new();
        let err = canonicalize_document(
            &mut graph,
            &json!({"$ref": "#/definitions/nope"}),
            &resolver,
            &CanonOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn test_additional_items_false_caps_length() {
        let (graph, id) = canon(&json!({
            "type": "array",
            "items": [{"type": "integer"}, {"type": "string"}],
            "additionalItems": false
        }));
        let atoms = &graph.node(id).atoms;
        let Constraint::Array(a) = &atoms[0].constraint else {
            panic!("expected array constraint");
        };
        assert_eq!(a.max_items, Some(2));
    }

    #[test]
    fn test_invalid_keyword_shape_rejected() {
        let mut graph = SchemaGraph::new();
        let resolver = NullResolver::new();
        let err = canonicalize_document(
            &mut graph,
            &json!({"type": "number", "minimum": "zero"}),
            &resolver,
            &CanonOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn test_stype_propagates_to_atoms() {
        let (graph, id) = canon(&json!({
            "type": ["integer", "string"],
            "stype": "quantitykind:Temperature"
        }));
        for atom in &graph.node(id).atoms {
            assert_eq!(
                atom.semantic.as_ref().map(|iri| iri.as_str()),
                Some("http://qudt.org/vocab/quantitykind/Temperature")
            );
        }
    }

    #[test]
    fn test_canonicalization_idempotent() {
        let schema = json!({
            "type": ["integer", "string"],
            "minimum": 0,
            "maximum": 10,
            "pattern": "^a+$"
        });
        let (g1, id1) = canon(&schema);
        let (g2, id2) = canon(&schema);
        assert_eq!(g1.structural_hash(id1), g2.structural_hash(id2));
        assert!(subsume_core::nodes_equal(&g1, id1, &g2, id2));
    }
}
