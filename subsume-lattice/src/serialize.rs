//! Serialization of canonical schemas back to JSON Schema
//!
//! Meet and join hand their results back as ordinary schema documents.
//! Bottom serializes as `{"not": {}}`, Top as `{}`, a multi-atom node as
//! `anyOf`. Cyclic nodes get hoisted into `definitions` and referenced,
//! so a meet of recursive schemas round-trips.

use crate::driver::node_is_top;
use rustc_hash::FxHashMap;
use serde_json::{json, Map, Value};
use subsume_core::canonical::{Atom, Constraint, Items, SchemaGraph, SchemaId};
use subsume_core::number::number_from_rational;
use subsume_core::numeric::NumConstraint;

/// Serialize the subgraph rooted at `root` into a JSON Schema document
pub fn serialize(graph: &SchemaGraph, root: SchemaId) -> Value {
    let mut serializer = Serializer {
        graph,
        stack: Vec::new(),
        def_names: FxHashMap::default(),
        defs: Map::new(),
    };
    let body = serializer.emit(root);
    if serializer.defs.is_empty() {
        return body;
    }
    // Cyclic nodes were hoisted; attach them to the root document
    let mut document = match body {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("allOf".to_string(), json!([other]));
            map
        }
    };
    document.insert("definitions".to_string(), Value::Object(serializer.defs));
    Value::Object(document)
}

struct Serializer<'g> {
    graph: &'g SchemaGraph,
    stack: Vec<u32>,
    def_names: FxHashMap<u32, String>,
    defs: Map<String, Value>,
}

impl<'g> Serializer<'g> {
    fn emit(&mut self, id: SchemaId) -> Value {
        if self.stack.contains(&id.0) {
            // Back-edge: this node becomes a definition
            let name = self.def_name(id);
            return json!({ "$ref": format!("#/definitions/{name}") });
        }
        if let Some(name) = self.def_names.get(&id.0) {
            if self.defs.contains_key(name) {
                return json!({ "$ref": format!("#/definitions/{name}") });
            }
        }

        self.stack.push(id.0);
        let value = self.emit_node(id);
        self.stack.pop();

        match self.def_names.get(&id.0).cloned() {
            Some(name) => {
                self.defs.insert(name.clone(), value);
                json!({ "$ref": format!("#/definitions/{name}") })
            }
            None => value,
        }
    }

    fn def_name(&mut self, id: SchemaId) -> String {
        let next = format!("r{}", self.def_names.len());
        self.def_names.entry(id.0).or_insert(next).clone()
    }

    fn emit_node(&mut self, id: SchemaId) -> Value {
        if self.graph.is_bottom(id) {
            return json!({ "not": {} });
        }
        if node_is_top(self.graph, id) {
            return json!({});
        }
        let atoms = self.graph.node(id).atoms.clone();
        if let [atom] = atoms.as_slice() {
            return self.emit_atom(atom);
        }
        let branches: Vec<Value> = atoms.iter().map(|atom| self.emit_atom(atom)).collect();
        json!({ "anyOf": branches })
    }

    fn emit_atom(&mut self, atom: &Atom) -> Value {
        let mut out = Map::new();
        out.insert(
            "type".to_string(),
            Value::String(atom.base.as_keyword().to_string()),
        );
        if let Some(iri) = &atom.semantic {
            out.insert("stype".to_string(), Value::String(iri.as_str().to_string()));
        }
        if let Some(values) = &atom.enumeration {
            out.insert("enum".to_string(), Value::Array(values.clone()));
            return self.wrap_negation(atom, out);
        }

        match &atom.constraint {
            Constraint::None => {}
            Constraint::Numeric(num) => emit_numeric(num, &mut out),
            Constraint::String(s) => {
                if s.min_length > 0 {
                    out.insert("minLength".to_string(), json!(s.min_length));
                }
                if let Some(max) = s.max_length {
                    out.insert("maxLength".to_string(), json!(max));
                }
                if let Some(pattern) = &s.pattern {
                    out.insert("pattern".to_string(), json!(pattern.source()));
                }
            }
            Constraint::Array(a) => {
                if a.min_items > 0 {
                    out.insert("minItems".to_string(), json!(a.min_items));
                }
                if let Some(max) = a.max_items {
                    out.insert("maxItems".to_string(), json!(max));
                }
                if a.unique {
                    out.insert("uniqueItems".to_string(), json!(true));
                }
                match &a.items {
                    Items::Uniform(items) => {
                        if !node_is_top(self.graph, *items) {
                            let emitted = self.emit(*items);
                            out.insert("items".to_string(), emitted);
                        }
                    }
                    Items::Tuple { prefix, rest } => {
                        let slots: Vec<Value> =
                            prefix.iter().map(|slot| self.emit(*slot)).collect();
                        out.insert("items".to_string(), Value::Array(slots));
                        if self.graph.is_bottom(*rest) {
                            out.insert("additionalItems".to_string(), json!(false));
                        } else if !node_is_top(self.graph, *rest) {
                            let emitted = self.emit(*rest);
                            out.insert("additionalItems".to_string(), emitted);
                        }
                    }
                }
            }
            Constraint::Object(o) => {
                if o.min_properties > 0 {
                    out.insert("minProperties".to_string(), json!(o.min_properties));
                }
                if let Some(max) = o.max_properties {
                    out.insert("maxProperties".to_string(), json!(max));
                }
                if !o.required.is_empty() {
                    out.insert("required".to_string(), json!(o.required));
                }
                if !o.properties.is_empty() {
                    let mut map = Map::new();
                    for (name, slot) in &o.properties {
                        let emitted = self.emit(*slot);
                        map.insert(name.clone(), emitted);
                    }
                    out.insert("properties".to_string(), Value::Object(map));
                }
                if !o.pattern_properties.is_empty() {
                    let mut map = Map::new();
                    for (pattern, slot) in &o.pattern_properties {
                        let emitted = self.emit(*slot);
                        map.insert(pattern.source().to_string(), emitted);
                    }
                    out.insert("patternProperties".to_string(), Value::Object(map));
                }
                if self.graph.is_bottom(o.additional) {
                    out.insert("additionalProperties".to_string(), json!(false));
                } else if !node_is_top(self.graph, o.additional) {
                    let emitted = self.emit(o.additional);
                    out.insert("additionalProperties".to_string(), emitted);
                }
            }
        }
        self.wrap_negation(atom, out)
    }

    /// A negated atom serializes as its base type minus the plain atom
    fn wrap_negation(&self, atom: &Atom, body: Map<String, Value>) -> Value {
        if !atom.negated {
            return Value::Object(body);
        }
        let mut outer = Map::new();
        outer.insert(
            "type".to_string(),
            Value::String(atom.base.as_keyword().to_string()),
        );
        if let Some(iri) = &atom.semantic {
            outer.insert("stype".to_string(), Value::String(iri.as_str().to_string()));
        }
        let mut inner = body;
        inner.remove("stype");
        outer.insert("not".to_string(), Value::Object(inner));
        Value::Object(outer)
    }
}

fn emit_numeric(num: &NumConstraint, out: &mut Map<String, Value>) {
    if let Some(min) = &num.min {
        out.insert(
            "minimum".to_string(),
            Value::Number(number_from_rational(&min.value)),
        );
        if min.exclusive {
            out.insert("exclusiveMinimum".to_string(), json!(true));
        }
    }
    if let Some(max) = &num.max {
        out.insert(
            "maximum".to_string(),
            Value::Number(number_from_rational(&max.value)),
        );
        if max.exclusive {
            out.insert("exclusiveMaximum".to_string(), json!(true));
        }
    }
    if let Some(multiple) = &num.multiple_of {
        out.insert(
            "multipleOf".to_string(),
            Value::Number(number_from_rational(multiple)),
        );
    }
}
