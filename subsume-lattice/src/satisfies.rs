//! Pointwise checks of concrete JSON values against canonical atoms
//!
//! Enum reasoning is pointwise: an enum atom is a subtype of another atom
//! exactly when every enumerated value satisfies it. These helpers implement
//! that membership test, recursing through nested array/object schemas.

use serde_json::Value;
use subsume_core::canonical::{Atom, Constraint, Items, SchemaGraph};
use subsume_core::number::rational_from_number;
use subsume_core::value::{base_type_of, json_contains, json_eq};

/// Does any atom of the node accept the value?
pub fn value_satisfies_node(graph: &SchemaGraph, id: subsume_core::SchemaId, value: &Value) -> bool {
    graph
        .node(id)
        .atoms
        .iter()
        .any(|atom| value_satisfies_atom(graph, atom, value))
}

/// Does the atom accept the value?
///
/// Semantic types are ignored here: a concrete JSON value carries no
/// ontology annotation, so semantic compatibility is decided at the atom
/// level before pointwise checks.
pub fn value_satisfies_atom(graph: &SchemaGraph, atom: &Atom, value: &Value) -> bool {
    if !base_type_of(value).refines(&atom.base) {
        return false;
    }
    let inner = constraints_accept(graph, atom, value);
    if atom.negated {
        // A negated atom is the complement within its base type
        !inner
    } else {
        inner
    }
}

fn constraints_accept(graph: &SchemaGraph, atom: &Atom, value: &Value) -> bool {
    if let Some(values) = &atom.enumeration {
        if !json_contains(values, value) {
            return false;
        }
    }
    match (&atom.constraint, value) {
        (Constraint::None, _) => true,
        (Constraint::Numeric(num), Value::Number(n)) => match rational_from_number(n) {
            Some(q) => num.accepts(&q),
            None => false,
        },
        (Constraint::String(s), Value::String(text)) => {
            let len = text.chars().count() as u64;
            if len < s.min_length || s.max_length.is_some_and(|max| len > max) {
                return false;
            }
            match &s.pattern {
                Some(pattern) => pattern.matches(text),
                None => true,
            }
        }
        (Constraint::Array(a), Value::Array(items)) => {
            let len = items.len() as u64;
            if len < a.min_items || a.max_items.is_some_and(|max| len > max) {
                return false;
            }
            if a.unique && !all_distinct(items) {
                return false;
            }
            match &a.items {
                Items::Uniform(element) => items
                    .iter()
                    .all(|item| value_satisfies_node(graph, *element, item)),
                Items::Tuple { prefix, rest } => items.iter().enumerate().all(|(i, item)| {
                    match prefix.get(i) {
                        Some(slot) => value_satisfies_node(graph, *slot, item),
                        None => value_satisfies_node(graph, *rest, item),
                    }
                }),
            }
        }
        (Constraint::Object(o), Value::Object(entries)) => {
            let len = entries.len() as u64;
            if len < o.min_properties || o.max_properties.is_some_and(|max| len > max) {
                return false;
            }
            if o.required.iter().any(|name| !entries.contains_key(name)) {
                return false;
            }
            entries.iter().all(|(name, item)| {
                let mut matched = false;
                if let Some(slot) = o.property(name) {
                    matched = true;
                    if !value_satisfies_node(graph, slot, item) {
                        return false;
                    }
                }
                for (pattern, slot) in &o.pattern_properties {
                    if pattern.matches(name) {
                        matched = true;
                        if !value_satisfies_node(graph, *slot, item) {
                            return false;
                        }
                    }
                }
                if matched {
                    true
                } else {
                    value_satisfies_node(graph, o.additional, item)
                }
            })
        }
        // Base type was already checked; a payload mismatch here means the
        // value's type refines the atom's (integer value, Number atom)
        (Constraint::Numeric(_), _) | (Constraint::String(_), _) => false,
        (Constraint::Array(_), _) | (Constraint::Object(_), _) => false,
    }
}

fn all_distinct(items: &[Value]) -> bool {
    for (i, a) in items.iter().enumerate() {
        if items[i + 1..].iter().any(|b| json_eq(a, b)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use subsume_core::canonical::{ArrayConstraint, Disjunction, StrConstraint};
    use subsume_core::numeric::{Bound, NumConstraint};
    use subsume_core::types::BaseType;
    use subsume_pattern::Pattern;

    fn rat(n: i64) -> num_rational::BigRational {
        num_rational::BigRational::from_integer(n.into())
    }

    #[test]
    fn test_numeric_bounds() {
        let graph = SchemaGraph::new();
        let atom = Atom::numeric(
            BaseType::Number,
            NumConstraint {
                min: Some(Bound::inclusive(rat(0))),
                max: Some(Bound::exclusive(rat(10))),
                ..NumConstraint::default()
            },
        );
        assert!(value_satisfies_atom(&graph, &atom, &json!(0)));
        assert!(value_satisfies_atom(&graph, &atom, &json!(9.5)));
        assert!(!value_satisfies_atom(&graph, &atom, &json!(10)));
        assert!(!value_satisfies_atom(&graph, &atom, &json!("5")));
    }

    #[test]
    fn test_integer_atom_rejects_float() {
        let graph = SchemaGraph::new();
        let atom = Atom::numeric(BaseType::Integer, NumConstraint::unconstrained(true));
        assert!(value_satisfies_atom(&graph, &atom, &json!(3)));
        assert!(!value_satisfies_atom(&graph, &atom, &json!(3.5)));
    }

    #[test]
    fn test_string_pattern_and_length() {
        let graph = SchemaGraph::new();
        let atom = Atom {
            base: BaseType::String,
            semantic: None,
            enumeration: None,
            negated: false,
            constraint: Constraint::String(StrConstraint {
                min_length: 2,
                max_length: Some(4),
                pattern: Some(Pattern::parse("^[a-z]+$").unwrap()),
            }),
        };
        assert!(value_satisfies_atom(&graph, &atom, &json!("abc")));
        assert!(!value_satisfies_atom(&graph, &atom, &json!("a")));
        assert!(!value_satisfies_atom(&graph, &atom, &json!("abcde")));
        assert!(!value_satisfies_atom(&graph, &atom, &json!("ab3")));
    }

    #[test]
    fn test_negated_atom_is_complement_within_base() {
        let graph = SchemaGraph::new();
        let atom = Atom {
            base: BaseType::String,
            semantic: None,
            enumeration: None,
            negated: true,
            constraint: Constraint::String(StrConstraint {
                min_length: 0,
                max_length: None,
                pattern: Some(Pattern::parse("^a+$").unwrap()),
            }),
        };
        assert!(!value_satisfies_atom(&graph, &atom, &json!("aaa")));
        assert!(value_satisfies_atom(&graph, &atom, &json!("b")));
        // Outside the base type entirely: not accepted
        assert!(!value_satisfies_atom(&graph, &atom, &json!(3)));
    }

    #[test]
    fn test_array_items_recursion() {
        let mut graph = SchemaGraph::new();
        let int_node = graph.add(Disjunction::of(Atom::numeric(
            BaseType::Integer,
            NumConstraint::unconstrained(true),
        )));
        let atom = Atom {
            base: BaseType::Array,
            semantic: None,
            enumeration: None,
            negated: false,
            constraint: Constraint::Array(ArrayConstraint {
                min_items: 1,
                max_items: None,
                unique: true,
                items: Items::Uniform(int_node),
            }),
        };
        assert!(value_satisfies_atom(&graph, &atom, &json!([1, 2, 3])));
        assert!(!value_satisfies_atom(&graph, &atom, &json!([])));
        assert!(!value_satisfies_atom(&graph, &atom, &json!([1, "x"])));
        // uniqueItems violated
        assert!(!value_satisfies_atom(&graph, &atom, &json!([1, 1])));
    }
}
