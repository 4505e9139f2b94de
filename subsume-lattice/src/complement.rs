//! Complement of a canonical schema with respect to Top
//!
//! Computed kernel by kernel over the base-type partition. Pieces the
//! kernels can represent exactly come out as plain atoms (interval
//! complements, boolean-closed string languages); pieces they cannot come
//! out as `negated` atoms, which the kernels treat as opaque. A `not` whose
//! complement is neither expressible nor taggable (several interacting
//! numeric atoms, for instance) is `Unsupported`.

use crate::driver::Merger;
use crate::kernels::string::combined_language;
use serde_json::Value;
use subsume_core::canonical::{
    Atom, Constraint, Disjunction, SchemaGraph, SchemaId, StrConstraint,
};
use subsume_core::error::{Error, Result};
use subsume_core::numeric::{Bound, NumConstraint};
use subsume_core::types::BaseType;
use subsume_semantic::SemanticResolver;

/// Build the complement of `id` as a fresh node in `graph`
pub fn complement_node(
    graph: &mut SchemaGraph,
    resolver: &dyn SemanticResolver,
    id: SchemaId,
    location: &str,
) -> Result<SchemaId> {
    let top = graph.top();
    let atoms = graph.node(id).atoms.clone();
    let mut pieces: Vec<Atom> = Vec::new();

    // Null and Boolean have finite domains; probe them pointwise
    complement_finite(graph, id, &mut pieces);

    let numeric: Vec<&Atom> = atoms.iter().filter(|a| a.base.is_numeric()).collect();
    complement_numeric(&numeric, location, &mut pieces)?;

    let strings: Vec<&Atom> = atoms.iter().filter(|a| a.base == BaseType::String).collect();
    complement_strings(&strings, location, &mut pieces)?;

    let arrays: Vec<&Atom> = atoms.iter().filter(|a| a.base == BaseType::Array).collect();
    complement_opaque(graph, &arrays, BaseType::Array, top, location, &mut pieces)?;

    let objects: Vec<&Atom> = atoms.iter().filter(|a| a.base == BaseType::Object).collect();
    complement_opaque(graph, &objects, BaseType::Object, top, location, &mut pieces)?;

    let mut merger = Merger::new(graph, resolver);
    let pieces = merger.coalesce(pieces);
    Ok(graph.add(Disjunction { atoms: pieces }))
}

/// The missing members of the two finite base domains become enum atoms
fn complement_finite(graph: &SchemaGraph, id: SchemaId, pieces: &mut Vec<Atom>) {
    use crate::satisfies::value_satisfies_node;

    if !value_satisfies_node(graph, id, &Value::Null) {
        pieces.push(Atom::bare(BaseType::Null));
    }
    let missing: Vec<Value> = [Value::Bool(false), Value::Bool(true)]
        .into_iter()
        .filter(|v| !value_satisfies_node(graph, id, v))
        .collect();
    if missing.len() == 2 {
        pieces.push(Atom::bare(BaseType::Boolean));
    } else if !missing.is_empty() {
        let mut atom = Atom::bare(BaseType::Boolean);
        atom.enumeration = Some(missing);
        pieces.push(atom);
    }
}

/// Numbers not accepted by the covering numeric atoms
fn complement_numeric(
    covering: &[&Atom],
    location: &str,
    pieces: &mut Vec<Atom>,
) -> Result<()> {
    // A full-domain Number atom already accepts every number; the
    // complement contributes nothing on this partition
    let covers_all = covering.iter().any(|a| {
        !a.negated
            && a.enumeration.is_none()
            && matches!(
                &a.constraint,
                Constraint::Numeric(num)
                    if !num.integral
                        && num.min.is_none()
                        && num.max.is_none()
                        && num.multiple_of.is_none()
            )
    });
    if covers_all {
        return Ok(());
    }
    match covering {
        [] => {
            pieces.push(Atom::numeric(
                BaseType::Integer,
                NumConstraint::unconstrained(true),
            ));
            pieces.push(Atom::numeric(
                BaseType::Number,
                NumConstraint::unconstrained(false),
            ));
            Ok(())
        }
        [atom] => {
            // Double complement cancels. Negated numeric atoms are always
            // built with base Number, so the whole numeric partition is
            // restored exactly.
            if atom.negated {
                let mut plain = (*atom).clone();
                plain.negated = false;
                pieces.push(plain);
                return Ok(());
            }
            let Constraint::Numeric(num) = &atom.constraint else {
                return Err(Error::unsupported(location, "malformed numeric atom"));
            };
            if atom.enumeration.is_some() || num.multiple_of.is_some() {
                // Complement of a grid or a finite value set within the
                // numbers: only expressible as an opaque complement
                let mut negated = (*atom).clone();
                negated.base = BaseType::Number;
                negated.negated = true;
                negated.semantic = None;
                pieces.push(negated);
                return Ok(());
            }
            // Interval-only: the outside of the interval, exactly
            if num.integral {
                // Integers outside the interval...
                if let Some(min) = &num.min {
                    pieces.push(Atom::numeric(
                        BaseType::Integer,
                        NumConstraint {
                            max: Some(flip(min)),
                            integral: true,
                            ..NumConstraint::default()
                        },
                    ));
                }
                if let Some(max) = &num.max {
                    pieces.push(Atom::numeric(
                        BaseType::Integer,
                        NumConstraint {
                            min: Some(flip(max)),
                            integral: true,
                            ..NumConstraint::default()
                        },
                    ));
                }
                // ...plus every non-integer number
                pieces.push(Atom {
                    base: BaseType::Number,
                    semantic: None,
                    enumeration: None,
                    negated: true,
                    constraint: Constraint::Numeric(NumConstraint::unconstrained(true)),
                });
            } else {
                if let Some(min) = &num.min {
                    pieces.push(Atom::numeric(
                        BaseType::Number,
                        NumConstraint {
                            max: Some(flip(min)),
                            ..NumConstraint::default()
                        },
                    ));
                }
                if let Some(max) = &num.max {
                    pieces.push(Atom::numeric(
                        BaseType::Number,
                        NumConstraint {
                            min: Some(flip(max)),
                            ..NumConstraint::default()
                        },
                    ));
                }
            }
            Ok(())
        }
        _ => Err(Error::unsupported(
            location,
            "complement of multiple numeric constraints",
        )),
    }
}

/// Strings are boolean-closed through the pattern engine whenever every
/// covering atom folds into a language
fn complement_strings(
    covering: &[&Atom],
    location: &str,
    pieces: &mut Vec<Atom>,
) -> Result<()> {
    if covering.is_empty() {
        pieces.push(Atom {
            base: BaseType::String,
            semantic: None,
            enumeration: None,
            negated: false,
            constraint: Constraint::String(StrConstraint::default()),
        });
        return Ok(());
    }
    if let [atom] = covering {
        if atom.negated {
            let mut plain = (*atom).clone();
            plain.negated = false;
            pieces.push(plain);
            return Ok(());
        }
    }

    let mut accepted: Option<subsume_pattern::Pattern> = None;
    for atom in covering {
        if atom.negated {
            return Err(Error::unsupported(
                location,
                "complement of mixed complemented string constraints",
            ));
        }
        let language = match (&atom.enumeration, &atom.constraint) {
            (Some(values), _) => {
                let literals: Vec<&str> =
                    values.iter().filter_map(|v| v.as_str()).collect();
                Some(subsume_pattern::Pattern::from_literals(
                    literals.iter().copied(),
                ))
            }
            (None, Constraint::String(s)) => combined_language(s),
            _ => None,
        };
        let Some(language) = language else {
            // Length bounds too large to fold: fall back to an opaque
            // complement of this single atom
            if covering.len() == 1 {
                let mut negated = (*covering[0]).clone();
                negated.negated = true;
                negated.semantic = None;
                pieces.push(negated);
                return Ok(());
            }
            return Err(Error::unsupported(
                location,
                "complement of combined string constraints",
            ));
        };
        accepted = Some(match accepted {
            Some(acc) => acc.union(&language),
            None => language,
        });
    }
    if let Some(accepted) = accepted {
        let complement = accepted.complement();
        if !complement.is_empty() {
            pieces.push(Atom {
                base: BaseType::String,
                semantic: None,
                enumeration: None,
                negated: false,
                constraint: Constraint::String(StrConstraint {
                    min_length: 0,
                    max_length: None,
                    pattern: Some(complement),
                }),
            });
        }
    }
    Ok(())
}

/// Array/object complements are opaque: a single covering atom flips its
/// `negated` bit, anything richer is unsupported
fn complement_opaque(
    graph: &SchemaGraph,
    covering: &[&Atom],
    base: BaseType,
    top: SchemaId,
    location: &str,
    pieces: &mut Vec<Atom>,
) -> Result<()> {
    match covering {
        [] => {
            pieces.push(unconstrained_atom(base, top));
            Ok(())
        }
        [atom] => {
            if crate::driver::atom_is_full_domain(graph, atom) {
                // Complement of the full domain contributes nothing
                return Ok(());
            }
            let mut flipped = (*atom).clone();
            flipped.negated = !flipped.negated;
            flipped.semantic = None;
            pieces.push(flipped);
            Ok(())
        }
        _ => Err(Error::unsupported(
            location,
            format!("complement of multiple {base} constraints"),
        )),
    }
}

/// An unconstrained array/object atom anchored at the graph's Top node
fn unconstrained_atom(base: BaseType, top: SchemaId) -> Atom {
    let constraint = match base {
        BaseType::Array => Constraint::Array(subsume_core::ArrayConstraint {
            min_items: 0,
            max_items: None,
            unique: false,
            items: subsume_core::Items::Uniform(top),
        }),
        _ => Constraint::Object(subsume_core::ObjectConstraint {
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

/// Flip a bound to the other side with opposite exclusivity
fn flip(bound: &Bound) -> Bound {
    Bound {
        value: bound.value.clone(),
        exclusive: !bound.exclusive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::{canonicalize_document, CanonOptions};
    use crate::driver::Subtyper;
    use serde_json::json;
    use subsume_core::decision::Decision;
    use subsume_semantic::NullResolver;

    fn canon_and_complement(value: &Value) -> (SchemaGraph, SchemaId, SchemaId) {
        let mut graph = SchemaGraph::new();
        let resolver = NullResolver::new();
        let id = canonicalize_document(&mut graph, value, &resolver, &CanonOptions::default())
            .unwrap();
        let comp = complement_node(&mut graph, &resolver, id, "/not").unwrap();
        (graph, id, comp)
    }

    #[test]
    fn test_complement_of_top_is_bottom() {
        let (graph, _, comp) = canon_and_complement(&json!({}));
        assert!(graph.is_bottom(comp));
    }

    #[test]
    fn test_complement_of_bottom_is_top() {
        let mut graph = SchemaGraph::new();
        let resolver = NullResolver::new();
        let bottom = graph.bottom();
        let comp = complement_node(&mut graph, &resolver, bottom, "/not").unwrap();
        assert!(crate::driver::node_is_top(&graph, comp));
    }

    #[test]
    fn test_numeric_interval_complement() {
        let (graph, id, comp) = canon_and_complement(&json!({"type": "number", "minimum": 0, "maximum": 10}));
        let resolver = NullResolver::new();
        let mut checker = Subtyper::new(&graph, &resolver);
        // The original and its complement are disjoint: neither is a
        // subtype of the other (both non-trivial)
        assert_eq!(checker.subtype_nodes(id, comp).unwrap(), Decision::No);

        // Values outside the interval satisfy the complement
        let atoms = &graph.node(comp).atoms;
        assert!(atoms.iter().any(|a| a.base == BaseType::Null));
        assert!(atoms
            .iter()
            .any(|a| a.base == BaseType::Number && !a.negated));
    }

    #[test]
    fn test_boolean_enum_complement() {
        let (graph, _, comp) = canon_and_complement(&json!({"type": "boolean", "enum": [true]}));
        let atoms = &graph.node(comp).atoms;
        let boolean = atoms.iter().find(|a| a.base == BaseType::Boolean).unwrap();
        let values = boolean.enumeration.as_ref().unwrap();
        assert_eq!(values.as_slice(), &[Value::Bool(false)]);
    }

    #[test]
    fn test_string_pattern_complement_is_exact() {
        let (graph, _, comp) = canon_and_complement(&json!({"type": "string", "pattern": "^a+$"}));
        use crate::satisfies::value_satisfies_node;
        assert!(!value_satisfies_node(&graph, comp, &json!("aaa")));
        assert!(value_satisfies_node(&graph, comp, &json!("b")));
        assert!(value_satisfies_node(&graph, comp, &json!(true)));
    }

    #[test]
    fn test_multiple_of_complement_is_opaque() {
        let (graph, _, comp) =
            canon_and_complement(&json!({"type": "number", "multipleOf": 3}));
        let atoms = &graph.node(comp).atoms;
        assert!(atoms
            .iter()
            .any(|a| a.base == BaseType::Number && a.negated));
    }

    #[test]
    fn test_double_complement_via_not_not() {
        let mut graph = SchemaGraph::new();
        let resolver = NullResolver::new();
        let id = canonicalize_document(
            &mut graph,
            &json!({"not": {"not": {"type": "string", "pattern": "^x$"}}}),
            &resolver,
            &CanonOptions::default(),
        )
        .unwrap();
        use crate::satisfies::value_satisfies_node;
        assert!(value_satisfies_node(&graph, id, &json!("x")));
        assert!(!value_satisfies_node(&graph, id, &json!("y")));
    }
}
