//! Lattice laws over a corpus of schemas
//!
//! Reflexivity, transitivity, the meet/join bound laws, Top/Bottom, and
//! equivalence, checked pairwise over a small but varied schema corpus.

use serde_json::{json, Value};
use subsume_lattice::{is_equivalent, is_subschema, join, meet};

fn corpus() -> Vec<Value> {
    vec![
        json!({}),
        json!({"not": {}}),
        json!({"type": "null"}),
        json!({"type": "boolean"}),
        json!({"type": "boolean", "enum": [true]}),
        json!({"type": "integer"}),
        json!({"type": "integer", "minimum": 0}),
        json!({"type": "integer", "minimum": 0, "maximum": 10}),
        json!({"type": "number"}),
        json!({"type": "number", "minimum": 0, "maximum": 100}),
        json!({"type": "number", "multipleOf": 2}),
        json!({"type": "string"}),
        json!({"type": "string", "minLength": 1}),
        json!({"type": "string", "pattern": "^a[bc]$"}),
        json!({"type": "string", "enum": ["ab", "ac"]}),
        json!({"type": ["integer", "string"]}),
        json!({"type": "array", "items": {"type": "integer"}}),
        json!({"type": "array", "items": {"type": "number"}, "minItems": 1}),
        json!({"type": "object", "properties": {"x": {"type": "integer"}}, "required": ["x"]}),
        json!({"type": "object", "properties": {"x": {"type": "number"}}}),
        json!({"enum": [1, "two", [3], {"four": 4}]}),
    ]
}

#[test]
fn reflexivity() {
    for schema in corpus() {
        assert!(
            is_subschema(&schema, &schema).unwrap(),
            "schema not a subtype of itself: {schema}"
        );
    }
}

#[test]
fn transitivity() {
    let schemas = corpus();
    for a in &schemas {
        for b in &schemas {
            if !is_subschema(a, b).unwrap() {
                continue;
            }
            for c in &schemas {
                if is_subschema(b, c).unwrap() {
                    assert!(
                        is_subschema(a, c).unwrap(),
                        "transitivity broken: {a} <: {b} <: {c}"
                    );
                }
            }
        }
    }
}

#[test]
fn top_and_bottom() {
    let top = json!({});
    let bottom = json!({"not": {}});
    for schema in corpus() {
        assert!(
            is_subschema(&bottom, &schema).unwrap(),
            "Bottom not below {schema}"
        );
        assert!(
            is_subschema(&schema, &top).unwrap(),
            "{schema} not below Top"
        );
    }
}

#[test]
fn meet_is_a_lower_bound() {
    let schemas = corpus();
    for a in &schemas {
        for b in &schemas {
            let m = meet(a, b).unwrap();
            assert!(
                is_subschema(&m, a).unwrap(),
                "meet({a}, {b}) = {m} not below {a}"
            );
            assert!(
                is_subschema(&m, b).unwrap(),
                "meet({a}, {b}) = {m} not below {b}"
            );
        }
    }
}

#[test]
fn meet_is_greatest_among_corpus_lower_bounds() {
    let schemas = corpus();
    for a in &schemas {
        for b in &schemas {
            let m = meet(a, b).unwrap();
            for c in &schemas {
                if is_subschema(c, a).unwrap() && is_subschema(c, b).unwrap() {
                    assert!(
                        is_subschema(c, &m).unwrap(),
                        "{c} is a lower bound of {a} and {b} but not below meet = {m}"
                    );
                }
            }
        }
    }
}

#[test]
fn join_is_an_upper_bound() {
    let schemas = corpus();
    for a in &schemas {
        for b in &schemas {
            let j = join(a, b).unwrap();
            assert!(
                is_subschema(a, &j).unwrap(),
                "{a} not below join({a}, {b}) = {j}"
            );
            assert!(
                is_subschema(b, &j).unwrap(),
                "{b} not below join({a}, {b}) = {j}"
            );
        }
    }
}

#[test]
fn join_is_least_among_corpus_upper_bounds() {
    let schemas = corpus();
    for a in &schemas {
        for b in &schemas {
            let j = join(a, b).unwrap();
            for c in &schemas {
                if is_subschema(a, c).unwrap() && is_subschema(b, c).unwrap() {
                    assert!(
                        is_subschema(&j, c).unwrap(),
                        "{c} is an upper bound of {a} and {b} but join = {j} is not below it"
                    );
                }
            }
        }
    }
}

#[test]
fn equivalence_is_mutual_subtyping() {
    let schemas = corpus();
    for a in &schemas {
        for b in &schemas {
            let forward = is_subschema(a, b).unwrap();
            let backward = is_subschema(b, a).unwrap();
            assert_eq!(
                is_equivalent(a, b).unwrap(),
                forward && backward,
                "equivalence mismatch for {a} and {b}"
            );
        }
    }
}

#[test]
fn equivalent_spellings() {
    // Different spellings of the same set of values
    let pairs = [
        (
            json!({"type": "string", "pattern": "^a(b|c)$"}),
            json!({"type": "string", "pattern": "^a[bc]$"}),
        ),
        (
            json!({"type": "integer", "minimum": 0, "exclusiveMinimum": false}),
            json!({"type": "integer", "minimum": 0}),
        ),
        (
            json!({"anyOf": [{"type": "integer"}, {"type": "string"}]}),
            json!({"type": ["string", "integer"]}),
        ),
    ];
    for (a, b) in pairs {
        assert!(is_equivalent(&a, &b).unwrap(), "{a} should equal {b}");
    }
}

#[test]
fn canonicalization_is_idempotent_through_serialization() {
    use subsume_core::canonical::SchemaGraph;
    use subsume_lattice::{canonicalize_document, serialize, CanonOptions};
    use subsume_semantic::NullResolver;

    for schema in corpus() {
        let resolver = NullResolver::new();
        let mut g1 = SchemaGraph::new();
        let id1 =
            canonicalize_document(&mut g1, &schema, &resolver, &CanonOptions::default()).unwrap();
        let serialized = serialize(&g1, id1);
        let mut g2 = SchemaGraph::new();
        let id2 = canonicalize_document(&mut g2, &serialized, &resolver, &CanonOptions::default())
            .unwrap();
        assert!(
            subsume_core::nodes_equal(&g1, id1, &g2, id2),
            "canonical form drifted for {schema}: {serialized}"
        );
    }
}
