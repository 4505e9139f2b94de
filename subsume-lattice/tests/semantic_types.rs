//! End-to-end semantic-type (`stype`) behavior

use serde_json::json;
use std::sync::Arc;
use subsume_lattice::{Decision, Engine};
use subsume_semantic::{ConceptGraph, NullResolver};

fn qudt_engine() -> Engine {
    let mut builder = ConceptGraph::builder();
    builder.add_broader(
        "quantitykind:ThermodynamicTemperature",
        "quantitykind:Temperature",
    );
    Engine::with_resolver(Arc::new(builder.build()))
}

#[test]
fn broader_concept_accepts_narrower() {
    let engine = qudt_engine();
    let narrow = json!({"type": "number", "stype": "quantitykind:ThermodynamicTemperature"});
    let wide = json!({"type": "number", "stype": "quantitykind:Temperature"});
    assert!(engine.is_subschema(&narrow, &wide).unwrap());
    assert!(!engine.is_subschema(&wide, &narrow).unwrap());
}

#[test]
fn absent_stype_is_top_concept() {
    let engine = qudt_engine();
    let annotated = json!({"type": "number", "stype": "quantitykind:Temperature"});
    let plain = json!({"type": "number"});
    // More specific below less specific
    assert!(engine.is_subschema(&annotated, &plain).unwrap());
    // A plain number is not provably a Temperature
    assert!(!engine.is_subschema(&plain, &annotated).unwrap());
}

#[test]
fn semantic_and_structural_constraints_compose() {
    let engine = qudt_engine();
    let narrow = json!({
        "type": "number", "minimum": 0,
        "stype": "quantitykind:ThermodynamicTemperature"
    });
    let wide = json!({
        "type": "number",
        "stype": "quantitykind:Temperature"
    });
    assert!(engine.is_subschema(&narrow, &wide).unwrap());

    // Structural failure overrides semantic success
    let wide_bounded = json!({
        "type": "number", "minimum": 100,
        "stype": "quantitykind:Temperature"
    });
    assert!(!engine.is_subschema(&narrow, &wide_bounded).unwrap());
}

#[test]
fn unknown_concept_reports_unknown() {
    let engine = qudt_engine();
    let lhs = json!({"type": "number", "stype": "quantitykind:Frequency"});
    let rhs = json!({"type": "number", "stype": "quantitykind:Temperature"});
    let report = engine.check_subschema(&lhs, &rhs).unwrap();
    assert_eq!(report.decision, Decision::Unknown);
    assert!(!report.holds());
    assert!(!report.diagnostics.is_empty());
}

#[test]
fn null_resolver_requires_exact_match() {
    let engine = Engine::with_resolver(Arc::new(NullResolver::new()));
    let a = json!({"type": "number", "stype": "quantitykind:Temperature"});
    let b = json!({"type": "number", "stype": "http://qudt.org/vocab/quantitykind/Temperature"});
    // Compact and full spellings normalize to the same IRI
    assert!(engine.is_subschema(&a, &b).unwrap());

    let c = json!({"type": "number", "stype": "quantitykind:Mass"});
    assert!(!engine.is_subschema(&a, &c).unwrap());
}

#[test]
fn backward_compatibility_without_stype() {
    // With no stype anywhere, the semantic resolver never changes answers
    let structural = Engine::new();
    let semantic = qudt_engine();
    let cases = [
        (json!({"type": "integer"}), json!({"type": "number"})),
        (
            json!({"type": "string", "minLength": 1}),
            json!({"type": "string"}),
        ),
        (
            json!({"type": "object", "required": ["a"], "properties": {"a": {}}}),
            json!({"type": "object"}),
        ),
    ];
    for (lhs, rhs) in cases {
        assert_eq!(
            structural.is_subschema(&lhs, &rhs).unwrap(),
            semantic.is_subschema(&lhs, &rhs).unwrap(),
        );
    }
}

#[test]
fn stype_in_nested_positions() {
    let engine = qudt_engine();
    let narrow = json!({
        "type": "object",
        "properties": {
            "reading": {"type": "number", "stype": "quantitykind:ThermodynamicTemperature"}
        },
        "required": ["reading"]
    });
    let wide = json!({
        "type": "object",
        "properties": {
            "reading": {"type": "number", "stype": "quantitykind:Temperature"}
        }
    });
    assert!(engine.is_subschema(&narrow, &wide).unwrap());
    assert!(!engine.is_subschema(&wide, &narrow).unwrap());
}

#[test]
fn equivalence_requires_stype_parity() {
    let engine = qudt_engine();
    let annotated = json!({"type": "number", "stype": "quantitykind:Temperature"});
    let plain = json!({"type": "number"});
    assert!(!engine.is_equivalent(&annotated, &plain).unwrap());
    assert!(engine.is_equivalent(&annotated, &annotated).unwrap());
}

#[test]
fn meet_keeps_the_narrower_stype() {
    let engine = qudt_engine();
    let narrow = json!({"type": "number", "stype": "quantitykind:ThermodynamicTemperature"});
    let wide = json!({"type": "number", "stype": "quantitykind:Temperature"});
    let met = engine.meet(&narrow, &wide).unwrap();
    assert_eq!(
        met["stype"],
        json!("http://qudt.org/vocab/quantitykind/ThermodynamicTemperature")
    );
}
