mod cli;
mod error;
mod graph_file;

use clap::Parser;
use cli::{Cli, Ontology};
use error::{exit_with_error, CliError, CliResult, EXIT_NOT_SUBTYPE, EXIT_SUBTYPE};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use subsume_lattice::Engine;
use subsume_semantic::{ConceptGraphBuilder, NullResolver, SemanticResolver};
use subsume_vocab::{ex, foaf, quantitykind, qudt, skos, PrefixMap};

fn init_tracing() {
    // The engine crates emit `tracing` events. Without an installed
    // subscriber, `RUST_LOG=...` has no effect.
    //
    // Default to "off" so output only changes when the user opts in.
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "off".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
    init_tracing();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => exit_with_error(e),
    }
}

fn run(cli: &Cli) -> CliResult<i32> {
    let lhs = load_schema(&cli.lhs)?;
    let rhs = load_schema(&cli.rhs)?;

    let semantic_configured = !cli.ontology.is_empty() || !cli.graph.is_empty();
    if !semantic_configured && (mentions_stype(&lhs) || mentions_stype(&rhs)) {
        return Err(CliError::Input(
            "schemas contain semantic types (stype) but no ontology was provided; \
             pass --ontology or --graph, or remove stype for structural checking"
                .to_string(),
        ));
    }

    let resolver: Arc<dyn SemanticResolver> = if semantic_configured {
        let mut builder = ConceptGraphBuilder::with_prefixes(prefix_map_for(&cli.ontology));
        for path in &cli.graph {
            let loaded = graph_file::load_into(&mut builder, path)?;
            eprintln!("loaded {loaded} relations from {}", path.display());
        }
        Arc::new(builder.build())
    } else {
        Arc::new(NullResolver::new())
    };

    let engine = Engine::with_resolver(resolver);
    let holds = engine.is_subschema(&lhs, &rhs)?;
    println!("LHS <: RHS: {holds}");
    Ok(if holds { EXIT_SUBTYPE } else { EXIT_NOT_SUBTYPE })
}

/// Prefix bindings for the selected ontologies.
///
/// With no `--ontology` (relations from `--graph` only), every known
/// binding is available; otherwise only the selected vocabularies expand,
/// plus the `ex:` namespace for ad-hoc graph files.
fn prefix_map_for(ontologies: &[Ontology]) -> PrefixMap {
    if ontologies.is_empty() {
        return PrefixMap::with_defaults();
    }
    let mut map = PrefixMap::new();
    map.bind("ex", ex::NS);
    for ontology in ontologies {
        match ontology {
            Ontology::Qudt => {
                map.bind("qudt", qudt::NS);
                map.bind("quantitykind", quantitykind::NS);
            }
            Ontology::Foaf => {
                map.bind("foaf", foaf::NS);
            }
            Ontology::Skos => {
                map.bind("skos", skos::NS);
            }
        }
    }
    map
}

fn load_schema(path: &Path) -> CliResult<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("{} is not valid JSON: {e}", path.display())))
}

/// Does any subschema carry an `stype` annotation?
fn mentions_stype(schema: &Value) -> bool {
    match schema {
        Value::Object(map) => {
            map.contains_key("stype") || map.values().any(mentions_stype)
        }
        Value::Array(items) => items.iter().any(mentions_stype),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_map_selection() {
        let qudt_only = prefix_map_for(&[Ontology::Qudt]);
        assert!(qudt_only.expand("quantitykind:Temperature").is_some());
        assert!(qudt_only.expand("qudt:Unit").is_some());
        assert!(qudt_only.expand("foaf:Person").is_none());

        let foaf_only = prefix_map_for(&[Ontology::Foaf]);
        assert!(foaf_only.expand("foaf:Person").is_some());
        assert!(foaf_only.expand("quantitykind:Temperature").is_none());

        let both = prefix_map_for(&[Ontology::Qudt, Ontology::Foaf]);
        assert!(both.expand("quantitykind:Temperature").is_some());
        assert!(both.expand("foaf:Person").is_some());

        // No selection at all: every known binding stays available
        let default = prefix_map_for(&[]);
        assert!(default.expand("skos:broader").is_some());
        assert!(default.expand("foaf:Person").is_some());
    }

    #[test]
    fn test_mentions_stype() {
        assert!(mentions_stype(&json!({"stype": "foaf:Person"})));
        assert!(mentions_stype(&json!({
            "type": "object",
            "properties": {"p": {"stype": "foaf:Person"}}
        })));
        assert!(mentions_stype(&json!({
            "anyOf": [{"type": "integer"}, {"stype": "x:Y"}]
        })));
        assert!(!mentions_stype(&json!({"type": "integer"})));
    }
}
