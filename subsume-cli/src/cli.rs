use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Check whether the LHS JSON Schema is a subschema (<:) of the RHS.
///
/// Exit codes: 0 the subtype holds, 1 it does not, 2 input error,
/// 3 a construct outside the supported dialect.
#[derive(Parser)]
#[command(name = "subsume", version)]
pub struct Cli {
    /// Path to the JSON file holding the LHS schema
    pub lhs: PathBuf,

    /// Path to the JSON file holding the RHS schema
    pub rhs: PathBuf,

    /// Enable a preconfigured ontology prefix set (repeatable)
    #[arg(long, value_enum)]
    pub ontology: Vec<Ontology>,

    /// Load concept relations from a triples file (repeatable).
    /// Lines look like `ex:Narrower skos:broader ex:Broader`;
    /// `rdfs:subClassOf` is accepted as the relation too.
    #[arg(long)]
    pub graph: Vec<PathBuf>,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long)]
    pub no_color: bool,
}

/// Preconfigured ontology prefix sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ontology {
    /// QUDT quantity kinds (`quantitykind:`, `qudt:`)
    Qudt,
    /// FOAF (`foaf:`)
    Foaf,
    /// SKOS core (`skos:`)
    Skos,
}
