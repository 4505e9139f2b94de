//! Concept-relation file loading
//!
//! A graph file is a plain text file of whitespace-separated triples, one
//! per line:
//!
//! ```text
//! # narrower  relation  broader
//! quantitykind:ThermodynamicTemperature  skos:broader     quantitykind:Temperature
//! ex:Dog                                 rdfs:subClassOf  ex:Animal
//! ```
//!
//! `#` starts a comment, a trailing `.` is tolerated (N-Triples habit),
//! and IRIs may be compact or full (angle brackets optional). Only
//! `skos:broader` and `rdfs:subClassOf` relations are meaningful; other
//! predicates are skipped.

use crate::error::{CliError, CliResult};
use std::path::Path;
use subsume_semantic::ConceptGraphBuilder;

const BROADER_PREDICATES: [&str; 4] = [
    "skos:broader",
    "rdfs:subClassOf",
    "http://www.w3.org/2004/02/skos/core#broader",
    "http://www.w3.org/2000/01/rdf-schema#subClassOf",
];

/// Load one relations file into the builder
pub fn load_into(builder: &mut ConceptGraphBuilder, path: &Path) -> CliResult<usize> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display())))?;
    let mut loaded = 0usize;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let line = line.strip_suffix('.').unwrap_or(line).trim();
        let mut parts = line.split_whitespace();
        let (Some(subject), Some(predicate), Some(object)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(CliError::Input(format!(
                "{}:{}: expected `narrower relation broader`",
                path.display(),
                line_no + 1
            )));
        };
        if parts.next().is_some() {
            return Err(CliError::Input(format!(
                "{}:{}: trailing tokens after triple",
                path.display(),
                line_no + 1
            )));
        }
        let predicate = strip_brackets(predicate);
        if BROADER_PREDICATES.contains(&predicate) {
            builder.add_broader(strip_brackets(subject), strip_brackets(object));
            loaded += 1;
        }
    }
    Ok(loaded)
}

fn strip_brackets(token: &str) -> &str {
    token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token)
}
