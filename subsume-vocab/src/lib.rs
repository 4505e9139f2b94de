//! Ontology Vocabulary Constants and Prefix Handling for subsume
//!
//! This crate provides a centralized location for the ontology IRIs and
//! prefix machinery used by semantic-type (`stype`) reasoning.
//!
//! # Organization
//!
//! Constants are organized by vocabulary:
//! - `skos` - SKOS vocabulary (http://www.w3.org/2004/02/skos/core#)
//! - `rdfs` - RDFS vocabulary (http://www.w3.org/2000/01/rdf-schema#)
//! - `qudt` - QUDT schema vocabulary (http://qudt.org/schema/qudt/)
//! - `quantitykind` - QUDT quantity kinds (http://qudt.org/vocab/quantitykind/)
//! - `foaf` - FOAF vocabulary (http://xmlns.com/foaf/0.1/)

use rustc_hash::FxHashMap;
use std::fmt;

/// SKOS vocabulary constants
pub mod skos {
    /// SKOS namespace
    pub const NS: &str = "http://www.w3.org/2004/02/skos/core#";

    /// skos:broader IRI (narrower concept points at its broader concept)
    pub const BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";

    /// skos:narrower IRI
    pub const NARROWER: &str = "http://www.w3.org/2004/02/skos/core#narrower";
}

/// RDFS vocabulary constants
pub mod rdfs {
    /// RDFS namespace
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

    /// rdfs:subClassOf IRI
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

    /// rdfs:subPropertyOf IRI
    pub const SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
}

/// QUDT schema vocabulary constants
pub mod qudt {
    /// QUDT schema namespace
    pub const NS: &str = "http://qudt.org/schema/qudt/";
}

/// QUDT quantity-kind vocabulary constants
pub mod quantitykind {
    /// Quantity-kind namespace
    pub const NS: &str = "http://qudt.org/vocab/quantitykind/";
}

/// FOAF vocabulary constants
pub mod foaf {
    /// FOAF namespace
    pub const NS: &str = "http://xmlns.com/foaf/0.1/";

    /// foaf:Agent IRI
    pub const AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";

    /// foaf:Person IRI
    pub const PERSON: &str = "http://xmlns.com/foaf/0.1/Person";
}

/// Example namespace used in tests and documentation
pub mod ex {
    /// Example namespace
    pub const NS: &str = "http://example.org/";
}

/// A full concept IRI.
///
/// Thin wrapper over the expanded IRI string. Construction does not validate
/// IRI syntax; callers normalize compact notation through a [`PrefixMap`]
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(String);

impl Iri {
    /// Wrap an already-expanded IRI string
    pub fn new(iri: impl Into<String>) -> Self {
        Iri(iri.into())
    }

    /// The IRI as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, returning the IRI string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Iri(s.to_string())
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Iri(s)
    }
}

/// Prefix table for expanding compact `prefix:localName` notation to full IRIs.
///
/// Expansion is purely syntactic. Unknown prefixes and values that are already
/// full IRIs pass through unchanged, so a missing binding degrades to exact
/// string comparison rather than an error.
#[derive(Debug, Clone, Default)]
pub struct PrefixMap {
    entries: FxHashMap<String, String>,
}

impl PrefixMap {
    /// Create an empty prefix map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a prefix map with the standard bindings
    /// (`quantitykind`, `qudt`, `skos`, `foaf`, `ex`)
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.bind("quantitykind", quantitykind::NS);
        map.bind("qudt", qudt::NS);
        map.bind("skos", skos::NS);
        map.bind("foaf", foaf::NS);
        map.bind("ex", ex::NS);
        map
    }

    /// Bind a prefix to a namespace, replacing any previous binding
    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.entries.insert(prefix.into(), namespace.into());
    }

    /// Look up the namespace bound to a prefix
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Expand `prefix:localName` notation against the bound prefixes.
    ///
    /// Returns `None` when the value has no `:` or the prefix is unbound.
    pub fn expand(&self, compact: &str) -> Option<String> {
        let (prefix, local) = compact.split_once(':')?;
        let namespace = self.entries.get(prefix)?;
        Some(format!("{namespace}{local}"))
    }

    /// Normalize an `stype` value to a full IRI.
    ///
    /// Values that already look like full IRIs (`http://`/`https://`) pass
    /// through, compact notation expands when the prefix is bound, and
    /// anything else is returned unchanged.
    pub fn normalize(&self, stype: &str) -> Iri {
        if stype.starts_with("http://") || stype.starts_with("https://") {
            return Iri::new(stype);
        }
        match self.expand(stype) {
            Some(full) => Iri::new(full),
            None => Iri::new(stype),
        }
    }

    /// Number of bound prefixes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no prefixes are bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
