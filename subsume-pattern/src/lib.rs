//! Regular-language reasoning for schema subtyping
//!
//! Compiles a restricted regex dialect to DFAs over a symbolic class
//! alphabet and decides containment, intersection, union, and complement
//! exactly. Anything outside the dialect is rejected with
//! [`PatternError::Unsupported`]; the engine never approximates.
//!
//! Patterns follow JSON Schema (ECMA-262) search semantics: an unanchored
//! pattern matches any string containing a match, so `ab` and `^.*ab.*$`
//! accept the same language.

mod ast;
mod class;
mod dfa;
mod error;
mod nfa;
mod parser;

pub use class::CharClass;
pub use error::{PatternError, Result};
pub use parser::REPEAT_LIMIT;

use dfa::Dfa;
use std::fmt;

/// A compiled pattern: the source text plus the DFA for its language.
///
/// The language always describes *whole* strings. Comparisons
/// (`is_subset`, `is_equivalent`) are by language, not by source text;
/// `source()` is kept for serialization and display.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    dfa: Dfa,
}

impl Pattern {
    /// Compile a pattern from the restricted dialect
    pub fn parse(pattern: &str) -> Result<Pattern> {
        let ast = parser::parse(pattern)?;
        let ast = parser::to_anchored(ast, pattern)?;
        let nfa = nfa::Nfa::compile(&ast);
        let dfa = Dfa::from_nfa(&nfa);
        tracing::trace!(
            pattern,
            nfa_states = nfa.states.len(),
            dfa_states = dfa.state_count(),
            "compiled pattern"
        );
        Ok(Pattern {
            source: pattern.to_string(),
            dfa,
        })
    }

    /// The pattern accepting every string
    pub fn universal() -> Pattern {
        // Infallible: the source is well inside the dialect
        match Pattern::parse("") {
            Ok(p) => p,
            Err(_) => unreachable!("empty pattern is always valid"),
        }
    }

    /// The pattern accepting exactly the given strings (none given means
    /// the empty language)
    pub fn from_literals<'a>(literals: impl IntoIterator<Item = &'a str>) -> Pattern {
        let branches: Vec<String> = literals.into_iter().map(escape).collect();
        if branches.is_empty() {
            return Pattern::universal().complement();
        }
        let source = format!("^(?:{})$", branches.join("|"));
        match Pattern::parse(&source) {
            Ok(p) => p,
            Err(_) => unreachable!("escaped literals are always valid"),
        }
    }

    /// The original pattern text (synthesized for derived patterns)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// `L(self) ⊆ L(other)`
    pub fn is_subset(&self, other: &Pattern) -> bool {
        self.dfa.is_subset(&other.dfa)
    }

    /// Language equality
    pub fn is_equivalent(&self, other: &Pattern) -> bool {
        self.dfa.is_equivalent(&other.dfa)
    }

    /// True when the language contains no strings
    pub fn is_empty(&self) -> bool {
        self.dfa.is_empty()
    }

    /// True when the language contains every string
    pub fn is_universal(&self) -> bool {
        self.dfa.is_universal()
    }

    /// Test a concrete string (used for enum value checks)
    pub fn matches(&self, input: &str) -> bool {
        self.dfa.matches(input)
    }

    /// `L(self) ∩ L(other)`, with a synthesized anchored source
    pub fn intersect(&self, other: &Pattern) -> Pattern {
        Pattern::from_dfa(self.dfa.intersect(&other.dfa))
    }

    /// `L(self) ∪ L(other)`, with a synthesized anchored source
    pub fn union(&self, other: &Pattern) -> Pattern {
        Pattern::from_dfa(self.dfa.union(&other.dfa))
    }

    /// The complement language
    pub fn complement(&self) -> Pattern {
        Pattern::from_dfa(self.dfa.complement())
    }

    fn from_dfa(dfa: Dfa) -> Pattern {
        let source = format!("^(?:{})$", dfa.to_pattern());
        Pattern { source, dfa }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Escape a literal string so it matches itself in the dialect
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{'
            | '}' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!(r"\u{{{:X}}}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
