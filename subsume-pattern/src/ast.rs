//! Syntax tree for the restricted regex dialect

use crate::class::CharClass;

/// Parsed regex node.
///
/// Anchors survive parsing as explicit nodes; [`crate::parser::to_anchored`]
/// rewrites the tree into a full-string language before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// Matches the empty string
    Empty,
    /// Matches one character drawn from the class
    Class(CharClass),
    /// Sequence
    Concat(Vec<Ast>),
    /// Alternation
    Alt(Vec<Ast>),
    /// Repetition: `min..=max` copies (`max` absent means unbounded)
    Repeat {
        node: Box<Ast>,
        min: u32,
        max: Option<u32>,
    },
    /// `^`
    AnchorStart,
    /// `$`
    AnchorEnd,
}

impl Ast {
    /// True if any anchor node occurs in this subtree
    pub fn contains_anchor(&self) -> bool {
        match self {
            Ast::AnchorStart | Ast::AnchorEnd => true,
            Ast::Empty | Ast::Class(_) => false,
            Ast::Concat(items) | Ast::Alt(items) => items.iter().any(Ast::contains_anchor),
            Ast::Repeat { node, .. } => node.contains_anchor(),
        }
    }
}
