//! Thompson construction over class-labeled edges

use crate::ast::Ast;
use crate::class::CharClass;

/// Nondeterministic automaton with epsilon moves and class-labeled edges
#[derive(Debug)]
pub struct Nfa {
    pub states: Vec<NfaState>,
    pub start: usize,
    pub accept: usize,
}

/// One NFA state
#[derive(Debug, Default)]
pub struct NfaState {
    pub epsilon: Vec<usize>,
    pub trans: Vec<(CharClass, usize)>,
}

impl Nfa {
    /// Compile an anchor-free syntax tree
    pub fn compile(ast: &Ast) -> Nfa {
        let mut builder = Builder { states: Vec::new() };
        let (start, accept) = builder.fragment(ast);
        Nfa {
            states: builder.states,
            start,
            accept,
        }
    }

    /// Every class that labels an edge (used to build the alphabet partition)
    pub fn edge_classes(&self) -> impl Iterator<Item = &CharClass> {
        self.states
            .iter()
            .flat_map(|s| s.trans.iter().map(|(class, _)| class))
    }
}

struct Builder {
    states: Vec<NfaState>,
}

impl Builder {
    fn state(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    /// Build a fragment with dedicated entry and exit states
    fn fragment(&mut self, ast: &Ast) -> (usize, usize) {
        match ast {
            Ast::Empty => {
                let s = self.state();
                let e = self.state();
                self.epsilon(s, e);
                (s, e)
            }
            Ast::Class(class) => {
                let s = self.state();
                let e = self.state();
                if !class.is_empty() {
                    self.states[s].trans.push((class.clone(), e));
                }
                (s, e)
            }
            Ast::Concat(items) => {
                let s = self.state();
                let mut prev = s;
                for item in items {
                    let (fs, fe) = self.fragment(item);
                    self.epsilon(prev, fs);
                    prev = fe;
                }
                (s, prev)
            }
            Ast::Alt(branches) => {
                let s = self.state();
                let e = self.state();
                for branch in branches {
                    let (fs, fe) = self.fragment(branch);
                    self.epsilon(s, fs);
                    self.epsilon(fe, e);
                }
                (s, e)
            }
            Ast::Repeat { node, min, max } => self.repeat(node, *min, *max),
            // Anchors are rewritten away before compilation; an anchor here
            // would be a caller bug, so it compiles as the empty string.
            Ast::AnchorStart | Ast::AnchorEnd => self.fragment(&Ast::Empty),
        }
    }

    /// Expand bounded repetition by duplicating the subfragment
    fn repeat(&mut self, node: &Ast, min: u32, max: Option<u32>) -> (usize, usize) {
        let s = self.state();
        let mut prev = s;

        for _ in 0..min {
            let (fs, fe) = self.fragment(node);
            self.epsilon(prev, fs);
            prev = fe;
        }

        match max {
            None => {
                // Kleene tail: zero or more further copies
                let (fs, fe) = self.fragment(node);
                let e = self.state();
                self.epsilon(prev, fs);
                self.epsilon(prev, e);
                self.epsilon(fe, fs);
                self.epsilon(fe, e);
                (s, e)
            }
            Some(max) => {
                // Optional tail copies, each skippable to the exit
                let e = self.state();
                for _ in min..max {
                    let (fs, fe) = self.fragment(node);
                    self.epsilon(prev, fs);
                    self.epsilon(prev, e);
                    prev = fe;
                }
                self.epsilon(prev, e);
                (s, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn nfa_for(pattern: &str) -> Nfa {
        let ast = parser::parse(pattern).unwrap();
        let ast = parser::to_anchored(ast, pattern).unwrap();
        Nfa::compile(&ast)
    }

    #[test]
    fn test_compile_produces_edges() {
        let nfa = nfa_for("^a(b|c)*$");
        assert!(nfa.edge_classes().count() >= 3);
        assert!(nfa.states.len() > 4);
    }

    #[test]
    fn test_bounded_repeat_duplicates() {
        let small = nfa_for("^a{2}$").states.len();
        let large = nfa_for("^a{8}$").states.len();
        assert!(large > small);
    }
}
