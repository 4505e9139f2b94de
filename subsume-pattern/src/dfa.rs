//! Deterministic automata over a symbolic class alphabet
//!
//! The alphabet is a partition of the Unicode scalar space into cells; every
//! edge class of the source NFA is a union of cells, so transition tables
//! stay small regardless of how wide the character classes are.
//!
//! All automata here are complete (every state has a successor for every
//! cell), which makes complementation a matter of flipping accept flags.

use crate::class::{CharClass, MAX_SCALAR};
use crate::nfa::Nfa;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// A complete DFA over a cell partition of the scalar alphabet
#[derive(Debug, Clone)]
pub struct Dfa {
    /// Symbolic alphabet: sorted, disjoint, covering cells
    cells: Vec<(u32, u32)>,
    /// Dense transition table: `trans[state][cell]` is the successor
    trans: Vec<Vec<u32>>,
    accept: Vec<bool>,
    start: u32,
}

/// Build the coarsest partition refining every given class
fn partition_cells<'a>(classes: impl Iterator<Item = &'a CharClass>) -> Vec<(u32, u32)> {
    let mut cuts: Vec<u32> = vec![0, MAX_SCALAR + 1];
    for class in classes {
        for &(lo, hi) in class.ranges() {
            cuts.push(lo);
            cuts.push(hi + 1);
        }
    }
    cuts.sort_unstable();
    cuts.dedup();
    cuts.windows(2).map(|w| (w[0], w[1] - 1)).collect()
}

/// Common refinement of two complete cell partitions
fn merge_cells(a: &[(u32, u32)], b: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut cuts: Vec<u32> = a
        .iter()
        .chain(b.iter())
        .flat_map(|&(lo, hi)| [lo, hi + 1])
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts.windows(2).map(|w| (w[0], w[1] - 1)).collect()
}

/// Index of the cell containing a scalar (cells cover the whole alphabet)
fn cell_of(cells: &[(u32, u32)], scalar: u32) -> usize {
    cells
        .partition_point(|&(lo, _)| lo <= scalar)
        .saturating_sub(1)
}

impl Dfa {
    /// Determinize an NFA by subset construction.
    ///
    /// The empty subset becomes an ordinary (dead) state, so the result is
    /// complete by construction.
    pub fn from_nfa(nfa: &Nfa) -> Dfa {
        let cells = partition_cells(nfa.edge_classes());

        let closure = |set: &mut Vec<usize>| {
            let mut queue: VecDeque<usize> = set.iter().copied().collect();
            while let Some(state) = queue.pop_front() {
                for &next in &nfa.states[state].epsilon {
                    if !set.contains(&next) {
                        set.push(next);
                        queue.push_back(next);
                    }
                }
            }
            set.sort_unstable();
            set.dedup();
        };

        let mut start_set = vec![nfa.start];
        closure(&mut start_set);

        let mut ids: FxHashMap<Vec<usize>, u32> = FxHashMap::default();
        let mut sets: Vec<Vec<usize>> = Vec::new();
        let mut trans: Vec<Vec<u32>> = Vec::new();
        let mut accept: Vec<bool> = Vec::new();

        ids.insert(start_set.clone(), 0);
        sets.push(start_set);

        let mut next_unprocessed = 0usize;
        while next_unprocessed < sets.len() {
            let current = sets[next_unprocessed].clone();
            next_unprocessed += 1;

            accept.push(current.contains(&nfa.accept));
            let mut row = Vec::with_capacity(cells.len());
            for &(cell_lo, _) in &cells {
                let mut target: Vec<usize> = Vec::new();
                for &state in &current {
                    for (class, to) in &nfa.states[state].trans {
                        // Cells never straddle a class boundary, so probing
                        // the cell's first scalar decides the whole cell.
                        if class.contains_scalar(cell_lo) {
                            target.push(*to);
                        }
                    }
                }
                closure(&mut target);
                let id = match ids.get(&target) {
                    Some(&id) => id,
                    None => {
                        let id = sets.len() as u32;
                        ids.insert(target.clone(), id);
                        sets.push(target);
                        id
                    }
                };
                row.push(id);
            }
            trans.push(row);
        }

        Dfa {
            cells,
            trans,
            accept,
            start: 0,
        }
        .minimize()
    }

    /// Number of states
    pub fn state_count(&self) -> usize {
        self.trans.len()
    }

    /// Flip acceptance; the language complement
    pub fn complement(&self) -> Dfa {
        let mut out = self.clone();
        for flag in &mut out.accept {
            *flag = !*flag;
        }
        out.minimize()
    }

    /// Product construction combining acceptance with `accept_rule`
    pub fn product(&self, other: &Dfa, accept_rule: impl Fn(bool, bool) -> bool) -> Dfa {
        // Common refinement of both alphabets
        let cells = merge_cells(&self.cells, &other.cells);
        // Map each refined cell back into the owning cell on each side
        let map_a: Vec<usize> = cells.iter().map(|&(lo, _)| cell_of(&self.cells, lo)).collect();
        let map_b: Vec<usize> = cells
            .iter()
            .map(|&(lo, _)| cell_of(&other.cells, lo))
            .collect();

        let mut ids: FxHashMap<(u32, u32), u32> = FxHashMap::default();
        let mut pairs: Vec<(u32, u32)> = vec![(self.start, other.start)];
        ids.insert((self.start, other.start), 0);

        let mut trans: Vec<Vec<u32>> = Vec::new();
        let mut accept: Vec<bool> = Vec::new();

        let mut next_unprocessed = 0usize;
        while next_unprocessed < pairs.len() {
            let (a, b) = pairs[next_unprocessed];
            next_unprocessed += 1;

            accept.push(accept_rule(
                self.accept[a as usize],
                other.accept[b as usize],
            ));
            let mut row = Vec::with_capacity(cells.len());
            for cell in 0..cells.len() {
                let na = self.trans[a as usize][map_a[cell]];
                let nb = other.trans[b as usize][map_b[cell]];
                let id = match ids.get(&(na, nb)) {
                    Some(&id) => id,
                    None => {
                        let id = pairs.len() as u32;
                        ids.insert((na, nb), id);
                        pairs.push((na, nb));
                        id
                    }
                };
                row.push(id);
            }
            trans.push(row);
        }

        Dfa {
            cells,
            trans,
            accept,
            start: 0,
        }
        .minimize()
    }

    /// Language intersection
    pub fn intersect(&self, other: &Dfa) -> Dfa {
        self.product(other, |a, b| a && b)
    }

    /// Language union
    pub fn union(&self, other: &Dfa) -> Dfa {
        self.product(other, |a, b| a || b)
    }

    /// True when no string is accepted
    pub fn is_empty(&self) -> bool {
        let mut visited = vec![false; self.trans.len()];
        let mut queue = VecDeque::from([self.start]);
        visited[self.start as usize] = true;
        while let Some(state) = queue.pop_front() {
            if self.accept[state as usize] {
                return false;
            }
            for &next in &self.trans[state as usize] {
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    queue.push_back(next);
                }
            }
        }
        true
    }

    /// True when every string is accepted
    pub fn is_universal(&self) -> bool {
        self.complement().is_empty()
    }

    /// `L(self) ⊆ L(other)`, decided as emptiness of `self ∩ ¬other`
    pub fn is_subset(&self, other: &Dfa) -> bool {
        self.product(other, |a, b| a && !b).is_empty()
    }

    /// Language equality
    pub fn is_equivalent(&self, other: &Dfa) -> bool {
        self.is_subset(other) && other.is_subset(self)
    }

    /// Run the automaton over a concrete string
    pub fn matches(&self, input: &str) -> bool {
        let mut state = self.start as usize;
        for c in input.chars() {
            let cell = cell_of(&self.cells, c as u32);
            state = self.trans[state][cell] as usize;
        }
        self.accept[state]
    }

    /// Moore partition refinement (plus unreachable-state pruning)
    pub fn minimize(&self) -> Dfa {
        // Prune unreachable states first
        let mut reach: Vec<Option<u32>> = vec![None; self.trans.len()];
        let mut order: Vec<u32> = Vec::new();
        reach[self.start as usize] = Some(0);
        order.push(self.start);
        let mut next_unprocessed = 0usize;
        while next_unprocessed < order.len() {
            let state = order[next_unprocessed];
            next_unprocessed += 1;
            for &next in &self.trans[state as usize] {
                if reach[next as usize].is_none() {
                    reach[next as usize] = Some(order.len() as u32);
                    order.push(next);
                }
            }
        }

        let n = order.len();
        let trans: Vec<Vec<u32>> = order
            .iter()
            .map(|&s| {
                self.trans[s as usize]
                    .iter()
                    .map(|&t| reach[t as usize].unwrap())
                    .collect()
            })
            .collect();
        let accept: Vec<bool> = order.iter().map(|&s| self.accept[s as usize]).collect();

        // Refine blocks until the block count stops growing
        let mut block: Vec<u32> = accept.iter().map(|&a| a as u32).collect();
        loop {
            let old_count = {
                let mut distinct = block.clone();
                distinct.sort_unstable();
                distinct.dedup();
                distinct.len()
            };
            let mut sig_ids: FxHashMap<(u32, Vec<u32>), u32> = FxHashMap::default();
            let mut next_block = Vec::with_capacity(n);
            for state in 0..n {
                let sig: Vec<u32> = trans[state].iter().map(|&t| block[t as usize]).collect();
                let fresh = sig_ids.len() as u32;
                let id = *sig_ids.entry((block[state], sig)).or_insert(fresh);
                next_block.push(id);
            }
            let new_count = sig_ids.len();
            block = next_block;
            if new_count == old_count {
                break;
            }
        }

        // Rebuild on block representatives (first state seen per block)
        let block_count = block.iter().copied().max().map_or(0, |m| m as usize + 1);
        let mut repr: Vec<usize> = vec![usize::MAX; block_count];
        for state in 0..n {
            let b = block[state] as usize;
            if repr[b] == usize::MAX {
                repr[b] = state;
            }
        }
        let new_trans: Vec<Vec<u32>> = repr
            .iter()
            .map(|&state| trans[state].iter().map(|&t| block[t as usize]).collect())
            .collect();
        let new_accept: Vec<bool> = repr.iter().map(|&state| accept[state]).collect();

        Dfa {
            cells: self.cells.clone(),
            trans: new_trans,
            accept: new_accept,
            start: block[0],
        }
    }

    /// The class labeling the edge `from -> to` (union of that edge's cells)
    fn edge_class(&self, from: usize, to: u32) -> CharClass {
        let ranges: Vec<(u32, u32)> = self.trans[from]
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == to)
            .map(|(cell, _)| self.cells[cell])
            .collect();
        CharClass::from_ranges(ranges)
    }

    /// Synthesize a regex for the accepted language by GNFA state
    /// elimination.
    ///
    /// The returned expression describes the full-string language (no
    /// implicit `.*` padding); callers add anchors when serializing.
    pub fn to_pattern(&self) -> String {
        let n = self.trans.len();
        let gnfa_start = n;
        let gnfa_accept = n + 1;
        let total = n + 2;

        let mut edges: Vec<Vec<Rx>> = vec![vec![Rx::Empty; total]; total];
        edges[gnfa_start][self.start as usize] = Rx::Eps;
        for state in 0..n {
            if self.accept[state] {
                edges[state][gnfa_accept] = Rx::Eps;
            }
            for to in 0..n as u32 {
                let class = self.edge_class(state, to);
                if !class.is_empty() {
                    edges[state][to as usize] = Rx::class(class);
                }
            }
        }

        for rip in 0..n {
            let self_loop = Rx::star(edges[rip][rip].clone());
            for from in 0..total {
                if from == rip || matches!(edges[from][rip], Rx::Empty) {
                    continue;
                }
                for to in 0..total {
                    if to == rip || matches!(edges[rip][to], Rx::Empty) {
                        continue;
                    }
                    let path = Rx::concat(
                        edges[from][rip].clone(),
                        Rx::concat(self_loop.clone(), edges[rip][to].clone()),
                    );
                    edges[from][to] = Rx::alt(edges[from][to].clone(), path);
                }
            }
            for other in 0..total {
                edges[rip][other] = Rx::Empty;
                edges[other][rip] = Rx::Empty;
            }
        }

        edges[gnfa_start][gnfa_accept].render()
    }
}

/// Regex expression used during GNFA elimination
#[derive(Debug, Clone)]
enum Rx {
    /// Matches nothing
    Empty,
    /// Matches the empty string
    Eps,
    Class(CharClass),
    Concat(Vec<Rx>),
    Alt(Vec<Rx>),
    Star(Box<Rx>),
}

impl Rx {
    fn class(class: CharClass) -> Rx {
        if class.is_empty() {
            Rx::Empty
        } else {
            Rx::Class(class)
        }
    }

    fn concat(a: Rx, b: Rx) -> Rx {
        match (a, b) {
            (Rx::Empty, _) | (_, Rx::Empty) => Rx::Empty,
            (Rx::Eps, x) | (x, Rx::Eps) => x,
            (Rx::Concat(mut xs), Rx::Concat(ys)) => {
                xs.extend(ys);
                Rx::Concat(xs)
            }
            (Rx::Concat(mut xs), y) => {
                xs.push(y);
                Rx::Concat(xs)
            }
            (x, Rx::Concat(mut ys)) => {
                ys.insert(0, x);
                Rx::Concat(ys)
            }
            (x, y) => Rx::Concat(vec![x, y]),
        }
    }

    fn alt(a: Rx, b: Rx) -> Rx {
        match (a, b) {
            (Rx::Empty, x) | (x, Rx::Empty) => x,
            (Rx::Eps, Rx::Eps) => Rx::Eps,
            // `ε | x*` is `x*`
            (Rx::Eps, Rx::Star(x)) | (Rx::Star(x), Rx::Eps) => Rx::Star(x),
            (Rx::Alt(mut xs), Rx::Alt(ys)) => {
                xs.extend(ys);
                Rx::Alt(xs)
            }
            (Rx::Alt(mut xs), y) => {
                xs.push(y);
                Rx::Alt(xs)
            }
            (x, Rx::Alt(mut ys)) => {
                ys.insert(0, x);
                Rx::Alt(ys)
            }
            (x, y) => Rx::Alt(vec![x, y]),
        }
    }

    fn star(a: Rx) -> Rx {
        match a {
            Rx::Empty | Rx::Eps => Rx::Eps,
            Rx::Star(x) => Rx::Star(x),
            x => Rx::Star(Box::new(x)),
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    /// Precedence: 0 = alternation context, 1 = concat context, 2 = atom
    fn render_into(&self, out: &mut String, precedence: u8) {
        match self {
            // No ECMA syntax matches nothing; the empty class is the
            // conventional spelling.
            Rx::Empty => out.push_str(r"[^\s\S]"),
            Rx::Eps => {}
            Rx::Class(class) => render_class(class, out),
            Rx::Concat(items) => {
                let group = precedence > 1;
                if group {
                    out.push_str("(?:");
                }
                for item in items {
                    item.render_into(out, 1);
                }
                if group {
                    out.push(')');
                }
            }
            Rx::Alt(items) => {
                let group = precedence > 0;
                if group {
                    out.push_str("(?:");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    item.render_into(out, 0);
                }
                if group {
                    out.push(')');
                }
            }
            Rx::Star(inner) => {
                inner.render_into(out, 2);
                out.push('*');
            }
        }
    }
}

fn render_class(class: &CharClass, out: &mut String) {
    if class == &CharClass::any() {
        out.push_str(r"[\s\S]");
        return;
    }
    if class == &CharClass::dot() {
        out.push('.');
        return;
    }
    if let [(lo, hi)] = class.ranges() {
        if lo == hi {
            if let Some(c) = char::from_u32(*lo) {
                escape_char(c, false, out);
                return;
            }
        }
    }
    // Prefer the negated spelling when it is smaller
    let negated = class.negate();
    let (body, negate) = if negated.ranges().len() < class.ranges().len() {
        (negated, true)
    } else {
        (class.clone(), false)
    };
    out.push('[');
    if negate {
        out.push('^');
    }
    for &(lo, hi) in body.ranges() {
        match (char::from_u32(lo), char::from_u32(hi)) {
            (Some(lo_c), Some(hi_c)) => {
                escape_char(lo_c, true, out);
                if hi > lo {
                    if hi - lo > 1 {
                        out.push('-');
                    }
                    escape_char(hi_c, true, out);
                }
            }
            _ => {
                // Range endpoints inside the surrogate gap cannot be spelled
                // as chars; fall back to explicit escapes.
                out.push_str(&format!(r"\u{{{lo:X}}}"));
                if hi > lo {
                    out.push('-');
                    out.push_str(&format!(r"\u{{{hi:X}}}"));
                }
            }
        }
    }
    out.push(']');
}

fn escape_char(c: char, in_class: bool, out: &mut String) {
    match c {
        '\n' => out.push_str(r"\n"),
        '\r' => out.push_str(r"\r"),
        '\t' => out.push_str(r"\t"),
        '\\' => out.push_str(r"\\"),
        '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
            if !in_class =>
        {
            out.push('\\');
            out.push(c);
        }
        ']' | '^' | '-' if in_class => {
            out.push('\\');
            out.push(c);
        }
        c if (c as u32) < 0x20 => {
            out.push_str(&format!(r"\u{{{:X}}}", c as u32));
        }
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn dfa(pattern: &str) -> Dfa {
        let ast = parser::parse(pattern).unwrap();
        let ast = parser::to_anchored(ast, pattern).unwrap();
        Dfa::from_nfa(&Nfa::compile(&ast))
    }

    #[test]
    fn test_matches_basic() {
        let d = dfa("^a(b|c)$");
        assert!(d.matches("ab"));
        assert!(d.matches("ac"));
        assert!(!d.matches("ad"));
        assert!(!d.matches("ab "));
    }

    #[test]
    fn test_unanchored_search_semantics() {
        let d = dfa("abc");
        assert!(d.matches("xxabcyy"));
        assert!(!d.matches("ab"));
    }

    #[test]
    fn test_language_equality() {
        assert!(dfa("^a(b|c)$").is_equivalent(&dfa("^a[bc]$")));
        assert!(!dfa("^a[bc]$").is_equivalent(&dfa("^a[bcd]$")));
    }

    #[test]
    fn test_subset() {
        assert!(dfa("^ab$").is_subset(&dfa("^a[a-z]$")));
        assert!(!dfa("^a[a-z]$").is_subset(&dfa("^ab$")));
        assert!(dfa("^a{2,3}$").is_subset(&dfa("^a+$")));
    }

    #[test]
    fn test_intersection_emptiness() {
        let digits = dfa(r"^\d+$");
        let letters = dfa("^[a-z]+$");
        assert!(digits.intersect(&letters).is_empty());
        assert!(!digits.intersect(&dfa("^1.*$")).is_empty());
    }

    #[test]
    fn test_complement() {
        let d = dfa("^a$");
        let c = d.complement();
        assert!(!c.matches("a"));
        assert!(c.matches("b"));
        assert!(c.matches(""));
        assert!(d.union(&c).is_universal());
    }

    #[test]
    fn test_minimize_shrinks() {
        // (a|b)(a|b) has an equivalent 3-live-state automaton
        let d = dfa("^(a|b)(a|b)$");
        assert!(d.state_count() <= 5);
    }

    #[test]
    fn test_to_pattern_roundtrip() {
        for source in ["^a(b|c)$", "^[a-z]{1,3}$", r"^\d+$", "^(foo|bar)*$"] {
            let original = dfa(source);
            let synthesized = original.to_pattern();
            let reparsed = dfa(&format!("^(?:{synthesized})$"));
            assert!(
                original.is_equivalent(&reparsed),
                "pattern {source} did not survive synthesis: {synthesized}"
            );
        }
    }

    #[test]
    fn test_to_pattern_empty_language() {
        let empty = dfa("^a$").intersect(&dfa("^b$"));
        assert!(empty.is_empty());
        let synthesized = empty.to_pattern();
        let reparsed = dfa(&format!("^(?:{synthesized})$"));
        assert!(reparsed.is_empty());
    }
}
