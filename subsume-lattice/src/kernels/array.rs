//! Array kernel: item counts, uniqueness, and element shapes
//!
//! The case split follows the two item shapes: a single schema applied at
//! every position, or a positional prefix with an `additional` schema for
//! the tail. Positions the left side can never populate (at or beyond its
//! `maxItems`) are vacuous and skipped.

use crate::driver::{Merger, Subtyper};
use subsume_core::canonical::{ArrayConstraint, Items, SchemaId};
use subsume_core::decision::Decision;
use subsume_core::error::Result;

/// The schema governing position `i` under an item shape
fn slot(items: &Items, i: usize) -> SchemaId {
    match items {
        Items::Uniform(id) => *id,
        Items::Tuple { prefix, rest } => prefix.get(i).copied().unwrap_or(*rest),
    }
}

/// The schema governing every position beyond both prefixes
fn tail(items: &Items) -> SchemaId {
    match items {
        Items::Uniform(id) => *id,
        Items::Tuple { rest, .. } => *rest,
    }
}

fn prefix_len(items: &Items) -> usize {
    match items {
        Items::Uniform(_) => 0,
        Items::Tuple { prefix, .. } => prefix.len(),
    }
}

impl<'g, 'r> Subtyper<'g, 'r> {
    /// `x <: y` for array constraints
    pub(crate) fn array_subtype(
        &mut self,
        x: &ArrayConstraint,
        y: &ArrayConstraint,
    ) -> Result<Decision> {
        // uniqueItems: the right side demanding uniqueness forces it on
        // the left
        if y.unique && !x.unique {
            return Ok(Decision::No);
        }
        if x.min_items < y.min_items {
            return Ok(Decision::No);
        }
        match (x.max_items, y.max_items) {
            (None, Some(_)) => return Ok(Decision::No),
            (Some(a), Some(b)) if a > b => return Ok(Decision::No),
            _ => {}
        }

        let mut verdict = Decision::Yes;
        let positions = prefix_len(&x.items).max(prefix_len(&y.items));
        for i in 0..positions {
            // Positions the left side cannot reach are vacuous
            if x.max_items.is_some_and(|max| (i as u64) >= max) {
                break;
            }
            let d = self.subtype_nodes(slot(&x.items, i), slot(&y.items, i))?;
            verdict = verdict.and(d);
            if verdict == Decision::No {
                return Ok(Decision::No);
            }
        }
        // The shared tail, when the left side can grow past both prefixes
        let past_prefixes = match x.max_items {
            Some(max) => max > positions as u64,
            None => true,
        };
        if past_prefixes {
            let d = self.subtype_nodes(tail(&x.items), tail(&y.items))?;
            verdict = verdict.and(d);
        }
        Ok(verdict)
    }
}

impl<'g, 'r> Merger<'g, 'r> {
    /// Greatest lower bound of two array constraints
    pub(crate) fn array_meet(
        &mut self,
        x: &ArrayConstraint,
        y: &ArrayConstraint,
    ) -> ArrayConstraint {
        let min_items = x.min_items.max(y.min_items);
        let max_items = match (x.max_items, y.max_items) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
        let items = match (&x.items, &y.items) {
            (Items::Uniform(a), Items::Uniform(b)) => {
                Items::Uniform(self.meet_nodes(*a, *b))
            }
            _ => {
                let positions = prefix_len(&x.items).max(prefix_len(&y.items));
                let prefix = (0..positions)
                    .map(|i| self.meet_nodes(slot(&x.items, i), slot(&y.items, i)))
                    .collect();
                let rest = self.meet_nodes(tail(&x.items), tail(&y.items));
                Items::Tuple { prefix, rest }
            }
        };
        ArrayConstraint {
            min_items,
            max_items,
            unique: x.unique || y.unique,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subsume_core::canonical::{Atom, Disjunction, SchemaGraph};
    use subsume_core::numeric::NumConstraint;
    use subsume_core::types::BaseType;
    use subsume_semantic::NullResolver;

    fn setup() -> (SchemaGraph, SchemaId, SchemaId, SchemaId) {
        let mut graph = SchemaGraph::new();
        let integer = graph.add(Disjunction::of(Atom::numeric(
            BaseType::Integer,
            NumConstraint::unconstrained(true),
        )));
        let number = graph.add(Disjunction::of(Atom::numeric(
            BaseType::Number,
            NumConstraint::unconstrained(false),
        )));
        let top = graph.top();
        (graph, integer, number, top)
    }

    fn uniform(items: SchemaId, min: u64, max: Option<u64>, unique: bool) -> ArrayConstraint {
        ArrayConstraint {
            min_items: min,
            max_items: max,
            unique,
            items: Items::Uniform(items),
        }
    }

    #[test]
    fn test_uniform_subtype() {
        let (graph, integer, number, _) = setup();
        let resolver = NullResolver::new();
        let mut checker = Subtyper::new(&graph, &resolver);

        let narrow = uniform(integer, 2, Some(5), false);
        let wide = uniform(number, 0, None, false);
        assert_eq!(
            checker.array_subtype(&narrow, &wide).unwrap(),
            Decision::Yes
        );
        assert_eq!(
            checker.array_subtype(&wide, &narrow).unwrap(),
            Decision::No
        );
    }

    #[test]
    fn test_unique_direction() {
        let (graph, integer, _, _) = setup();
        let resolver = NullResolver::new();
        let mut checker = Subtyper::new(&graph, &resolver);

        let unique = uniform(integer, 0, None, true);
        let plain = uniform(integer, 0, None, false);
        // unique arrays are a subset of plain arrays
        assert_eq!(checker.array_subtype(&unique, &plain).unwrap(), Decision::Yes);
        assert_eq!(checker.array_subtype(&plain, &unique).unwrap(), Decision::No);
    }

    #[test]
    fn test_tuple_vs_uniform() {
        let (mut graph, integer, number, _) = setup();
        let bottom = graph.bottom();
        let resolver = NullResolver::new();
        let mut checker = Subtyper::new(&graph, &resolver);

        // (integer, integer) with no extra items <: uniform number array
        let tuple = ArrayConstraint {
            min_items: 0,
            max_items: Some(2),
            unique: false,
            items: Items::Tuple {
                prefix: vec![integer, integer],
                rest: bottom,
            },
        };
        let wide = uniform(number, 0, None, false);
        assert_eq!(checker.array_subtype(&tuple, &wide).unwrap(), Decision::Yes);
    }

    #[test]
    fn test_tuple_vs_tuple_alignment() {
        let (graph, integer, number, top) = setup();
        let resolver = NullResolver::new();
        let mut checker = Subtyper::new(&graph, &resolver);

        let narrow = ArrayConstraint {
            min_items: 0,
            max_items: None,
            unique: false,
            items: Items::Tuple {
                prefix: vec![integer, integer],
                rest: integer,
            },
        };
        let wide = ArrayConstraint {
            min_items: 0,
            max_items: None,
            unique: false,
            items: Items::Tuple {
                prefix: vec![number],
                rest: top,
            },
        };
        assert_eq!(checker.array_subtype(&narrow, &wide).unwrap(), Decision::Yes);
        assert_eq!(checker.array_subtype(&wide, &narrow).unwrap(), Decision::No);
    }

    #[test]
    fn test_meet_tightens() {
        let (mut graph, integer, number, _) = setup();
        let resolver = NullResolver::new();
        let mut merger = Merger::new(&mut graph, &resolver);

        let a = uniform(integer, 1, None, false);
        let b = uniform(number, 0, Some(4), true);
        let met = merger.array_meet(&a, &b);
        assert_eq!(met.min_items, 1);
        assert_eq!(met.max_items, Some(4));
        assert!(met.unique);
    }
}
