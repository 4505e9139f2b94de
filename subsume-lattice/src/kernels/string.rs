//! String kernel: length intervals and regular languages
//!
//! Lengths and languages are carried separately and checked separately,
//! except where both sides' constraints can be folded into one combined
//! language (length bounds small enough to express as bounded repetition);
//! then the check is a single exact containment.

use subsume_core::canonical::StrConstraint;
use subsume_pattern::{Pattern, REPEAT_LIMIT};

/// `x <: y` for string constraints
pub fn subtype(x: &StrConstraint, y: &StrConstraint) -> bool {
    // When both sides fold into one language, containment is exact and
    // subsumes both axis checks
    if let (Some(lx), Some(ly)) = (combined_language(x), combined_language(y)) {
        return lx.is_subset(&ly);
    }
    interval_subset(x, y) && pattern_subset(x, y)
}

/// Length interval inclusion
pub fn interval_subset(x: &StrConstraint, y: &StrConstraint) -> bool {
    if x.min_length < y.min_length {
        return false;
    }
    match (x.max_length, y.max_length) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a <= b,
    }
}

fn pattern_subset(x: &StrConstraint, y: &StrConstraint) -> bool {
    match (&x.pattern, &y.pattern) {
        (_, None) => true,
        (None, Some(q)) => q.is_universal(),
        (Some(p), Some(q)) => p.is_subset(q),
    }
}

/// The constraint's full language (pattern ∩ length bounds), when the
/// bounds are small enough to express as bounded repetition
pub fn combined_language(s: &StrConstraint) -> Option<Pattern> {
    let base = s
        .pattern
        .clone()
        .unwrap_or_else(Pattern::universal);
    if s.min_length == 0 && s.max_length.is_none() {
        return Some(base);
    }
    let limit = u64::from(REPEAT_LIMIT);
    if s.min_length > limit || s.max_length.is_some_and(|m| m > limit) {
        return None;
    }
    let length_source = match s.max_length {
        Some(max) => format!(r"^[\s\S]{{{},{}}}$", s.min_length, max),
        None => format!(r"^[\s\S]{{{},}}$", s.min_length),
    };
    let lengths = Pattern::parse(&length_source).ok()?;
    Some(base.intersect(&lengths))
}

/// The finite language of a set of literal strings
pub fn literal_language(literals: &[&str]) -> Pattern {
    Pattern::from_literals(literals.iter().copied())
}

/// Greatest lower bound: intersect intervals and languages
pub fn meet(x: &StrConstraint, y: &StrConstraint) -> StrConstraint {
    let pattern = match (&x.pattern, &y.pattern) {
        (Some(p), Some(q)) => Some(p.intersect(q)),
        (Some(p), None) | (None, Some(p)) => Some(p.clone()),
        (None, None) => None,
    };
    StrConstraint {
        min_length: x.min_length.max(y.min_length),
        max_length: match (x.max_length, y.max_length) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        },
        pattern,
    }
}

/// Least upper bound when one constraint expresses the union exactly:
/// equal lengths let the languages union; equal languages let contiguous
/// length intervals enclose. Returns `None` otherwise so the caller keeps
/// both atoms.
pub fn try_join(x: &StrConstraint, y: &StrConstraint) -> Option<StrConstraint> {
    if x.min_length == y.min_length && x.max_length == y.max_length {
        let pattern = match (&x.pattern, &y.pattern) {
            // Absent pattern is the universal language; the union stays
            // universal
            (None, _) | (_, None) => None,
            (Some(p), Some(q)) => Some(p.union(q)),
        };
        return Some(StrConstraint {
            min_length: x.min_length,
            max_length: x.max_length,
            pattern,
        });
    }

    let patterns_match = match (&x.pattern, &y.pattern) {
        (None, None) => true,
        (Some(p), Some(q)) => p.is_equivalent(q),
        _ => false,
    };
    if patterns_match && intervals_contiguous(x, y) {
        return Some(StrConstraint {
            min_length: x.min_length.min(y.min_length),
            max_length: match (x.max_length, y.max_length) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
            pattern: x.pattern.clone(),
        });
    }
    None
}

/// Two length intervals whose union is one interval (overlap or touch)
fn intervals_contiguous(x: &StrConstraint, y: &StrConstraint) -> bool {
    let no_gap = |low: &StrConstraint, high: &StrConstraint| match low.max_length {
        None => true,
        Some(max) => high.min_length <= max.saturating_add(1),
    };
    no_gap(x, y) && no_gap(y, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(min: u64, max: Option<u64>, pattern: Option<&str>) -> StrConstraint {
        StrConstraint {
            min_length: min,
            max_length: max,
            pattern: pattern.map(|p| Pattern::parse(p).unwrap()),
        }
    }

    #[test]
    fn test_interval_subtype() {
        assert!(subtype(
            &constraint(2, Some(5), None),
            &constraint(1, Some(10), None)
        ));
        assert!(!subtype(
            &constraint(0, Some(5), None),
            &constraint(1, Some(10), None)
        ));
        assert!(!subtype(&constraint(2, None, None), &constraint(0, Some(9), None)));
    }

    #[test]
    fn test_language_subtype() {
        assert!(subtype(
            &constraint(0, None, Some("^a(b|c)$")),
            &constraint(0, None, Some("^a[bc]$"))
        ));
        assert!(!subtype(
            &constraint(0, None, Some("^a[bcd]$")),
            &constraint(0, None, Some("^a[bc]$"))
        ));
    }

    #[test]
    fn test_combined_language_beats_axis_checks() {
        // All strings of a's with length exactly 2 form the language {aa},
        // which the wider pattern contains even though the bare intervals
        // do not nest
        let narrow = constraint(2, Some(2), Some("^a*$"));
        let wide = constraint(0, None, Some("^aa$"));
        assert!(subtype(&narrow, &wide));
    }

    #[test]
    fn test_meet() {
        let m = meet(
            &constraint(1, Some(8), Some("^[ab]+$")),
            &constraint(2, None, Some("^[bc]+$")),
        );
        assert_eq!(m.min_length, 2);
        assert_eq!(m.max_length, Some(8));
        let p = m.pattern.unwrap();
        assert!(p.matches("bb"));
        assert!(!p.matches("ab"));
    }

    #[test]
    fn test_join_equal_lengths_unions_languages() {
        let j = try_join(
            &constraint(1, Some(3), Some("^a+$")),
            &constraint(1, Some(3), Some("^b+$")),
        )
        .unwrap();
        let p = j.pattern.unwrap();
        assert!(p.matches("aa"));
        assert!(p.matches("bb"));
        assert!(!p.matches("ab"));
    }

    #[test]
    fn test_join_equal_patterns_encloses_contiguous_lengths() {
        let j = try_join(
            &constraint(0, Some(3), None),
            &constraint(4, Some(9), None),
        )
        .unwrap();
        assert_eq!(j.min_length, 0);
        assert_eq!(j.max_length, Some(9));

        // A hole between the intervals blocks the merge
        assert!(try_join(
            &constraint(0, Some(3), None),
            &constraint(5, Some(9), None),
        )
        .is_none());
    }

    #[test]
    fn test_join_incomparable_returns_none() {
        assert!(try_join(
            &constraint(0, Some(3), Some("^a+$")),
            &constraint(5, Some(9), Some("^b+$")),
        )
        .is_none());
    }
}
