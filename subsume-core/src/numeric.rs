//! Numeric-interval engine
//!
//! Represents an Integer/Number constraint as an interval with open/closed
//! endpoints, an optional `multipleOf` step, and an integrality bit, and
//! answers subtype/meet/join/emptiness questions about it exactly.
//!
//! Normalization tightens endpoints onto the admissible grid whenever a step
//! is present (`multipleOf` and/or integrality), which turns open endpoints
//! into closed ones and makes the later interval comparisons exact.

use crate::number::{divides, rational_lcm};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;

/// One interval endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub value: BigRational,
    pub exclusive: bool,
}

impl Bound {
    /// An inclusive endpoint
    pub fn inclusive(value: BigRational) -> Bound {
        Bound {
            value,
            exclusive: false,
        }
    }

    /// An exclusive endpoint
    pub fn exclusive(value: BigRational) -> Bound {
        Bound {
            value,
            exclusive: true,
        }
    }
}

/// A numeric constraint: interval, step, integrality
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NumConstraint {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub multiple_of: Option<BigRational>,
    pub integral: bool,
}

impl NumConstraint {
    /// The unconstrained number (or integer) domain
    pub fn unconstrained(integral: bool) -> NumConstraint {
        NumConstraint {
            integral,
            ..NumConstraint::default()
        }
    }

    /// The admissible-value grid step, when one exists.
    ///
    /// `integral` alone contributes step 1; combined with `multipleOf m`
    /// the step is `lcm(m, 1)` (the coarsest grid inside both).
    pub fn step(&self) -> Option<BigRational> {
        let one = BigRational::from_integer(BigInt::one());
        match (&self.multiple_of, self.integral) {
            (None, false) => None,
            (None, true) => Some(one),
            (Some(m), false) => Some(m.clone()),
            (Some(m), true) => Some(rational_lcm(m, &one)),
        }
    }

    /// Tighten endpoints onto the admissible grid.
    ///
    /// With a step, both endpoints land on multiples of it and become
    /// inclusive; without one the constraint is returned unchanged.
    pub fn normalized(&self) -> NumConstraint {
        let Some(step) = self.step() else {
            return self.clone();
        };
        let mut out = self.clone();
        if let Some(min) = &self.min {
            let mut aligned = (&min.value / &step).ceil() * &step;
            if min.exclusive && aligned == min.value {
                aligned += &step;
            }
            out.min = Some(Bound::inclusive(aligned));
        }
        if let Some(max) = &self.max {
            let mut aligned = (&max.value / &step).floor() * &step;
            if max.exclusive && aligned == max.value {
                aligned -= &step;
            }
            out.max = Some(Bound::inclusive(aligned));
        }
        out
    }

    /// Point membership
    pub fn accepts(&self, x: &BigRational) -> bool {
        if let Some(min) = &self.min {
            if x < &min.value || (x == &min.value && min.exclusive) {
                return false;
            }
        }
        if let Some(max) = &self.max {
            if x > &max.value || (x == &max.value && max.exclusive) {
                return false;
            }
        }
        match self.step() {
            Some(step) => divides(&step, x),
            None => true,
        }
    }

    /// True when no number satisfies the constraint
    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        match (&n.min, &n.max) {
            (Some(lo), Some(hi)) => {
                lo.value > hi.value
                    || (lo.value == hi.value && (lo.exclusive || hi.exclusive))
            }
            _ => false,
        }
    }

    /// The single admissible value, if the constraint pins one down
    pub fn singleton(&self) -> Option<BigRational> {
        let n = self.normalized();
        let (lo, hi) = (n.min.as_ref()?, n.max.as_ref()?);
        if lo.value == hi.value && !lo.exclusive && !hi.exclusive {
            Some(lo.value.clone())
        } else {
            None
        }
    }

    /// `self <: other`: every admissible value of `self` is admissible
    /// under `other`
    pub fn is_subtype_of(&self, other: &NumConstraint) -> bool {
        let a = self.normalized();
        let b = other.normalized();

        if a.is_empty() {
            return true;
        }
        if let Some(point) = a.singleton() {
            return b.accepts(&point);
        }

        // Interval inclusion with open/closed endpoints
        if let Some(bm) = &b.min {
            match &a.min {
                None => return false,
                Some(am) => {
                    let ok = am.value > bm.value
                        || (am.value == bm.value && (!bm.exclusive || am.exclusive));
                    if !ok {
                        return false;
                    }
                }
            }
        }
        if let Some(bm) = &b.max {
            match &a.max {
                None => return false,
                Some(am) => {
                    let ok = am.value < bm.value
                        || (am.value == bm.value && (!bm.exclusive || am.exclusive));
                    if !ok {
                        return false;
                    }
                }
            }
        }

        // multipleOf: the coarser grid must divide the finer one.
        // Two or more admissible points force divisibility; the single-point
        // case was handled above.
        if let Some(m) = &b.multiple_of {
            match a.step() {
                Some(step) if divides(m, &step) => {}
                _ => return false,
            }
        }

        // Integrality: Integer <: Number, never the reverse. A grid of
        // integer step also implies integrality.
        if b.integral {
            let a_integral = a.integral || a.step().is_some_and(|s| s.is_integer());
            if !a_integral {
                return false;
            }
        }

        true
    }

    /// Greatest lower bound: intersect intervals, lcm the steps, OR
    /// integrality
    pub fn meet(&self, other: &NumConstraint) -> NumConstraint {
        let min = match (&self.min, &other.min) {
            (Some(a), Some(b)) => Some(tighter_min(a, b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let max = match (&self.max, &other.max) {
            (Some(a), Some(b)) => Some(tighter_max(a, b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let multiple_of = match (&self.multiple_of, &other.multiple_of) {
            (Some(a), Some(b)) => Some(rational_lcm(a, b)),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        NumConstraint {
            min,
            max,
            multiple_of,
            integral: self.integral || other.integral,
        }
        .normalized()
    }

    /// Least upper bound, when a single constraint expresses it exactly.
    ///
    /// Returns `None` when the union is not one constraint (a gap between
    /// the intervals, or incompatible grids); the caller then keeps both
    /// atoms in the disjunction instead of over-approximating.
    pub fn join(&self, other: &NumConstraint) -> Option<NumConstraint> {
        let a = self.normalized();
        let b = other.normalized();

        if a.is_subtype_of(&b) {
            return Some(b);
        }
        if b.is_subtype_of(&a) {
            return Some(a);
        }
        if a.multiple_of != b.multiple_of || a.integral != b.integral {
            return None;
        }
        if !a.contiguous_with(&b) {
            return None;
        }

        let min = match (&a.min, &b.min) {
            (Some(x), Some(y)) => Some(looser_min(x, y).clone()),
            _ => None,
        };
        let max = match (&a.max, &b.max) {
            (Some(x), Some(y)) => Some(looser_max(x, y).clone()),
            _ => None,
        };
        Some(NumConstraint {
            min,
            max,
            multiple_of: a.multiple_of.clone(),
            integral: a.integral,
        })
    }

    /// True when the union of the two (normalized) constraints has no gap,
    /// so the enclosing interval adds no new values
    fn contiguous_with(&self, other: &NumConstraint) -> bool {
        !gap_between(self, other) && !gap_between(other, self)
    }
}

/// Is there a gap between `low`'s upper end and `high`'s lower end?
fn gap_between(low: &NumConstraint, high: &NumConstraint) -> bool {
    let (Some(hi), Some(lo)) = (&low.max, &high.min) else {
        return false;
    };
    if hi.value < lo.value {
        // On a shared grid, consecutive admissible points are one step
        // apart; a difference of exactly one step leaves no hole.
        if let Some(step) = low.step() {
            return &lo.value - &hi.value > step;
        }
        return true;
    }
    hi.value == lo.value && hi.exclusive && lo.exclusive
}

fn tighter_min<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    if a.value > b.value || (a.value == b.value && a.exclusive) {
        a
    } else {
        b
    }
}

fn tighter_max<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    if a.value < b.value || (a.value == b.value && a.exclusive) {
        a
    } else {
        b
    }
}

fn looser_min<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    if a.value < b.value || (a.value == b.value && !a.exclusive) {
        a
    } else {
        b
    }
}

fn looser_max<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    if a.value > b.value || (a.value == b.value && !a.exclusive) {
        a
    } else {
        b
    }
}
