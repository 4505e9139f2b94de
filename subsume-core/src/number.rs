//! Exact rational arithmetic over JSON numbers
//!
//! All endpoint and `multipleOf` reasoning uses `BigRational` so that
//! divisibility and interval questions have exact answers. JSON floats
//! convert exactly through their binary mantissa/exponent decomposition;
//! there are no epsilon comparisons anywhere in the lattice.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Convert a JSON number to an exact rational
pub fn rational_from_number(n: &serde_json::Number) -> Option<BigRational> {
    if let Some(i) = n.as_i64() {
        return Some(BigRational::from_integer(BigInt::from(i)));
    }
    if let Some(u) = n.as_u64() {
        return Some(BigRational::from_integer(BigInt::from(u)));
    }
    rational_from_f64(n.as_f64()?)
}

/// Convert a finite f64 to the exact rational it represents
pub fn rational_from_f64(f: f64) -> Option<BigRational> {
    if !f.is_finite() {
        return None;
    }
    if f == 0.0 {
        return Some(BigRational::zero());
    }
    let bits = f.to_bits();
    let negative = bits >> 63 == 1;
    let raw_exponent = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & 0x000f_ffff_ffff_ffff;
    let (mantissa, exponent) = if raw_exponent == 0 {
        (fraction, -1074i64)
    } else {
        (fraction | 0x0010_0000_0000_0000, raw_exponent - 1075)
    };

    let mut numerator = BigInt::from(mantissa);
    let mut denominator = BigInt::one();
    if exponent >= 0 {
        numerator <<= exponent as usize;
    } else {
        denominator <<= (-exponent) as usize;
    }
    if negative {
        numerator = -numerator;
    }
    Some(BigRational::new(numerator, denominator))
}

/// Convert a rational back to a JSON number.
///
/// Integers that fit go out as i64/u64; everything else falls back to the
/// nearest f64, which is only used for serialization, never comparison.
pub fn number_from_rational(q: &BigRational) -> serde_json::Number {
    if q.is_integer() {
        let int = q.to_integer();
        if let Some(i) = int.to_i64() {
            return serde_json::Number::from(i);
        }
        if let Some(u) = int.to_u64() {
            return serde_json::Number::from(u);
        }
    }
    let approx = q.to_f64().unwrap_or(0.0);
    serde_json::Number::from_f64(approx).unwrap_or_else(|| serde_json::Number::from(0))
}

/// True when `candidate` is an integer multiple of `step`
pub fn divides(step: &BigRational, candidate: &BigRational) -> bool {
    if step.is_zero() {
        return candidate.is_zero();
    }
    (candidate / step).is_integer()
}

/// Rational gcd: the largest step both arguments are multiples of.
///
/// For `a/b` and `c/d` in lowest terms this is `gcd(a,c)/lcm(b,d)`.
pub fn rational_gcd(x: &BigRational, y: &BigRational) -> BigRational {
    if x.is_zero() {
        return y.abs();
    }
    if y.is_zero() {
        return x.abs();
    }
    let numer = x.numer().gcd(y.numer());
    let denom = x.denom().lcm(y.denom());
    BigRational::new(numer, denom)
}

/// Rational lcm: the smallest positive step that is a multiple of both.
///
/// For `a/b` and `c/d` in lowest terms this is `lcm(a,c)/gcd(b,d)`.
pub fn rational_lcm(x: &BigRational, y: &BigRational) -> BigRational {
    let numer = x.numer().lcm(y.numer());
    let denom = x.denom().gcd(y.denom());
    BigRational::new(numer, denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_exact_float_conversion() {
        assert_eq!(rational_from_f64(0.5).unwrap(), rat(1, 2));
        assert_eq!(rational_from_f64(-2.25).unwrap(), rat(-9, 4));
        assert_eq!(rational_from_f64(3.0).unwrap(), rat(3, 1));
        // 0.1 is not exactly representable; the conversion is exact for
        // the f64 that "0.1" denotes
        let tenth = rational_from_f64(0.1).unwrap();
        assert_ne!(tenth, rat(1, 10));
        assert_eq!(tenth.to_f64().unwrap(), 0.1);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(rational_from_f64(f64::NAN).is_none());
        assert!(rational_from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_number_roundtrip() {
        let n = serde_json::Number::from(42);
        let q = rational_from_number(&n).unwrap();
        assert_eq!(number_from_rational(&q), n);
    }

    #[test]
    fn test_divides() {
        assert!(divides(&rat(1, 2), &rat(3, 2)));
        assert!(divides(&rat(3, 1), &rat(12, 1)));
        assert!(!divides(&rat(2, 1), &rat(3, 1)));
        // 0.25 divides 0.75 but not 0.8
        assert!(divides(&rat(1, 4), &rat(3, 4)));
        assert!(!divides(&rat(1, 4), &rat(4, 5)));
    }

    #[test]
    fn test_rational_gcd_lcm() {
        assert_eq!(rational_gcd(&rat(1, 2), &rat(1, 3)), rat(1, 6));
        assert_eq!(rational_lcm(&rat(1, 2), &rat(1, 3)), rat(1, 1));
        assert_eq!(rational_lcm(&rat(2, 1), &rat(3, 1)), rat(6, 1));
        assert_eq!(rational_gcd(&rat(4, 1), &rat(6, 1)), rat(2, 1));
    }
}
