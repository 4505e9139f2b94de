//! JSON value helpers: typing, mathematical equality, stable hashing

use crate::number::rational_from_number;
use crate::types::BaseType;
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// The base type a JSON value inhabits.
///
/// Draft-04 typing: a number written without a fractional part
/// (i64/u64 in serde terms) is an `Integer`, floats are `Number`.
pub fn base_type_of(value: &Value) -> BaseType {
    match value {
        Value::Null => BaseType::Null,
        Value::Bool(_) => BaseType::Boolean,
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                BaseType::Integer
            } else {
                BaseType::Number
            }
        }
        Value::String(_) => BaseType::String,
        Value::Array(_) => BaseType::Array,
        Value::Object(_) => BaseType::Object,
    }
}

/// Mathematical JSON equality: numbers compare by value (`1 == 1.0`),
/// containers recursively
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            match (rational_from_number(x), rational_from_number(y)) {
                (Some(qx), Some(qy)) => qx == qy,
                _ => x == y,
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Membership test under mathematical equality
pub fn json_contains(values: &[Value], candidate: &Value) -> bool {
    values.iter().any(|v| json_eq(v, candidate))
}

/// Feed a value into a hasher, consistent with [`json_eq`]
pub fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(b) => {
            state.write_u8(1);
            b.hash(state);
        }
        Value::Number(n) => {
            state.write_u8(2);
            match rational_from_number(n) {
                Some(q) => q.hash(state),
                None => n.to_string().hash(state),
            }
        }
        Value::String(s) => {
            state.write_u8(3);
            s.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(entries) => {
            state.write_u8(5);
            state.write_usize(entries.len());
            // serde_json's map iterates in sorted key order, so this is
            // deterministic and order-independent.
            for (key, item) in entries {
                key.hash(state);
                hash_value(item, state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHasher;
    use serde_json::json;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = FxHasher::default();
        hash_value(value, &mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_base_type_of_numbers() {
        assert_eq!(base_type_of(&json!(1)), BaseType::Integer);
        assert_eq!(base_type_of(&json!(-3)), BaseType::Integer);
        assert_eq!(base_type_of(&json!(1.5)), BaseType::Number);
    }

    #[test]
    fn test_numeric_equality() {
        assert!(json_eq(&json!(1), &json!(1.0)));
        assert!(!json_eq(&json!(1), &json!(1.5)));
        assert!(json_eq(&json!([1, 2.0]), &json!([1.0, 2])));
    }

    #[test]
    fn test_object_equality_order_independent() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert!(json_eq(&a, &b));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        assert_eq!(hash_of(&json!(1)), hash_of(&json!(1.0)));
        assert_eq!(
            hash_of(&json!({"x": 1, "y": [2]})),
            hash_of(&json!({"y": [2], "x": 1}))
        );
        assert_ne!(hash_of(&json!("1")), hash_of(&json!(1)));
    }

    #[test]
    fn test_contains() {
        let values = vec![json!("a"), json!(2)];
        assert!(json_contains(&values, &json!(2.0)));
        assert!(!json_contains(&values, &json!("b")));
    }
}
