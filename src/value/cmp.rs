use std::cmp::Ordering;

use crate::Value;

/// Compares two values for sorting.
///
/// Arrays are compared element by element, the first difference decides and
/// otherwise the shorter array sorts first. Other values use loose equality
/// and relational comparison with `undefined` and `null` sorting before any
/// defined value.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    if let (Value::Array(x), Value::Array(y)) = (a, b) {
        for (x, y) in x.iter().zip(y) {
            match compare(x, y) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        return x.len().cmp(&y.len());
    }
    if loose_eq(a, b) {
        Ordering::Equal
    } else if a.is_nullish() || less_than(a, b) {
        Ordering::Less
    } else if b.is_nullish() || less_than(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Loose equality (`==`).
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (Undefined | Null, Undefined | Null) => true,
        (Undefined | Null, _) | (_, Undefined | Null) => false,
        (Bool(x), Bool(y)) => x == y,
        (Number(x), Number(y)) => x == y,
        (String(x), String(y)) => x == y,
        (Bool(_), _) => loose_eq(&Number(a.to_number()), b),
        (_, Bool(_)) => loose_eq(a, &Number(b.to_number())),
        (Number(x), String(_)) => *x == b.to_number(),
        (String(_), Number(y)) => a.to_number() == *y,
        (Array(_) | Object(_) | Function(_), Array(_) | Object(_) | Function(_)) => a == b,
        (Array(_) | Object(_) | Function(_), _) => loose_eq(&String(a.to_string()), b),
        (_, Array(_) | Object(_) | Function(_)) => loose_eq(a, &String(b.to_string())),
    }
}

/// Relational comparison (`<`).
fn less_than(a: &Value, b: &Value) -> bool {
    let a = to_primitive(a);
    let b = to_primitive(b);
    match (&a, &b) {
        (Value::String(x), Value::String(y)) => x < y,
        _ => a.to_number() < b.to_number(),
    }
}

fn to_primitive(v: &Value) -> Value {
    if v.is_primitive() {
        v.clone()
    } else {
        Value::String(v.to_string())
    }
}
