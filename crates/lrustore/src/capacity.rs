//! Capacity normalization
//!
//! Capacities may arrive loosely typed: integers, floats, strings, JSON
//! values or nothing at all. Every input is reduced to an unsigned 32-bit
//! count the same way:
//!
//! - truncate toward zero, then reduce modulo 2^32
//! - NaN, infinities, negative and non-numeric input are invalid
//! - strings are trimmed; the empty string counts as `0`; `0x`, `0o` and
//!   `0b` prefixes select a radix, anything else must be a decimal literal
//!
//! Invalid input is never rejected. [`normalize_capacity`] clamps it to `1`,
//! [`initial_capacity`] falls back to [`DEFAULT_CAPACITY`].

use serde_json::Value;

/// Capacity used when a store is built without a usable capacity
pub const DEFAULT_CAPACITY: u32 = 3;

/// Smallest capacity a store can have
pub const MIN_CAPACITY: u32 = 1;

const U32_RANGE: f64 = 4_294_967_296.0;

const RADIX_PREFIXES: [(&str, u32); 6] = [
    ("0x", 16),
    ("0X", 16),
    ("0o", 8),
    ("0O", 8),
    ("0b", 2),
    ("0B", 2),
];

/// Conversion of a loosely typed value into a capacity count
pub trait IntoCapacity {
    /// Convert to an unsigned 32-bit count, or `None` if the input is invalid
    fn to_capacity_count(&self) -> Option<u32>;
}

/// Normalize a capacity for `set_capacity`: invalid or zero clamps to 1
pub fn normalize_capacity<C: IntoCapacity>(input: C) -> u32 {
    input
        .to_capacity_count()
        .filter(|&count| count >= MIN_CAPACITY)
        .unwrap_or(MIN_CAPACITY)
}

/// Normalize a capacity given at construction: invalid or zero falls back
/// to [`DEFAULT_CAPACITY`]
pub fn initial_capacity<C: IntoCapacity>(input: C) -> u32 {
    input
        .to_capacity_count()
        .filter(|&count| count >= MIN_CAPACITY)
        .unwrap_or(DEFAULT_CAPACITY)
}

fn count_from_f64(n: f64) -> Option<u32> {
    if !n.is_finite() {
        return None;
    }
    let truncated = n.trunc();
    if truncated < 0.0 {
        return None;
    }
    Some((truncated % U32_RANGE) as u32)
}

fn count_from_str(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0);
    }

    for (prefix, radix) in RADIX_PREFIXES {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.starts_with(['+', '-']) {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|n| n as u32);
        }
    }

    // f64::from_str also takes "inf" and "nan"; those are invalid here anyway
    let numeric = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !numeric {
        return None;
    }
    s.parse::<f64>().ok().and_then(count_from_f64)
}

macro_rules! unsigned_capacity {
    ($($ty:ty),*) => {
        $(
            impl IntoCapacity for $ty {
                fn to_capacity_count(&self) -> Option<u32> {
                    Some(*self as u64 as u32)
                }
            }
        )*
    };
}

macro_rules! signed_capacity {
    ($($ty:ty),*) => {
        $(
            impl IntoCapacity for $ty {
                fn to_capacity_count(&self) -> Option<u32> {
                    if *self < 0 {
                        None
                    } else {
                        Some(*self as u64 as u32)
                    }
                }
            }
        )*
    };
}

unsigned_capacity!(u8, u16, u32, u64, usize);
signed_capacity!(i8, i16, i32, i64, isize);

impl IntoCapacity for f64 {
    fn to_capacity_count(&self) -> Option<u32> {
        count_from_f64(*self)
    }
}

impl IntoCapacity for f32 {
    fn to_capacity_count(&self) -> Option<u32> {
        count_from_f64(f64::from(*self))
    }
}

impl IntoCapacity for bool {
    fn to_capacity_count(&self) -> Option<u32> {
        Some(u32::from(*self))
    }
}

impl IntoCapacity for str {
    fn to_capacity_count(&self) -> Option<u32> {
        count_from_str(self)
    }
}

impl IntoCapacity for String {
    fn to_capacity_count(&self) -> Option<u32> {
        count_from_str(self)
    }
}

impl<T: IntoCapacity> IntoCapacity for Option<T> {
    fn to_capacity_count(&self) -> Option<u32> {
        self.as_ref().and_then(|inner| inner.to_capacity_count())
    }
}

impl<T: IntoCapacity + ?Sized> IntoCapacity for &T {
    fn to_capacity_count(&self) -> Option<u32> {
        (**self).to_capacity_count()
    }
}

impl IntoCapacity for Value {
    fn to_capacity_count(&self) -> Option<u32> {
        match self {
            Value::Null => None,
            Value::Bool(b) => b.to_capacity_count(),
            Value::Number(n) => n
                .as_u64()
                .map(|n| n as u32)
                .or_else(|| n.as_f64().and_then(count_from_f64)),
            Value::String(s) => count_from_str(s),
            // Arrays convert through their string form: "" or the lone element
            Value::Array(items) => match items.as_slice() {
                [] | [Value::Null] => Some(0),
                [item @ (Value::Number(_) | Value::String(_) | Value::Array(_))] => {
                    item.to_capacity_count()
                }
                _ => None,
            },
            Value::Object(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_capacity(5), 5);
        assert_eq!(normalize_capacity(0), 1);
        assert_eq!(normalize_capacity("17"), 17);
        assert_eq!(normalize_capacity(3.6), 3);
        assert_eq!(normalize_capacity(None::<u32>), 1);
        assert_eq!(normalize_capacity(f64::NAN), 1);
        assert_eq!(normalize_capacity(f64::INFINITY), 1);
        assert_eq!(normalize_capacity(f64::NEG_INFINITY), 1);
    }

    #[test]
    fn test_normalize_negative() {
        assert_eq!(normalize_capacity(-1), 1);
        assert_eq!(normalize_capacity(-7.9), 1);
        assert_eq!(normalize_capacity("-12"), 1);
        assert_eq!(normalize_capacity(-0.5), 1);
    }

    #[test]
    fn test_normalize_strings() {
        assert_eq!(normalize_capacity("  42  "), 42);
        assert_eq!(normalize_capacity("8.99"), 8);
        assert_eq!(normalize_capacity("1e2"), 100);
        assert_eq!(normalize_capacity("0x10"), 16);
        assert_eq!(normalize_capacity("0b101"), 5);
        assert_eq!(normalize_capacity("0o17"), 15);
        assert_eq!(normalize_capacity(""), 1);
        assert_eq!(normalize_capacity("abc"), 1);
        assert_eq!(normalize_capacity("12abc"), 1);
        assert_eq!(normalize_capacity("Infinity"), 1);
        assert_eq!(normalize_capacity("inf"), 1);
        assert_eq!(normalize_capacity("0x"), 1);
        assert_eq!(normalize_capacity(String::from("9")), 9);
    }

    #[test]
    fn test_normalize_wraps_32_bits() {
        assert_eq!(normalize_capacity(u32::MAX), u32::MAX);
        assert_eq!(normalize_capacity(4_294_967_296u64 + 5), 5);
        assert_eq!(normalize_capacity(4_294_967_296.0), 1);
        assert_eq!(normalize_capacity(4_294_967_303.7), 7);
    }

    #[test]
    fn test_normalize_bool() {
        assert_eq!(normalize_capacity(true), 1);
        assert_eq!(normalize_capacity(false), 1);
    }

    #[test]
    fn test_normalize_json() {
        assert_eq!(normalize_capacity(json!(null)), 1);
        assert_eq!(normalize_capacity(json!(12)), 12);
        assert_eq!(normalize_capacity(json!(-12)), 1);
        assert_eq!(normalize_capacity(json!(3.6)), 3);
        assert_eq!(normalize_capacity(json!("17")), 17);
        assert_eq!(normalize_capacity(json!([])), 1);
        assert_eq!(normalize_capacity(json!([6])), 6);
        assert_eq!(normalize_capacity(json!(["6"])), 6);
        assert_eq!(normalize_capacity(json!([[6]])), 6);
        assert_eq!(normalize_capacity(json!([6, 7])), 1);
        assert_eq!(normalize_capacity(json!([true])), 1);
        assert_eq!(normalize_capacity(json!({ "capacity": 6 })), 1);
    }

    #[test]
    fn test_initial_capacity() {
        assert_eq!(initial_capacity(10), 10);
        assert_eq!(initial_capacity(0), DEFAULT_CAPACITY);
        assert_eq!(initial_capacity(None::<i32>), DEFAULT_CAPACITY);
        assert_eq!(initial_capacity(f64::NAN), DEFAULT_CAPACITY);
        assert_eq!(initial_capacity(-4), DEFAULT_CAPACITY);
        assert_eq!(initial_capacity(0.5), DEFAULT_CAPACITY);
        assert_eq!(initial_capacity("4"), 4);
    }
}
