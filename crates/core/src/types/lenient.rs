//! Lenient integer handling for inbound payloads.
//!
//! The order-management system sends quantities and weights as JSON numbers,
//! numeric strings, or strings with trailing units (`"250g"`). All of them are
//! reduced to their leading integer.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse the leading integer of `input`.
///
/// Leading whitespace and a single sign are accepted; parsing stops at the
/// first non-digit. Returns `None` when no digit is found or the value does
/// not fit in an `i64`.
///
/// ```rust
/// # use inflyshop_bridge_core::parse_int_prefix;
/// assert_eq!(parse_int_prefix(" 12 pcs"), Some(12));
/// assert_eq!(parse_int_prefix("1.5"), Some(1));
/// assert_eq!(parse_int_prefix("-3"), Some(-3));
/// assert_eq!(parse_int_prefix("abc"), None);
/// ```
#[must_use]
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = trimmed.strip_prefix('-').map_or_else(
        || (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        |rest| (true, rest),
    );

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest.get(..digits_len)?.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Serde adapter for optional integers sent as numbers or strings.
///
/// Use with `#[serde(default, deserialize_with = "lenient_int")]`.
///
/// # Errors
///
/// Returns an error only when the value is neither null, a number, nor a
/// string. Unparseable strings become `None`.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_i64().or_else(|| n.as_f64().and_then(truncate))),
        Some(Value::String(s)) => Ok(parse_int_prefix(&s)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer or numeric string, got {other}"
        ))),
    }
}

#[allow(clippy::cast_possible_truncation)] // Range is checked before the cast
fn truncate(value: f64) -> Option<i64> {
    #[allow(clippy::cast_precision_loss)]
    let in_range = value.is_finite() && value.abs() < i64::MAX as f64;
    in_range.then(|| value.trunc() as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_int")]
        quantity: Option<i64>,
    }

    fn quantity(json: &str) -> Option<i64> {
        serde_json::from_str::<Sample>(json).unwrap().quantity
    }

    #[test]
    fn test_parse_int_prefix_plain() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("+7"), Some(7));
    }

    #[test]
    fn test_parse_int_prefix_stops_at_non_digit() {
        assert_eq!(parse_int_prefix("250g"), Some(250));
        assert_eq!(parse_int_prefix("0.9"), Some(0));
    }

    #[test]
    fn test_parse_int_prefix_rejects_garbage() {
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("kg5"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), None);
    }

    #[test]
    fn test_lenient_int_accepts_numbers_and_strings() {
        assert_eq!(quantity(r#"{"quantity": 5}"#), Some(5));
        assert_eq!(quantity(r#"{"quantity": "5"}"#), Some(5));
        assert_eq!(quantity(r#"{"quantity": 2.75}"#), Some(2));
        assert_eq!(quantity(r#"{"quantity": null}"#), None);
        assert_eq!(quantity("{}"), None);
    }

    #[test]
    fn test_lenient_int_rejects_objects() {
        assert!(serde_json::from_str::<Sample>(r#"{"quantity": {"n": 1}}"#).is_err());
    }
}
