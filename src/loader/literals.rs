//! Numeric grammar shared by the normalizer and the bit-range parser. Documents
//! accept decimal and `0x`-prefixed hexadecimal in every numeric position, with `_`
//! separators; canonical output is hexadecimal.

use serde_yaml::Value;

/// Parses a non-negative integer literal. Returns `None` for anything else.
pub(crate) fn parse_int(text: &str) -> Option<u128> {
    let cleaned = text.trim().replace('_', "");
    if cleaned.starts_with('-') {
        return None;
    }
    let (radix, digits) = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(stripped) => (16, stripped),
        None => (10, cleaned.as_str()),
    };
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, radix).ok()
}

/// Parses a byte-size literal: a plain integer or one with a `K`/`M`/`G` suffix.
pub(crate) fn parse_size(text: &str) -> Option<u128> {
    let trimmed = text.trim();
    let (body, multiplier) = match trimmed.chars().last()? {
        'k' | 'K' => (&trimmed[..trimmed.len() - 1], 1u128 << 10),
        'm' | 'M' => (&trimmed[..trimmed.len() - 1], 1u128 << 20),
        'g' | 'G' => (&trimmed[..trimmed.len() - 1], 1u128 << 30),
        _ => (trimmed, 1),
    };
    parse_int(body)?.checked_mul(multiplier)
}

/// Bridges a YAML scalar to the numeric grammar: native unsigned integers pass
/// through, strings go through [`parse_int`].
pub(crate) fn value_to_int(value: &Value) -> Option<u128> {
    match value {
        Value::Number(num) => num.as_u64().map(u128::from),
        Value::String(text) => parse_int(text),
        _ => None,
    }
}

/// Like [`value_to_int`] but honoring size suffixes on strings.
pub(crate) fn value_to_size(value: &Value) -> Option<u128> {
    match value {
        Value::Number(num) => num.as_u64().map(u128::from),
        Value::String(text) => parse_size(text),
        _ => None,
    }
}

/// Canonical rendering for addresses, offsets, and reset values.
pub(crate) fn format_hex(value: u128) -> String {
    format!("0x{value:X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x10"), Some(16));
        assert_eq!(parse_int("0XFF"), Some(255));
        assert_eq!(parse_int("1_000"), Some(1000));
    }

    #[test]
    fn rejects_negative_and_empty() {
        assert_eq!(parse_int("-1"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("abc"), None);
    }

    #[test]
    fn size_suffixes_scale_bytes() {
        assert_eq!(parse_size("4K"), Some(4096));
        assert_eq!(parse_size("1M"), Some(1 << 20));
        assert_eq!(parse_size("0x10"), Some(16));
        assert_eq!(parse_size("256"), Some(256));
    }

    #[test]
    fn bridges_yaml_scalars() {
        assert_eq!(value_to_int(&Value::from(7u64)), Some(7));
        assert_eq!(value_to_int(&Value::from("0x20")), Some(32));
        assert_eq!(value_to_int(&Value::from(true)), None);
        assert_eq!(value_to_size(&Value::from("64K")), Some(65536));
    }

    #[test]
    fn hex_rendering_is_uppercase() {
        assert_eq!(format_hex(0xdead), "0xDEAD");
        assert_eq!(format_hex(0), "0x0");
    }
}
