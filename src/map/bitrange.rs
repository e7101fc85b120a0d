//! Inclusive `[hi:lo]` bit-range notation used by field declarations.

use std::fmt;

use crate::error::{MapError, MapResult};
use crate::loader::literals::parse_int;

/// A field's span inside a register value: LSB offset plus width in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub offset: u32,
    pub width: u32,
}

impl BitRange {
    pub fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    /// Highest bit position covered, inclusive.
    pub fn hi(&self) -> u32 {
        self.offset + self.width - 1
    }

    /// Parses `"[hi:lo]"`, `"[n]"`, `"hi:lo"`, or `"n"`, with optional surrounding
    /// whitespace. Reversed bounds are tolerated and swapped.
    pub fn parse(text: &str) -> MapResult<Self> {
        let malformed = || MapError::MalformedBitRange {
            text: text.to_string(),
        };
        let mut inner = text.trim();
        if let Some(stripped) = inner.strip_prefix('[') {
            inner = stripped.strip_suffix(']').ok_or_else(malformed)?;
        }
        let inner = inner.trim();
        if inner.is_empty() {
            return Err(malformed());
        }
        let (hi, lo) = match inner.split_once(':') {
            Some((a, b)) => {
                let a = parse_int(a.trim()).ok_or_else(malformed)?;
                let b = parse_int(b.trim()).ok_or_else(malformed)?;
                (a.max(b), a.min(b))
            }
            None => {
                let bit = parse_int(inner).ok_or_else(malformed)?;
                (bit, bit)
            }
        };
        // Bit positions are bounded by the widest supported register, so the width
        // arithmetic below cannot overflow.
        if hi >= u128::from(crate::map::value::MAX_WIDTH) {
            return Err(malformed());
        }
        let hi = hi as u32;
        let lo = lo as u32;
        Ok(Self {
            offset: lo,
            width: hi - lo + 1,
        })
    }
}

impl fmt::Display for BitRange {
    // Canonical form is always "[hi:lo]", including single-bit ranges, so formatting
    // already-canonical data is idempotent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.hi(), self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_pair() {
        assert_eq!(BitRange::parse("[7:4]").unwrap(), BitRange::new(4, 4));
    }

    #[test]
    fn parses_bare_forms() {
        assert_eq!(BitRange::parse("7:4").unwrap(), BitRange::new(4, 4));
        assert_eq!(BitRange::parse("[3]").unwrap(), BitRange::new(3, 1));
        assert_eq!(BitRange::parse("3").unwrap(), BitRange::new(3, 1));
        assert_eq!(BitRange::parse("  [ 5 : 2 ] ").unwrap(), BitRange::new(2, 4));
    }

    #[test]
    fn swaps_reversed_bounds() {
        assert_eq!(
            BitRange::parse("[4:7]").unwrap(),
            BitRange::new(4, 4),
            "lo:hi order normalizes to the same range"
        );
    }

    #[test]
    fn accepts_hex_bounds() {
        assert_eq!(BitRange::parse("[0x1F:0x10]").unwrap(), BitRange::new(16, 16));
    }

    #[test]
    fn rejects_bit_positions_beyond_supported_width() {
        assert_eq!(BitRange::parse("[127:0]").unwrap(), BitRange::new(0, 128));
        for bad in ["[128:0]", "[4294967295:0]", "[340282366920938463463374607431768211455:0]"] {
            assert!(
                matches!(BitRange::parse(bad), Err(MapError::MalformedBitRange { .. })),
                "'{bad}' must be rejected, not wrap or panic"
            );
        }
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "  ", "[", "[]", "[a:b]", "[-1:0]", "[1:0", "1:"] {
            assert!(
                BitRange::parse(bad).is_err(),
                "'{bad}' should be a malformed bit range"
            );
        }
    }

    #[test]
    fn format_is_canonical_and_round_trips() {
        assert_eq!(BitRange::new(4, 4).to_string(), "[7:4]");
        assert_eq!(BitRange::new(3, 1).to_string(), "[3:3]", "single-bit keeps pair form");
        for (offset, width) in [(0, 1), (0, 32), (5, 3), (31, 1), (64, 64)] {
            let range = BitRange::new(offset, width);
            assert_eq!(
                BitRange::parse(&range.to_string()).unwrap(),
                range,
                "round trip for offset={offset} width={width}"
            );
        }
    }
}
