//! Bit-level codec for register values. Values are plain `u128`, wide enough for any
//! register width the normalizer accepts, so no operation here can lose precision.

use crate::error::{MapError, MapResult};

/// Widest register the model supports, in bits.
pub const MAX_WIDTH: u32 = 128;

#[inline]
pub(crate) fn mask_bits(width: u32) -> u128 {
    if width >= MAX_WIDTH {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Returns the bit at `index` as 0 or 1.
pub fn bit_at(value: u128, index: u32) -> u8 {
    if index >= MAX_WIDTH {
        return 0;
    }
    ((value >> index) & 1) as u8
}

/// Returns `value` with the bit at `index` forced to `desired`. Unchanged when the bit
/// already matches.
pub fn set_bit(value: u128, index: u32, desired: u8) -> u128 {
    if index >= MAX_WIDTH {
        return value;
    }
    if desired == 0 {
        value & !(1u128 << index)
    } else {
        value | (1u128 << index)
    }
}

/// Extracts the `width`-bit unsigned slice starting at bit `lo`.
pub fn extract(value: u128, lo: u32, width: u32) -> u128 {
    if width == 0 || lo >= MAX_WIDTH {
        return 0;
    }
    (value >> lo) & mask_bits(width)
}

/// Largest value representable in `width` bits.
pub fn max_for_width(width: u32) -> u128 {
    mask_bits(width)
}

/// Checks that `value` fits in `width` bits.
pub fn validate(value: u128, width: u32) -> MapResult<()> {
    let max = max_for_width(width);
    if value > max {
        return Err(MapError::ValueOutOfRange { value, max });
    }
    Ok(())
}
