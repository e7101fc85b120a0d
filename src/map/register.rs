//! A fixed-width register and its field-packing algorithms: overlap/gap diagnostics,
//! free-space search, sequential repacking, and reset-value aggregation.

use smallvec::SmallVec;

use crate::error::{MapError, MapResult};
use crate::map::field::{Access, BitField};

/// Non-destructive layout finding reported by [`Register::detect_overlaps_and_gaps`].
/// Positions are inclusive bit bounds, for presentation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    /// `field` collides with the bits below its offset, up to `hi`.
    Overlap { field: String, lo: u64, hi: u64 },
    /// Unclaimed bits between two fields.
    Gap { lo: u64, hi: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    /// Byte offset from the owning block or array template base.
    pub address_offset: u64,
    /// Bit width of the register value.
    pub width: u32,
    pub access: Access,
    pub description: String,
    /// Field order is insertion order, not necessarily offset order.
    pub fields: Vec<BitField>,
}

pub const DEFAULT_REGISTER_WIDTH: u32 = 32;

impl Register {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address_offset: 0,
            width: DEFAULT_REGISTER_WIDTH,
            access: Access::default(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// Register span in whole bytes.
    pub fn byte_width(&self) -> u64 {
        u64::from(self.width.div_ceil(8))
    }

    /// Fields ordered by ascending bit offset. List order itself is left untouched.
    pub fn sorted_fields(&self) -> Vec<&BitField> {
        let mut sorted: Vec<&BitField> = self.fields.iter().collect();
        sorted.sort_by_key(|field| field.bit_offset);
        sorted
    }

    /// Checks that `candidate` fits the register span and intersects no other field.
    /// `exclude` skips one list position when re-validating a field in place.
    pub fn validate_field_fits(
        &self,
        candidate: &BitField,
        exclude: Option<usize>,
    ) -> MapResult<()> {
        if candidate.end() > u64::from(self.width) {
            return Err(MapError::ValueOutOfRange {
                value: u128::from(candidate.end()),
                max: u128::from(self.width),
            });
        }
        for (index, existing) in self.fields.iter().enumerate() {
            if Some(index) == exclude {
                continue;
            }
            if candidate.overlaps(existing) {
                return Err(MapError::FieldOverlap {
                    candidate: candidate.name.clone(),
                    existing: existing.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Lowest bit offset where a `width`-bit run is free of every existing field.
    pub fn find_available_space(&self, width: u32) -> MapResult<u32> {
        if width >= 1 && width <= self.width {
            // u64 arithmetic: field intervals are untrusted and may sit near u32::MAX.
            let wide = u64::from(width);
            let mut offset = 0u64;
            'scan: while offset + wide <= u64::from(self.width) {
                for field in &self.fields {
                    if offset < field.end() && u64::from(field.bit_offset) < offset + wide {
                        // Collision: resume just past the blocking field.
                        offset = field.end();
                        continue 'scan;
                    }
                }
                return Ok(offset as u32);
            }
        }
        Err(MapError::NoSpace { width })
    }

    /// Destructively repacks every field contiguously in current list order: the first
    /// field lands at bit 0, each next one immediately after. Gaps and original
    /// positions are not preserved. Widths are clamped to `[1, register width]` first.
    pub fn recalculate_offsets(&mut self) {
        let register_width = self.width;
        let mut cursor = 0u32;
        for field in &mut self.fields {
            field.bit_width = field.bit_width.clamp(1, register_width);
            field.bit_offset = cursor;
            cursor += field.bit_width;
        }
    }

    /// Advisory scan over the offset-sorted fields: reports a gap wherever unclaimed
    /// bits precede a field, an overlap wherever a field starts below the end of the
    /// one before it. Never mutates the layout.
    pub fn detect_overlaps_and_gaps(&self) -> SmallVec<[LayoutIssue; 4]> {
        let mut issues = SmallVec::new();
        let mut cursor = 0u64;
        for field in self.sorted_fields() {
            let offset = u64::from(field.bit_offset);
            if offset > cursor {
                issues.push(LayoutIssue::Gap {
                    lo: cursor,
                    hi: offset - 1,
                });
            } else if offset < cursor {
                issues.push(LayoutIssue::Overlap {
                    field: field.name.clone(),
                    lo: offset,
                    hi: cursor - 1,
                });
            }
            cursor = cursor.max(field.end());
        }
        issues
    }

    /// Swaps the field at `index` with its neighbor at `index + delta`, then repacks.
    /// Consumers always observe a contiguous layout after a move.
    pub fn move_field(&mut self, index: usize, delta: isize) -> MapResult<()> {
        let len = self.fields.len();
        let target = index
            .checked_add_signed(delta)
            .filter(|&t| t < len && index < len)
            .ok_or(MapError::IndexOutOfRange { index, len })?;
        self.fields.swap(index, target);
        self.recalculate_offsets();
        Ok(())
    }

    /// Whole-register reset value: the OR of each field's reset shifted to its offset.
    /// Fields without a reset contribute nothing.
    pub fn reset_value(&self) -> u128 {
        self.fields.iter().fold(0u128, |acc, field| {
            acc | (field.reset_value.unwrap_or(0) << field.bit_offset)
        })
    }
}
