//! A register template replicated at a fixed byte stride.

use crate::error::{MapError, MapResult};
use crate::map::register::Register;

/// `count` copies of `template`, the n-th living at `address_offset + n * stride`
/// bytes from the owning block base. Every element shares the template's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterArray {
    pub name: String,
    pub address_offset: u64,
    pub count: u32,
    pub stride: u32,
    pub template: Register,
}

impl RegisterArray {
    pub fn element_offset(&self, n: u32) -> u64 {
        self.address_offset
            .saturating_add(u64::from(n) * u64::from(self.stride))
    }

    /// Total bytes claimed by the array.
    pub fn byte_span(&self) -> u64 {
        u64::from(self.count) * u64::from(self.stride)
    }

    pub fn validate(&self) -> MapResult<()> {
        if self.count < 1 {
            return Err(MapError::DocumentParse {
                message: format!("array '{}' must have count >= 1", self.name),
            });
        }
        if self.stride < 1 {
            return Err(MapError::DocumentParse {
                message: format!("array '{}' must have stride >= 1", self.name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_addresses_step_by_stride() {
        let array = RegisterArray {
            name: "chan".into(),
            address_offset: 0x10,
            count: 4,
            stride: 8,
            template: Register::new("chan"),
        };
        assert_eq!(array.element_offset(0), 0x10);
        assert_eq!(array.element_offset(3), 0x28);
        assert_eq!(array.byte_span(), 32);
    }

    #[test]
    fn degenerate_shapes_fail_validation() {
        let mut array = RegisterArray {
            name: "x".into(),
            address_offset: 0,
            count: 0,
            stride: 4,
            template: Register::new("x"),
        };
        assert!(array.validate().is_err(), "count 0 invalid");
        array.count = 1;
        array.stride = 0;
        assert!(array.validate().is_err(), "stride 0 invalid");
        array.stride = 4;
        assert!(array.validate().is_ok());
    }
}
