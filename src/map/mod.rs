//! Canonical register-map model: bit ranges, wide values, fields, registers,
//! arrays, address blocks, and the containing memory map.

pub mod array;
pub mod bitrange;
pub mod block;
pub mod field;
pub mod memory_map;
pub mod register;
pub mod value;

pub use array::RegisterArray;
pub use bitrange::BitRange;
pub use block::{AddressBlock, RegisterNode};
pub use field::{Access, BitField, validate_identifier};
pub use memory_map::MemoryMap;
pub use register::{DEFAULT_REGISTER_WIDTH, LayoutIssue, Register};
