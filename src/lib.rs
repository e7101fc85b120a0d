//! regmap edits declarative descriptions of memory-mapped register layouts: a
//! document of address blocks, registers, register arrays, and bit fields is loaded
//! into a canonical model, validated, mutated field by field, and re-serialized
//! without drift. The raw text is the source of truth; every edit re-derives the
//! model from a fresh parse.

pub mod error;
pub mod loader;
pub mod map;

pub use error::{MapError, MapResult};
pub use loader::{NormalizeOptions, Session};
pub use map::{AddressBlock, BitField, BitRange, MemoryMap, Register, RegisterArray, RegisterNode};
