//! Document side of the crate: raw-tree parsing, normalization into the canonical
//! model, canonical serialization, path-addressed mutation, and the editing session.

pub(crate) mod literals;
pub mod normalize;
pub mod path;
pub mod serialize;
pub mod session;

pub use normalize::{NormalizeOptions, normalize, normalize_with, parse_document};
pub use path::{Path, PathSeg, delete_path, get_path, parse_path, set_path};
pub use serialize::{dump, to_tree};
pub use session::{NodeKey, Session};
