use std::{error::Error, fmt};

pub type MapResult<T> = Result<T, MapError>;

/// Represents any failure that can occur while parsing, validating, or editing a
/// register-map document. All variants are recoverable; a rejected edit leaves the
/// document text untouched.
#[derive(Debug)]
pub enum MapError {
    MalformedBitRange {
        text: String,
    },
    UnknownAccess {
        text: String,
    },
    FieldOverlap {
        candidate: String,
        existing: String,
    },
    ValueOutOfRange {
        value: u128,
        max: u128,
    },
    NoSpace {
        width: u32,
    },
    InvalidIdentifier {
        name: String,
        reason: &'static str,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    DocumentParse {
        message: String,
    },
    PathNotFound {
        path: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::MalformedBitRange { text } => {
                write!(f, "malformed bit range '{text}'")
            }
            MapError::UnknownAccess { text } => {
                write!(f, "unknown access kind '{text}'")
            }
            MapError::FieldOverlap {
                candidate,
                existing,
            } => write!(f, "field '{candidate}' overlaps existing field '{existing}'"),
            MapError::ValueOutOfRange { value, max } => write!(
                f,
                "value 0x{value:X} exceeds maximum 0x{max:X} for the field width"
            ),
            MapError::NoSpace { width } => {
                write!(f, "no free run of {width} bit(s) left in the register")
            }
            MapError::InvalidIdentifier { name, reason } => {
                write!(f, "invalid identifier '{name}': {reason}")
            }
            MapError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            MapError::DocumentParse { message } => {
                write!(f, "document parse error: {message}")
            }
            MapError::PathNotFound { path } => {
                write!(f, "path '{path}' does not resolve in the document")
            }
        }
    }
}

impl Error for MapError {}

impl From<serde_yaml::Error> for MapError {
    fn from(err: serde_yaml::Error) -> Self {
        MapError::DocumentParse {
            message: err.to_string(),
        }
    }
}
