//! A single bit field and its per-field validation rules.

use std::fmt;

use crate::error::{MapError, MapResult};
use crate::map::value;

/// Hardware access semantics of a field or register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    #[default]
    ReadWrite,
    WriteOneToClear,
    ReadWriteOneToClear,
}

impl Access {
    /// Accepts the canonical long spellings and the conventional short synonyms.
    /// Unknown strings are an error, never coerced.
    pub fn parse(text: &str) -> MapResult<Self> {
        match text.trim() {
            "read-only" | "ro" => Ok(Access::ReadOnly),
            "write-only" | "wo" => Ok(Access::WriteOnly),
            "read-write" | "rw" => Ok(Access::ReadWrite),
            "write-1-to-clear" | "w1c" => Ok(Access::WriteOneToClear),
            "read-write-1-to-clear" | "rw1c" => Ok(Access::ReadWriteOneToClear),
            other => Err(MapError::UnknownAccess {
                text: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Access::ReadOnly => "read-only",
            Access::WriteOnly => "write-only",
            Access::ReadWrite => "read-write",
            Access::WriteOneToClear => "write-1-to-clear",
            Access::ReadWriteOneToClear => "read-write-1-to-clear",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks a register or field name against the hardware-identifier grammar:
/// a leading letter, then letters and digits, with single underscores as interior
/// separators.
pub fn validate_identifier(name: &str) -> MapResult<()> {
    let invalid = |reason: &'static str| MapError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    };
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("name is empty")),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(invalid("must start with a letter"));
        }
        Some(_) => {}
    }
    let mut prev_underscore = false;
    for ch in chars {
        if ch == '_' {
            if prev_underscore {
                return Err(invalid("consecutive underscores"));
            }
            prev_underscore = true;
        } else if ch.is_ascii_alphanumeric() {
            prev_underscore = false;
        } else {
            return Err(invalid("only letters, digits, and underscores are allowed"));
        }
    }
    if prev_underscore {
        return Err(invalid("trailing underscore"));
    }
    Ok(())
}

/// One bit field inside a register. `bit_offset` is the 0-based LSB position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    pub name: String,
    pub bit_offset: u32,
    pub bit_width: u32,
    pub access: Access,
    pub reset_value: Option<u128>,
    pub description: String,
}

impl BitField {
    pub fn new(name: impl Into<String>, bit_offset: u32, bit_width: u32) -> Self {
        Self {
            name: name.into(),
            bit_offset,
            bit_width,
            access: Access::default(),
            reset_value: None,
            description: String::new(),
        }
    }

    /// Exclusive upper bound of the field's interval. Computed in `u64` so corrupt
    /// offset/width pairs near `u32::MAX` report cleanly instead of wrapping.
    pub fn end(&self) -> u64 {
        u64::from(self.bit_offset) + u64::from(self.bit_width)
    }

    pub fn overlaps(&self, other: &BitField) -> bool {
        u64::from(self.bit_offset) < other.end() && u64::from(other.bit_offset) < self.end()
    }

    /// Validates the field in isolation against its owning register's bit width.
    pub fn validate(&self, register_width: u32) -> MapResult<()> {
        validate_identifier(&self.name)?;
        if self.bit_width == 0 {
            return Err(MapError::InvalidIdentifier {
                name: self.name.clone(),
                reason: "field width must be at least 1 bit",
            });
        }
        if self.end() > u64::from(register_width) {
            return Err(MapError::ValueOutOfRange {
                value: u128::from(self.end()),
                max: u128::from(register_width),
            });
        }
        if let Some(reset) = self.reset_value {
            value::validate(reset, self.bit_width)?;
        }
        Ok(())
    }
}
