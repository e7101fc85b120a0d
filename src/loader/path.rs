//! Positional-path access into the raw document tree. Paths are the wire shape the
//! collaborators speak: a list of string keys and integer indices.

use smallvec::SmallVec;
use serde_yaml::{Mapping, Value};

use crate::error::{MapError, MapResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    Key(String),
    Index(usize),
}

pub type Path = SmallVec<[PathSeg; 8]>;

/// Parses the wire shape `list<string|int>` into segments.
pub fn parse_path(raw: &[Value]) -> MapResult<Path> {
    let mut path = Path::new();
    for value in raw {
        match value {
            Value::String(key) => path.push(PathSeg::Key(key.clone())),
            Value::Number(num) => {
                let index = num
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| MapError::PathNotFound {
                        path: format!("{num} is not a valid index"),
                    })?;
                path.push(PathSeg::Index(index));
            }
            other => {
                return Err(MapError::PathNotFound {
                    path: format!("unsupported path segment {other:?}"),
                });
            }
        }
    }
    Ok(path)
}

pub fn path_to_string(path: &[PathSeg]) -> String {
    let mut out = String::new();
    for seg in path {
        if !out.is_empty() {
            out.push('.');
        }
        match seg {
            PathSeg::Key(key) => out.push_str(key),
            PathSeg::Index(index) => out.push_str(&index.to_string()),
        }
    }
    out
}

fn not_found(path: &[PathSeg]) -> MapError {
    MapError::PathNotFound {
        path: path_to_string(path),
    }
}

pub fn get_path<'a>(root: &'a Value, path: &[PathSeg]) -> MapResult<&'a Value> {
    let mut current = root;
    for seg in path {
        current = match seg {
            PathSeg::Key(key) => current.get(key.as_str()),
            PathSeg::Index(index) => current.get(*index),
        }
        .ok_or_else(|| not_found(path))?;
    }
    Ok(current)
}

pub fn get_path_mut<'a>(root: &'a mut Value, path: &[PathSeg]) -> MapResult<&'a mut Value> {
    let mut current = root;
    for seg in path {
        current = match seg {
            PathSeg::Key(key) => current.get_mut(key.as_str()),
            PathSeg::Index(index) => current.get_mut(*index),
        }
        .ok_or_else(|| not_found(path))?;
    }
    Ok(current)
}

/// Assigns `new` at `path`, creating intermediate containers where a segment does not
/// resolve yet: a key segment materializes a mapping, an index segment may append one
/// element past the end of a sequence.
pub fn set_path(root: &mut Value, path: &[PathSeg], new: Value) -> MapResult<()> {
    let Some((last, parents)) = path.split_last() else {
        *root = new;
        return Ok(());
    };
    let mut current = root;
    for seg in parents {
        current = descend_or_create(current, seg, path)?;
    }
    match last {
        PathSeg::Key(key) => {
            let mapping = as_mapping_or_create(current, path)?;
            mapping.insert(Value::String(key.clone()), new);
        }
        PathSeg::Index(index) => {
            let sequence = as_sequence_or_create(current, path)?;
            if *index < sequence.len() {
                sequence[*index] = new;
            } else if *index == sequence.len() {
                sequence.push(new);
            } else {
                return Err(not_found(path));
            }
        }
    }
    Ok(())
}

/// Removes the final segment: a key is deleted from its mapping, a sequence index
/// removes the element itself, shifting later entries down.
pub fn delete_path(root: &mut Value, path: &[PathSeg]) -> MapResult<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(not_found(path));
    };
    let parent = get_path_mut(root, parents).map_err(|_| not_found(path))?;
    match last {
        PathSeg::Key(key) => {
            let removed = parent
                .as_mapping_mut()
                .and_then(|mapping| mapping.remove(key.as_str()));
            if removed.is_none() {
                return Err(not_found(path));
            }
        }
        PathSeg::Index(index) => {
            let sequence = parent.as_sequence_mut().ok_or_else(|| not_found(path))?;
            if *index >= sequence.len() {
                return Err(not_found(path));
            }
            sequence.remove(*index);
        }
    }
    Ok(())
}

fn descend_or_create<'a>(
    current: &'a mut Value,
    seg: &PathSeg,
    full: &[PathSeg],
) -> MapResult<&'a mut Value> {
    match seg {
        PathSeg::Key(key) => {
            let mapping = as_mapping_or_create(current, full)?;
            if !mapping.contains_key(key.as_str()) {
                mapping.insert(Value::String(key.clone()), Value::Null);
            }
            Ok(mapping.get_mut(key.as_str()).unwrap())
        }
        PathSeg::Index(index) => {
            let sequence = as_sequence_or_create(current, full)?;
            if *index == sequence.len() {
                sequence.push(Value::Null);
            }
            sequence.get_mut(*index).ok_or_else(|| not_found(full))
        }
    }
}

// A Null slot may be specialized into either container kind; anything else keeps its
// shape and mismatched segments fail.
fn as_mapping_or_create<'a>(value: &'a mut Value, full: &[PathSeg]) -> MapResult<&'a mut Mapping> {
    if value.is_null() {
        *value = Value::Mapping(Mapping::new());
    }
    value.as_mapping_mut().ok_or_else(|| not_found(full))
}

fn as_sequence_or_create<'a>(
    value: &'a mut Value,
    full: &[PathSeg],
) -> MapResult<&'a mut Vec<Value>> {
    if value.is_null() {
        *value = Value::Sequence(Vec::new());
    }
    value.as_sequence_mut().ok_or_else(|| not_found(full))
}
