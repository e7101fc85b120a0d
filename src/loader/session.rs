//! Single-owner editing session over one register-map document. The raw text is the
//! only authoritative state; every mutation is one atomic pipeline (parse the current
//! text, mutate an ephemeral tree, validate, re-serialize, publish) so no edit can
//! observe another's half-applied state and no rejected edit leaves a trace.

use ahash::AHashMap;
use serde_yaml::Value;

use crate::error::{MapError, MapResult};
use crate::loader::normalize::{NormalizeOptions, normalize_register, normalize_with, parse_document};
use crate::loader::path::{PathSeg, delete_path, get_path_mut, parse_path, path_to_string, set_path};
use crate::map::bitrange::BitRange;
use crate::map::block::RegisterNode;
use crate::map::memory_map::MemoryMap;

/// Stable in-session identity for a selected node. Documents address nodes by
/// position, so a structural edit shifts raw indices; the key remembers the named
/// chain and re-resolves after every reload, falling back to the remembered index
/// only when the name is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub block: String,
    pub block_index: usize,
    pub register: Option<String>,
    pub register_index: Option<usize>,
    pub field: Option<String>,
    pub field_index: Option<usize>,
}

pub struct Session {
    text: String,
    options: NormalizeOptions,
    selection: Option<NodeKey>,
}

impl Session {
    pub fn open(text: impl Into<String>) -> MapResult<Self> {
        Self::open_with(text, NormalizeOptions::default())
    }

    pub fn open_with(text: impl Into<String>, options: NormalizeOptions) -> MapResult<Self> {
        let text = text.into();
        normalize_with(&parse_document(&text)?, &options)?;
        Ok(Self {
            text,
            options,
            selection: None,
        })
    }

    /// Current authoritative document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Re-derives the canonical model from the authoritative text.
    pub fn model(&self) -> MapResult<MemoryMap> {
        normalize_with(&parse_document(&self.text)?, &self.options)
    }

    /// Fresh parse of the raw tree.
    pub fn tree(&self) -> MapResult<Value> {
        parse_document(&self.text)
    }

    /// Wire entry point: `(['__op', opname], payload)` routes to a structural
    /// operation, anything else is a leaf assignment.
    pub fn apply(&mut self, raw_path: &[Value], payload: Value) -> MapResult<()> {
        if raw_path.first().and_then(Value::as_str) == Some("__op") {
            let opname = raw_path
                .get(1)
                .and_then(Value::as_str)
                .ok_or_else(|| MapError::PathNotFound {
                    path: "__op without an operation name".into(),
                })?;
            return self.apply_op(opname, &payload);
        }
        let path = parse_path(raw_path)?;
        self.set_value(&path, payload)
    }

    /// Assigns a leaf value. The fully mutated tree is validated before anything is
    /// committed; on error the previous text is retained untouched.
    pub fn set_value(&mut self, path: &[PathSeg], value: Value) -> MapResult<()> {
        let mut tree = self.tree()?;
        set_path(&mut tree, path, value)?;
        self.commit(tree)
    }

    /// Deletes the node at `path` (a sequence element is removed, not nulled).
    pub fn delete_value(&mut self, path: &[PathSeg]) -> MapResult<()> {
        let mut tree = self.tree()?;
        delete_path(&mut tree, path)?;
        self.commit(tree)
    }

    /// Inserts a new single-bit field after `after_index` (or at position 0), at the
    /// lowest free bit offset, read-write, reset 0. Returns the generated name.
    pub fn field_add(
        &mut self,
        register_path: &[PathSeg],
        after_index: Option<usize>,
    ) -> MapResult<String> {
        let mut tree = self.tree()?;
        let register = {
            let mapping = register_mapping(&mut tree, register_path)?;
            normalize_register(mapping, &self.options)?
        };
        let offset = register.find_available_space(1)?;

        let mut n = register.fields.len();
        let name = loop {
            let candidate = format!("field{n}");
            if !register.fields.iter().any(|field| field.name == candidate) {
                break candidate;
            }
            n += 1;
        };

        let mut entry = serde_yaml::Mapping::new();
        entry.insert("name".into(), name.clone().into());
        entry.insert("bits".into(), BitRange::new(offset, 1).to_string().into());
        entry.insert("access".into(), "read-write".into());
        entry.insert("reset_value".into(), 0u64.into());

        let fields = fields_sequence(&mut tree, register_path)?;
        let position = after_index.map(|index| index + 1).unwrap_or(0).min(fields.len());
        fields.insert(position, Value::Mapping(entry));
        self.commit(tree)?;
        Ok(name)
    }

    /// Removes the field at `index`. Remaining field offsets are left untouched.
    pub fn field_delete(&mut self, register_path: &[PathSeg], index: usize) -> MapResult<()> {
        let mut tree = self.tree()?;
        let fields = fields_sequence(&mut tree, register_path)?;
        if index >= fields.len() {
            return Err(MapError::IndexOutOfRange {
                index,
                len: fields.len(),
            });
        }
        fields.remove(index);
        self.commit(tree)
    }

    /// Swaps the field at `index` with its neighbor at `index + delta`, then repacks
    /// the whole register contiguously from bit 0. One pipeline pass: the swap and the
    /// repack land in the same committed text.
    pub fn field_move(
        &mut self,
        register_path: &[PathSeg],
        index: usize,
        delta: isize,
    ) -> MapResult<()> {
        let mut tree = self.tree()?;
        let mut register = {
            let mapping = register_mapping(&mut tree, register_path)?;
            normalize_register(mapping, &self.options)?
        };
        register.move_field(index, delta)?;

        // Mirror the move onto the raw entries, then stamp the repacked ranges onto
        // them so the raw tree and the model agree.
        let fields = fields_sequence(&mut tree, register_path)?;
        let target = index.checked_add_signed(delta).expect("validated by move_field");
        fields.swap(index, target);
        for (entry, field) in fields.iter_mut().zip(&register.fields) {
            let mapping = entry.as_mapping_mut().ok_or_else(|| MapError::DocumentParse {
                message: "field entry must be a mapping".into(),
            })?;
            mapping.insert(
                "bits".into(),
                BitRange::new(field.bit_offset, field.bit_width).to_string().into(),
            );
            mapping.remove("bit_offset");
            mapping.remove("bit_width");
        }
        self.commit(tree)
    }

    /// External change notification: the snapshot is replaced wholesale and any
    /// in-flight selection is invalidated. An unparsable replacement is rejected and
    /// the last known-good text retained.
    pub fn replace_text(&mut self, new_text: impl Into<String>) -> MapResult<()> {
        let new_text = new_text.into();
        normalize_with(&parse_document(&new_text)?, &self.options)?;
        log::debug!("document replaced externally ({} bytes)", new_text.len());
        self.text = new_text;
        self.selection = None;
        Ok(())
    }

    pub fn select(&mut self, key: NodeKey) {
        self.selection = Some(key);
    }

    pub fn selection(&self) -> Option<&NodeKey> {
        self.selection.as_ref()
    }

    /// Re-resolves the current selection against a freshly derived model: names are
    /// matched first, the remembered index is a clamped fallback for renamed or
    /// deleted nodes. Returns the refreshed key without storing it.
    pub fn resolve_selection(&self, map: &MemoryMap) -> Option<NodeKey> {
        let key = self.selection.as_ref()?;
        if map.blocks.is_empty() {
            return None;
        }
        let block_names: AHashMap<&str, usize> = map
            .blocks
            .iter()
            .enumerate()
            .map(|(index, block)| (block.name.as_str(), index))
            .collect();
        let block_index = match block_names.get(key.block.as_str()) {
            Some(&index) => index,
            None => {
                log::warn!("selected block '{}' is gone, falling back to index", key.block);
                key.block_index.min(map.blocks.len() - 1)
            }
        };
        let block = &map.blocks[block_index];
        let mut resolved = NodeKey {
            block: block.name.clone(),
            block_index,
            register: None,
            register_index: None,
            field: None,
            field_index: None,
        };

        let Some(register_name) = &key.register else {
            return Some(resolved);
        };
        if block.nodes.is_empty() {
            return Some(resolved);
        }
        let node_names: AHashMap<&str, usize> = block
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.name(), index))
            .collect();
        let register_index = match node_names.get(register_name.as_str()) {
            Some(&index) => index,
            None => key
                .register_index
                .unwrap_or(0)
                .min(block.nodes.len() - 1),
        };
        let node = &block.nodes[register_index];
        resolved.register = Some(node.name().to_string());
        resolved.register_index = Some(register_index);

        let Some(field_name) = &key.field else {
            return Some(resolved);
        };
        let fields = match node {
            RegisterNode::Register(reg) => &reg.fields,
            RegisterNode::Array(array) => &array.template.fields,
        };
        if fields.is_empty() {
            return Some(resolved);
        }
        let field_index = fields
            .iter()
            .position(|field| &field.name == field_name)
            .unwrap_or_else(|| key.field_index.unwrap_or(0).min(fields.len() - 1));
        resolved.field = Some(fields[field_index].name.clone());
        resolved.field_index = Some(field_index);
        Some(resolved)
    }

    fn apply_op(&mut self, opname: &str, payload: &Value) -> MapResult<()> {
        let register_path = payload
            .get("register")
            .and_then(Value::as_sequence)
            .ok_or_else(|| missing_payload("register"))?;
        let register_path = parse_path(register_path)?;
        let index = payload.get("index").and_then(Value::as_u64).map(|n| n as usize);
        match opname {
            "field-add" => {
                self.field_add(&register_path, index)?;
                Ok(())
            }
            "field-delete" => {
                let index = index.ok_or_else(|| missing_payload("index"))?;
                self.field_delete(&register_path, index)
            }
            "field-move" => {
                let index = index.ok_or_else(|| missing_payload("index"))?;
                let delta = payload
                    .get("delta")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| missing_payload("delta"))?;
                self.field_move(&register_path, index, delta as isize)
            }
            other => Err(MapError::PathNotFound {
                path: format!("unknown structural operation '{other}'"),
            }),
        }
    }

    /// Validate, serialize, publish. Nothing is committed on any error.
    fn commit(&mut self, tree: Value) -> MapResult<()> {
        normalize_with(&tree, &self.options)?;
        let text = serde_yaml::to_string(&tree)?;
        log::debug!(
            "edit committed: {} -> {} bytes",
            self.text.len(),
            text.len()
        );
        self.text = text;
        Ok(())
    }
}

fn missing_payload(key: &str) -> MapError {
    MapError::PathNotFound {
        path: format!("structural op payload missing '{key}'"),
    }
}

fn register_mapping<'a>(
    tree: &'a mut Value,
    register_path: &[PathSeg],
) -> MapResult<&'a serde_yaml::Mapping> {
    get_path_mut(tree, register_path)?
        .as_mapping()
        .ok_or_else(|| MapError::PathNotFound {
            path: path_to_string(register_path),
        })
}

/// The register's `fields` sequence, created empty when absent.
fn fields_sequence<'a>(
    tree: &'a mut Value,
    register_path: &[PathSeg],
) -> MapResult<&'a mut Vec<Value>> {
    let register = get_path_mut(tree, register_path)?;
    let mapping = register.as_mapping_mut().ok_or_else(|| MapError::PathNotFound {
        path: path_to_string(register_path),
    })?;
    if !mapping.contains_key("fields") {
        mapping.insert("fields".into(), Value::Sequence(Vec::new()));
    }
    mapping
        .get_mut("fields")
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| MapError::DocumentParse {
            message: "'fields' must be a list".into(),
        })
}
