//! Boundary between the schema-tolerant raw document tree and the canonical model.
//! All key synonyms, implicit addressing, and shorthand notations are resolved here;
//! none of that tolerance leaks past this module.

use serde_yaml::{Mapping, Value};

use crate::error::{MapError, MapResult};
use crate::loader::literals::{value_to_int, value_to_size};
use crate::map::array::RegisterArray;
use crate::map::bitrange::BitRange;
use crate::map::block::{AddressBlock, RegisterNode};
use crate::map::field::{Access, BitField};
use crate::map::memory_map::MemoryMap;
use crate::map::register::{DEFAULT_REGISTER_WIDTH, Register};
use crate::map::value::MAX_WIDTH;

/// Knobs the document format leaves to the surrounding tool.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Bit width assumed for registers that do not declare one, and the basis of the
    /// sequential-addressing step.
    pub default_register_width: u32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            default_register_width: DEFAULT_REGISTER_WIDTH,
        }
    }
}

impl NormalizeOptions {
    /// Byte step the address cursor takes past a plain register.
    fn default_step(&self) -> u64 {
        u64::from(self.default_register_width.div_ceil(8))
    }
}

/// Parses raw document text into the loosely-typed tree.
pub fn parse_document(text: &str) -> MapResult<Value> {
    let tree: Value = serde_yaml::from_str(text)?;
    Ok(tree)
}

pub fn normalize(tree: &Value) -> MapResult<MemoryMap> {
    normalize_with(tree, &NormalizeOptions::default())
}

pub fn normalize_with(tree: &Value, options: &NormalizeOptions) -> MapResult<MemoryMap> {
    let root = expect_mapping(tree, "document root")?;
    let mut map = MemoryMap {
        name: string_entry(root, "name"),
        description: string_entry(root, "description"),
        blocks: Vec::new(),
    };
    if let Some(blocks) = root.get("address_blocks") {
        for entry in expect_sequence(blocks, "address_blocks")? {
            map.blocks.push(normalize_block(entry, options)?);
        }
    }
    Ok(map)
}

fn normalize_block(value: &Value, options: &NormalizeOptions) -> MapResult<AddressBlock> {
    let mapping = expect_mapping(value, "address block")?;
    let name = required_name(mapping, "address block")?;
    let base_address = match first_int(mapping, &["base_address", "offset"]) {
        Some(base) => to_u64(base, "base address")?,
        None => 0,
    };
    let size = match first_size(mapping, &["size", "range"]) {
        Some(size) => to_u64(size, "block size")?,
        None => 0,
    };
    let usage = mapping
        .get("usage")
        .and_then(Value::as_str)
        .unwrap_or("registers")
        .to_string();

    let mut block = AddressBlock {
        name,
        base_address,
        size,
        usage,
        nodes: Vec::new(),
    };

    // Walk every node in source order with a running byte cursor: an explicit offset
    // resets the cursor, arrays advance it by count * stride, plain registers by the
    // default register byte width.
    let mut cursor = 0u64;
    if let Some(registers) = mapping.get("registers") {
        for entry in expect_sequence(registers, "registers")? {
            let node = normalize_node(entry, options, &mut cursor)?;
            block.nodes.push(node);
        }
    }
    if let Some(arrays) = mapping.get("register_arrays") {
        for entry in expect_sequence(arrays, "register_arrays")? {
            let node = normalize_array_entry(entry, options, &mut cursor)?;
            block.nodes.push(RegisterNode::Array(node));
        }
    }
    Ok(block)
}

fn normalize_node(
    value: &Value,
    options: &NormalizeOptions,
    cursor: &mut u64,
) -> MapResult<RegisterNode> {
    let mapping = expect_mapping(value, "register node")?;
    if mapping.contains_key("count") {
        let array = normalize_array_entry(value, options, cursor)?;
        return Ok(RegisterNode::Array(array));
    }
    let mut register = normalize_register(mapping, options)?;
    if let Some(offset) = first_int(mapping, &["address_offset", "offset"]) {
        *cursor = to_u64(offset, "register offset")?;
    }
    register.address_offset = *cursor;
    *cursor = cursor.saturating_add(options.default_step());
    Ok(RegisterNode::Register(register))
}

fn normalize_array_entry(
    value: &Value,
    options: &NormalizeOptions,
    cursor: &mut u64,
) -> MapResult<RegisterArray> {
    let mapping = expect_mapping(value, "register array")?;
    let name = required_name(mapping, "register array")?;
    let count = match first_int(mapping, &["count"]) {
        Some(count) => u32::try_from(count).map_err(|_| parse_error("array count too large"))?,
        None => 1,
    };
    let stride = match first_int(mapping, &["stride"]) {
        Some(stride) => u32::try_from(stride).map_err(|_| parse_error("array stride too large"))?,
        None => {
            log::trace!("array '{name}' has no stride, defaulting to register step");
            options.default_step() as u32
        }
    };

    // Template register: either an explicit `template:` mapping or the single entry
    // of a nested `registers:` list.
    let template_value = mapping
        .get("template")
        .or_else(|| match mapping.get("registers") {
            Some(Value::Sequence(seq)) if seq.len() == 1 => seq.first(),
            Some(Value::Sequence(_)) => None,
            _ => None,
        })
        .ok_or_else(|| {
            parse_error(format!(
                "array '{name}' needs a single-register template ('template' or a one-entry 'registers' list)"
            ))
        })?;
    let template = normalize_register(expect_mapping(template_value, "array template")?, options)?;

    if let Some(offset) = first_int(mapping, &["address_offset", "offset", "base_address"]) {
        *cursor = to_u64(offset, "array offset")?;
    }
    let array = RegisterArray {
        name,
        address_offset: *cursor,
        count,
        stride,
        template,
    };
    array.validate()?;
    *cursor = cursor.saturating_add(array.byte_span());
    Ok(array)
}

pub(crate) fn normalize_register(
    mapping: &Mapping,
    options: &NormalizeOptions,
) -> MapResult<Register> {
    let name = required_name(mapping, "register")?;
    let width = match first_int(mapping, &["width"]) {
        Some(width) => {
            let width = u32::try_from(width).unwrap_or(u32::MAX);
            if width < 1 || width > MAX_WIDTH {
                return Err(parse_error(format!(
                    "register '{name}' width {width} outside supported 1..={MAX_WIDTH}"
                )));
            }
            width
        }
        None => options.default_register_width,
    };
    let access = match mapping.get("access").and_then(Value::as_str) {
        Some(text) => Access::parse(text)?,
        None => Access::default(),
    };
    let mut register = Register::new(name);
    register.width = width;
    register.access = access;
    register.description = string_entry(mapping, "description");
    if let Some(fields) = mapping.get("fields") {
        for entry in expect_sequence(fields, "fields")? {
            let field = normalize_field(entry, access)?;
            field.validate(width)?;
            register.fields.push(field);
        }
    }
    Ok(register)
}

fn normalize_field(value: &Value, default_access: Access) -> MapResult<BitField> {
    let mapping = expect_mapping(value, "field")?;
    let name = required_name(mapping, "field")?;

    // Bit position: a `bits` range/shorthand, or an explicit offset+width pair with
    // width defaulting to a single bit.
    let range = match mapping.get("bits") {
        Some(Value::String(text)) => BitRange::parse(text)?,
        Some(Value::Number(num)) => {
            let bit = num.as_u64().ok_or_else(|| MapError::MalformedBitRange {
                text: num.to_string(),
            })?;
            BitRange::new(
                u32::try_from(bit).map_err(|_| MapError::MalformedBitRange {
                    text: num.to_string(),
                })?,
                1,
            )
        }
        Some(other) => {
            return Err(MapError::MalformedBitRange {
                text: format!("{other:?}"),
            });
        }
        None => {
            let offset = first_int(mapping, &["bit_offset"]).ok_or_else(|| {
                parse_error(format!("field '{name}' has neither 'bits' nor 'bit_offset'"))
            })?;
            let width = first_int(mapping, &["bit_width"]).unwrap_or(1);
            BitRange::new(
                u32::try_from(offset).map_err(|_| parse_error("bit_offset too large"))?,
                u32::try_from(width).map_err(|_| parse_error("bit_width too large"))?,
            )
        }
    };

    let access = match mapping.get("access").and_then(Value::as_str) {
        Some(text) => Access::parse(text)?,
        None => default_access,
    };
    let reset_value = first_int(mapping, &["reset_value", "reset"]);

    Ok(BitField {
        name,
        bit_offset: range.offset,
        bit_width: range.width,
        access,
        reset_value,
        description: string_entry(mapping, "description"),
    })
}

fn expect_mapping<'a>(value: &'a Value, what: &str) -> MapResult<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| parse_error(format!("{what} must be a mapping")))
}

fn expect_sequence<'a>(value: &'a Value, what: &str) -> MapResult<&'a Vec<Value>> {
    value
        .as_sequence()
        .ok_or_else(|| parse_error(format!("{what} must be a list")))
}

fn required_name(mapping: &Mapping, what: &str) -> MapResult<String> {
    mapping
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| parse_error(format!("{what} is missing a 'name'")))
}

fn string_entry(mapping: &Mapping, key: &str) -> String {
    mapping
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First present key wins; callers list the most specific spelling first.
fn first_int(mapping: &Mapping, keys: &[&str]) -> Option<u128> {
    keys.iter()
        .find_map(|key| mapping.get(*key).and_then(value_to_int))
}

fn first_size(mapping: &Mapping, keys: &[&str]) -> Option<u128> {
    keys.iter()
        .find_map(|key| mapping.get(*key).and_then(value_to_size))
}

fn to_u64(value: u128, what: &str) -> MapResult<u64> {
    u64::try_from(value).map_err(|_| parse_error(format!("{what} exceeds 64 bits")))
}

fn parse_error(message: impl Into<String>) -> MapError {
    MapError::DocumentParse {
        message: message.into(),
    }
}
