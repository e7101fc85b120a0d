//! Canonical serialization of the model back into the document shape. Output always
//! carries explicit offsets and the long access spellings, so serializing is
//! idempotent and implicit-addressing ambiguity never survives a round trip.

use serde_yaml::{Mapping, Value};

use crate::error::MapResult;
use crate::loader::literals::format_hex;
use crate::map::array::RegisterArray;
use crate::map::bitrange::BitRange;
use crate::map::block::{AddressBlock, RegisterNode};
use crate::map::field::BitField;
use crate::map::memory_map::MemoryMap;
use crate::map::register::Register;

pub fn to_tree(map: &MemoryMap) -> Value {
    let mut root = Mapping::new();
    root.insert("name".into(), map.name.clone().into());
    root.insert("description".into(), map.description.clone().into());
    let blocks: Vec<Value> = map.blocks.iter().map(block_to_value).collect();
    root.insert("address_blocks".into(), blocks.into());
    Value::Mapping(root)
}

pub fn dump(map: &MemoryMap) -> MapResult<String> {
    Ok(serde_yaml::to_string(&to_tree(map))?)
}

fn block_to_value(block: &AddressBlock) -> Value {
    let mut out = Mapping::new();
    out.insert("name".into(), block.name.clone().into());
    out.insert("base_address".into(), format_hex(block.base_address.into()).into());
    out.insert("size".into(), format_hex(block.size.into()).into());
    out.insert("usage".into(), block.usage.clone().into());
    let nodes: Vec<Value> = block
        .nodes
        .iter()
        .map(|node| match node {
            RegisterNode::Register(reg) => register_to_value(reg),
            RegisterNode::Array(array) => array_to_value(array),
        })
        .collect();
    out.insert("registers".into(), nodes.into());
    Value::Mapping(out)
}

fn register_to_value(register: &Register) -> Value {
    let mut out = Mapping::new();
    out.insert("name".into(), register.name.clone().into());
    out.insert(
        "offset".into(),
        format_hex(register.address_offset.into()).into(),
    );
    out.insert("width".into(), register.width.into());
    out.insert("access".into(), register.access.as_str().into());
    if !register.description.is_empty() {
        out.insert("description".into(), register.description.clone().into());
    }
    let fields: Vec<Value> = register.fields.iter().map(field_to_value).collect();
    out.insert("fields".into(), fields.into());
    Value::Mapping(out)
}

fn array_to_value(array: &RegisterArray) -> Value {
    let mut out = Mapping::new();
    out.insert("name".into(), array.name.clone().into());
    out.insert(
        "offset".into(),
        format_hex(array.address_offset.into()).into(),
    );
    out.insert("count".into(), array.count.into());
    out.insert("stride".into(), array.stride.into());
    out.insert(
        "registers".into(),
        vec![register_to_value(&array.template)].into(),
    );
    Value::Mapping(out)
}

fn field_to_value(field: &BitField) -> Value {
    let mut out = Mapping::new();
    out.insert("name".into(), field.name.clone().into());
    out.insert(
        "bits".into(),
        BitRange::new(field.bit_offset, field.bit_width).to_string().into(),
    );
    out.insert("access".into(), field.access.as_str().into());
    if let Some(reset) = field.reset_value {
        out.insert("reset_value".into(), format_hex(reset).into());
    }
    if !field.description.is_empty() {
        out.insert("description".into(), field.description.clone().into());
    }
    Value::Mapping(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::normalize::{normalize, parse_document};

    const SRC: &str = "name: chip\ndescription: test part\naddress_blocks:\n  - name: uart\n    offset: 0x4000\n    range: 0x100\n    registers:\n      - name: ctrl\n        fields:\n          - name: enable\n            bits: 0\n            reset: 1\n      - name: chans\n        count: 2\n        stride: 8\n        registers:\n          - name: chan\n";

    #[test]
    fn canonical_output_reloads_to_the_same_model() {
        let model = normalize(&parse_document(SRC).unwrap()).unwrap();
        let text = dump(&model).expect("dump");
        let reloaded = normalize(&parse_document(&text).unwrap()).unwrap();
        assert_eq!(reloaded, model, "serialize/normalize round trip is lossless");
    }

    #[test]
    fn output_uses_canonical_spellings() {
        let model = normalize(&parse_document(SRC).unwrap()).unwrap();
        let text = dump(&model).unwrap();
        assert!(text.contains("base_address"), "canonical base key: {text}");
        assert!(text.contains("0x4000"), "hex base address: {text}");
        assert!(text.contains("[0:0]"), "single-bit field keeps pair form: {text}");
        assert!(text.contains("read-write"), "long access spelling: {text}");
        assert!(text.contains("reset_value"), "specific reset key: {text}");
        let tree = to_tree(&model);
        let array_offset = tree["address_blocks"][0]["registers"][1]["offset"]
            .as_str()
            .expect("array offset emitted");
        assert_eq!(array_offset, "0x4", "implicit array offset became explicit");
    }
}
