//! A named region of address space holding registers and register arrays in source
//! order. Order matters: implicit offsets are derived by walking the node list.

use crate::map::array::RegisterArray;
use crate::map::register::Register;

/// A block entry. Closed union: source order across both kinds drives the running
/// address cursor, so registers and arrays live in one list, not two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterNode {
    Register(Register),
    Array(RegisterArray),
}

impl RegisterNode {
    pub fn name(&self) -> &str {
        match self {
            RegisterNode::Register(reg) => &reg.name,
            RegisterNode::Array(array) => &array.name,
        }
    }

    pub fn address_offset(&self) -> u64 {
        match self {
            RegisterNode::Register(reg) => reg.address_offset,
            RegisterNode::Array(array) => array.address_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBlock {
    pub name: String,
    /// Absolute base address of the block.
    pub base_address: u64,
    /// Block span in bytes.
    pub size: u64,
    /// Free-form tag, e.g. "registers" vs "memory".
    pub usage: String,
    pub nodes: Vec<RegisterNode>,
}

impl AddressBlock {
    /// Plain registers only, skipping arrays.
    pub fn registers(&self) -> impl Iterator<Item = &Register> {
        self.nodes.iter().filter_map(|node| match node {
            RegisterNode::Register(reg) => Some(reg),
            RegisterNode::Array(_) => None,
        })
    }

    /// Absolute address of the node at `index`, if it exists and fits the address
    /// space.
    pub fn node_address(&self, index: usize) -> Option<u64> {
        self.nodes
            .get(index)
            .and_then(|node| self.base_address.checked_add(node.address_offset()))
    }
}
