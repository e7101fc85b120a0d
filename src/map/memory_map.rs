use crate::map::block::AddressBlock;
use crate::map::register::Register;

/// Top-level canonical model: the whole document, re-derived from text on every load
/// and every edit. Never mutated in place across edits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryMap {
    pub name: String,
    pub description: String,
    pub blocks: Vec<AddressBlock>,
}

impl MemoryMap {
    pub fn block(&self, name: &str) -> Option<&AddressBlock> {
        self.blocks.iter().find(|block| block.name == name)
    }

    /// Looks up a plain register by block and register name.
    pub fn register(&self, block: &str, register: &str) -> Option<&Register> {
        self.block(block)?
            .registers()
            .find(|reg| reg.name == register)
    }
}
