use crate::consts::{BlockIndex, POINTER_SIZE};
use crate::util::error::Result;
use crate::util::serializable::ByteSerializable;

const NULL_POINTER: u32 = 0;

/// A block holding further data-block indices, little-endian `u32` each.
///
/// Slot value 0 means "unused"; block 0 is the superblock and never holds data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndirectBlock {
    pointers: Vec<u32>,
}

impl IndirectBlock {
    pub fn new(capacity: usize) -> IndirectBlock {
        IndirectBlock { pointers: vec![NULL_POINTER; capacity] }
    }

    pub fn set(&mut self, slot: usize, block: BlockIndex) {
        self.pointers[slot] = block.get();
    }

    /// Referenced blocks in slot order, skipping unused slots.
    pub fn used(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.pointers.iter().filter(|&&p| p != NULL_POINTER).map(|&p| BlockIndex(p))
    }
}

impl ByteSerializable for IndirectBlock {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.pointers.len() * POINTER_SIZE);
        for pointer in &self.pointers {
            data.extend_from_slice(&pointer.to_le_bytes());
        }
        Ok(data)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let pointers = bytes
            .chunks_exact(POINTER_SIZE)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(IndirectBlock { pointers })
    }
}

#[cfg(test)]
mod tests {
    use super::IndirectBlock;
    use crate::consts::BlockIndex;
    use crate::util::serializable::ByteSerializable;

    #[test]
    fn pointers_to_bytes() {
        let mut table = IndirectBlock::new(4);
        table.set(0, BlockIndex(90));
        table.set(1, BlockIndex(0x0102));
        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes, vec![90, 0, 0, 0, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(IndirectBlock::from_bytes(&bytes).unwrap(), table);
    }

    #[test]
    fn unused_slots_are_skipped() {
        let mut table = IndirectBlock::new(256);
        table.set(0, BlockIndex(100));
        table.set(1, BlockIndex(101));
        let used: Vec<_> = table.used().collect();
        assert_eq!(used, vec![BlockIndex(100), BlockIndex(101)]);
    }
}
