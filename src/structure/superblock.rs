use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::config::FsConfig;
use crate::consts::{BlockIndex, InodeId, ROOT_INODE};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::util::error::{Error, Result};
use crate::util::serializable::{record_codec, ByteSerializable};

const MAGIC: u32 = 0x6b73_6476;
const SUPERBLOCK_INDEX: BlockIndex = BlockIndex(0);

/// Static layout of the disk, written once at format time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub magic: u32,
    pub block_size: u32,
    pub block_count: u32,
    pub inode_start: BlockIndex,
    pub inode_count: u32,
    pub bitmap_start: BlockIndex,
    pub bitmap_blocks: u32,
    pub data_start: BlockIndex,
    pub root_inode: InodeId,
}

impl SuperBlock {
    pub fn new(config: &FsConfig) -> SuperBlock {
        let inode_start = BlockIndex(1);
        let bitmap_start = inode_start.offset(config.max_inodes);
        let bitmap_blocks = config.bitmap_blocks();
        SuperBlock {
            magic: MAGIC,
            block_size: config.block_size as u32,
            block_count: config.block_count(),
            inode_start,
            inode_count: config.max_inodes,
            bitmap_start,
            bitmap_blocks,
            data_start: bitmap_start.offset(bitmap_blocks),
            root_inode: ROOT_INODE,
        }
    }

    /// Fails with `NotFormatted` when block 0 holds no superblock image.
    pub(crate) fn read<A: DeviceDriver>(io: &IO<A>) -> Result<SuperBlock> {
        let buffer = io.read_block(SUPERBLOCK_INDEX)?;
        let superblock = SuperBlock::from_bytes(&buffer).map_err(|_| Error::NotFormatted)?;
        if superblock.magic != MAGIC {
            return Err(Error::NotFormatted);
        }
        Ok(superblock)
    }

    pub(crate) fn write<A: DeviceDriver>(&self, io: &mut IO<A>) -> Result<()> {
        io.write_block(SUPERBLOCK_INDEX, &self.to_bytes()?)
    }

    pub fn data_blocks(&self) -> u32 {
        self.block_count - self.data_start.get()
    }

    pub fn is_inode_region(&self, index: BlockIndex) -> bool {
        index >= self.inode_start && index < self.bitmap_start
    }
}

impl ByteSerializable for SuperBlock {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        record_codec(usize::MAX)
            .serialize(self)
            .map_err(|source| Error::Codec { block: SUPERBLOCK_INDEX.get(), source })
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        record_codec(bytes.len())
            .deserialize(bytes)
            .map_err(|source| Error::Codec { block: SUPERBLOCK_INDEX.get(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::SuperBlock;
    use crate::config::FsConfig;
    use crate::consts::{BlockIndex, ROOT_INODE};
    use crate::driver::MemoryDrive;
    use crate::io::IO;
    use crate::util::error::Error;

    #[test]
    fn read_write_superblock() {
        let config = FsConfig::default();
        let drive = MemoryDrive::new(config.disk_size, config.sector_size);
        let mut io = IO::new(drive, config.block_size).unwrap();
        let superblock = SuperBlock::new(&config);
        superblock.write(&mut io).unwrap();
        let drive_superblock = SuperBlock::read(&io).unwrap();
        assert_eq!(superblock, drive_superblock);
    }

    #[test]
    fn default_layout_keeps_regions_disjoint() {
        let superblock = SuperBlock::new(&FsConfig::default());
        assert_eq!(superblock.inode_start, BlockIndex(1));
        assert_eq!(superblock.bitmap_start, BlockIndex(81));
        assert_eq!(superblock.data_start, BlockIndex(82));
        assert_eq!(superblock.root_inode, ROOT_INODE);
        assert_eq!(superblock.data_blocks(), 6144 - 82);
        assert!(superblock.is_inode_region(BlockIndex(80)));
        assert!(!superblock.is_inode_region(BlockIndex(81)));
    }

    #[test]
    fn unformatted_disk_has_no_superblock() {
        let drive = MemoryDrive::new(64 * 1024, 512);
        let io = IO::new(drive, 1024).unwrap();
        assert!(matches!(SuperBlock::read(&io), Err(Error::NotFormatted)));
    }
}
