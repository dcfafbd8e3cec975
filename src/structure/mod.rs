use crate::config::FsConfig;
use crate::consts::{indirect_capacity, max_file_size, BlockIndex, InodeId};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::blockmap::BlockMap;
use crate::structure::indirect::IndirectBlock;
use crate::structure::inode::Inode;
use crate::structure::inode_table::InodeTable;
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};
use crate::util::format::pretty_size_from_bytes;
use crate::util::serializable::ByteSerializable;

pub(crate) mod blockmap;
pub(crate) mod indirect;
pub mod inode;
pub(crate) mod inode_table;
pub mod superblock;

/// Everything on the disk below the file operations: the device, the layout,
/// the free-block bitmap and the inode region.
pub struct Structure<A: DeviceDriver> {
    pub(crate) io: IO<A>,
    pub(crate) superblock: SuperBlock,
    pub(crate) block_map: BlockMap,
    pub(crate) inode_table: InodeTable,
}

impl<A: DeviceDriver> Structure<A> {
    /// Formats `device`, overwriting block 0, the inode region and the bitmap.
    pub fn new(device: A, config: &FsConfig) -> Result<Structure<A>> {
        config.validate()?;
        if device.get_sector_size() != config.sector_size || device.get_size() != config.disk_size {
            return Err(Error::InvalidConfig(format!(
                "device is {} bytes in {} byte sectors, expected {} bytes in {} byte sectors",
                device.get_size(),
                device.get_sector_size(),
                config.disk_size,
                config.sector_size
            )));
        }

        let mut io = IO::new(device, config.block_size)?;
        let superblock = SuperBlock::new(config);
        superblock.write(&mut io)?;

        let inode_table = InodeTable::create(&mut io, superblock.inode_start, superblock.inode_count)?;

        let block_map = BlockMap::new(
            superblock.bitmap_start,
            superblock.block_count,
            config.block_size,
            superblock.data_start.get(),
        );
        block_map.write_full(&mut io)?;

        log::info!(
            "formatted {} disk: {} blocks of {} bytes, {} inodes, data from block {}",
            pretty_size_from_bytes(config.disk_size),
            superblock.block_count,
            superblock.block_size,
            superblock.inode_count,
            superblock.data_start
        );
        Ok(Structure { io, superblock, block_map, inode_table })
    }

    pub fn mount(device: A) -> Result<Structure<A>> {
        let sector_size = device.get_sector_size();
        let probe = IO::new(device, sector_size)?;
        let superblock = SuperBlock::read(&probe)?;

        let io = IO::new(probe.into_device(), superblock.block_size as usize)?;
        if io.block_count != superblock.block_count {
            return Err(Error::Corrupt {
                block: 0,
                reason: format!(
                    "superblock describes {} blocks but the device holds {}",
                    superblock.block_count, io.block_count
                ),
            });
        }

        let block_map = BlockMap::read(&io, superblock.bitmap_start, superblock.block_count)?;
        let inode_table = InodeTable::read(superblock.inode_start, superblock.inode_count);
        log::info!("mounted disk with {} free blocks", block_map.free_count());
        Ok(Structure { io, superblock, block_map, inode_table })
    }

    pub fn into_device(self) -> A {
        self.io.into_device()
    }

    pub fn device(&self) -> &A {
        self.io.device()
    }

    pub fn block_size(&self) -> usize {
        self.io.block_size
    }

    pub(crate) fn pointers_per_block(&self) -> usize {
        indirect_capacity(self.io.block_size)
    }

    pub(crate) fn max_file_size(&self) -> u64 {
        max_file_size(self.io.block_size)
    }

    pub fn free_block_count(&self) -> u32 {
        self.block_map.free_count()
    }

    pub fn find_free_block(&self) -> Result<BlockIndex> {
        self.block_map.find_free().ok_or(Error::DiskFull { needed: 1, available: 0 })
    }

    /// Reserves a data block and zeroes it.
    pub(crate) fn allocate_block(&mut self) -> Result<BlockIndex> {
        let block = self.block_map.allocate(&mut self.io)?;
        self.io.zero_block(block)?;
        Ok(block)
    }

    pub(crate) fn free_block(&mut self, block: BlockIndex) -> Result<()> {
        self.check_data_block(block)?;
        self.io.zero_block(block)?;
        self.block_map.mark_free(&mut self.io, block)
    }

    pub(crate) fn check_data_block(&self, block: BlockIndex) -> Result<()> {
        if block < self.superblock.data_start || block.get() >= self.superblock.block_count {
            let kind = if self.superblock.is_inode_region(block) { "an inode block" } else { "outside the data region" };
            return Err(Error::Corrupt {
                block: block.get(),
                reason: format!("data pointer refers to {}", kind),
            });
        }
        Ok(())
    }

    pub(crate) fn read_block(&self, block: BlockIndex) -> Result<Vec<u8>> {
        self.io.read_block(block)
    }

    pub(crate) fn write_block(&mut self, block: BlockIndex, data: &[u8]) -> Result<()> {
        self.io.write_block(block, data)
    }

    pub(crate) fn read_indirect(&self, block: BlockIndex) -> Result<IndirectBlock> {
        self.check_data_block(block)?;
        IndirectBlock::from_bytes(&self.io.read_block(block)?)
    }

    pub(crate) fn write_indirect(&mut self, block: BlockIndex, table: &IndirectBlock) -> Result<()> {
        self.io.write_block(block, &table.to_bytes()?)
    }

    pub fn read_inode(&self, id: InodeId) -> Result<Inode> {
        self.inode_table.read_inode(&self.io, id)
    }

    pub fn write_inode(&mut self, inode: &Inode) -> Result<()> {
        self.inode_table.write_inode(&mut self.io, inode)
    }

    pub fn find_free_inode(&self) -> Result<InodeId> {
        self.inode_table.find_free(&self.io)
    }

    pub fn free_inode_count(&self) -> Result<u32> {
        self.inode_table.free_count(&self.io)
    }

    pub(crate) fn inode_block(&self, id: InodeId) -> BlockIndex {
        self.superblock.inode_start.offset(id.get())
    }
}
