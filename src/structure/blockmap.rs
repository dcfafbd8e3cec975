use crate::consts::BlockIndex;
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::util::error::{Error, Result};

/// Free-block bitmap, one bit per block of the device. A set bit means "in use".
///
/// The in-memory copy is authoritative; every change is written through to the
/// bitmap block that holds the affected bit.
pub struct BlockMap {
    pub(crate) first_block: BlockIndex,
    block_count: u32,
    free: u32,
    data: Vec<u8>,
}

impl BlockMap {
    /// Fresh map with every block below `reserved` (superblock, inode region, bitmap) marked used.
    pub fn new(first_block: BlockIndex, block_count: u32, block_size: usize, reserved: u32) -> BlockMap {
        let data = BlockMap::create_data(block_count, block_size);
        let mut map = BlockMap { first_block, block_count, free: block_count, data };
        for i in 0..reserved.min(block_count) {
            map.mark_used_mem(BlockIndex(i));
        }
        map
    }

    pub fn read<A: DeviceDriver>(io: &IO<A>, first_block: BlockIndex, block_count: u32) -> Result<BlockMap> {
        let mut data = BlockMap::create_data(block_count, io.block_size);
        let blocks = (data.len() / io.block_size) as u32;
        for i in 0..blocks {
            let offset = i as usize * io.block_size;
            let block = io.read_block(first_block.offset(i))?;
            data[offset..offset + io.block_size].copy_from_slice(&block);
        }

        let used: u32 = (0..block_count)
            .filter(|&i| data[(i / 8) as usize] & (1 << (i % 8)) != 0)
            .count() as u32;
        Ok(BlockMap { first_block, block_count, free: block_count - used, data })
    }

    fn create_data(block_count: u32, block_size: usize) -> Vec<u8> {
        let bytes = (block_count as usize).div_ceil(8);
        vec![0; bytes.div_ceil(block_size) * block_size]
    }

    pub fn write_part<A: DeviceDriver>(&self, io: &mut IO<A>, including_index: BlockIndex) -> Result<()> {
        let block = including_index.get() as usize / 8 / io.block_size;
        let data = &self.data[block * io.block_size..(block + 1) * io.block_size];
        io.write_block(self.first_block.offset(block as u32), data)
    }

    pub fn write_full<A: DeviceDriver>(&self, io: &mut IO<A>) -> Result<()> {
        for (i, chunk) in self.data.chunks(io.block_size).enumerate() {
            io.write_block(self.first_block.offset(i as u32), chunk)?;
        }
        Ok(())
    }

    /// First-fit scan. Does not reserve the block.
    pub fn find_free(&self) -> Option<BlockIndex> {
        for (byte_index, &byte) in self.data.iter().enumerate() {
            if byte == u8::MAX {
                continue;
            }
            let index = byte_index as u32 * 8 + byte.trailing_ones();
            if index >= self.block_count {
                return None;
            }
            return Some(BlockIndex(index));
        }
        None
    }

    pub fn allocate<A: DeviceDriver>(&mut self, io: &mut IO<A>) -> Result<BlockIndex> {
        let index = self.find_free().ok_or(Error::DiskFull { needed: 1, available: 0 })?;
        self.mark_used(io, index)?;
        Ok(index)
    }

    pub fn free_count(&self) -> u32 {
        self.free
    }

    pub fn is_free(&self, index: BlockIndex) -> bool {
        let index = index.get();
        self.data[(index / 8) as usize] & (1 << (index % 8)) == 0
    }

    pub fn is_used(&self, index: BlockIndex) -> bool {
        !self.is_free(index)
    }

    fn mark_used_mem(&mut self, index: BlockIndex) {
        if self.is_free(index) {
            let i = index.get();
            self.data[(i / 8) as usize] |= 1 << (i % 8);
            self.free -= 1;
        }
    }

    pub(crate) fn mark_used<A: DeviceDriver>(&mut self, io: &mut IO<A>, index: BlockIndex) -> Result<()> {
        self.check_range(index)?;
        log::debug!("marking block {} used", index);
        self.mark_used_mem(index);
        self.write_part(io, index)
    }

    fn mark_free_mem(&mut self, index: BlockIndex) {
        if self.is_used(index) {
            let i = index.get();
            self.data[(i / 8) as usize] &= !(1 << (i % 8));
            self.free += 1;
        }
    }

    pub(crate) fn mark_free<A: DeviceDriver>(&mut self, io: &mut IO<A>, index: BlockIndex) -> Result<()> {
        self.check_range(index)?;
        if self.is_free(index) {
            log::warn!("block {} is already free", index);
            return Ok(());
        }
        log::debug!("marking block {} free", index);
        self.mark_free_mem(index);
        self.write_part(io, index)
    }

    fn check_range(&self, index: BlockIndex) -> Result<()> {
        if index.get() >= self.block_count {
            return Err(Error::OutOfRange { index: index.get(), count: self.block_count });
        }
        Ok(())
    }
}
