use crate::consts::BlockIndex;
use crate::driver::DeviceDriver;
use crate::util::error::{Error, Result};
use raw::{raw_read_block, raw_write_block};

mod raw;

/// Block layer: fixed-size blocks on top of a sector device.
pub(crate) struct IO<A: DeviceDriver> {
    device: A,
    pub block_size: usize,
    pub block_count: u32,
}

impl<A: DeviceDriver> IO<A> {
    pub fn new(device: A, block_size: usize) -> Result<IO<A>> {
        let sector_size = device.get_sector_size();
        if sector_size == 0 || block_size < sector_size || block_size % sector_size != 0 {
            return Err(Error::InvalidConfig(format!(
                "block size {} must be a multiple of the sector size {}",
                block_size, sector_size
            )));
        }

        let block_count = u32::try_from(device.get_size() / block_size as u64)
            .map_err(|_| Error::InvalidConfig("device has more blocks than a block index can address".to_string()))?;
        Ok(IO { device, block_size, block_count })
    }

    pub fn into_device(self) -> A {
        self.device
    }

    pub fn device(&self) -> &A {
        &self.device
    }

    /// Writes `block` at `index`. Shorter buffers are zero-padded to a full block.
    pub(crate) fn write_block(&mut self, index: BlockIndex, block: &[u8]) -> Result<()> {
        if block.len() > self.block_size {
            return Err(Error::BlockOverflow { len: block.len(), block_size: self.block_size });
        }
        self.check_range(index)?;

        if block.len() == self.block_size {
            raw_write_block(&mut self.device, self.block_size, block, index.get() as u64);
        } else {
            let mut padded = block.to_vec();
            padded.resize(self.block_size, 0);
            raw_write_block(&mut self.device, self.block_size, &padded, index.get() as u64);
        }
        Ok(())
    }

    pub(crate) fn read_block(&self, index: BlockIndex) -> Result<Vec<u8>> {
        self.check_range(index)?;
        Ok(raw_read_block(&self.device, self.block_size, index.get() as u64))
    }

    pub(crate) fn zero_block(&mut self, index: BlockIndex) -> Result<()> {
        self.write_block(index, &[])
    }

    fn check_range(&self, index: BlockIndex) -> Result<()> {
        if index.get() >= self.block_count {
            return Err(Error::OutOfRange { index: index.get(), count: self.block_count });
        }
        Ok(())
    }
}
