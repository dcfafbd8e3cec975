//! Geometry of a simulated disk.
//!
//! The defaults reproduce the fixed layout: a 6 MB disk of 1 KB blocks on 512 byte
//! sectors, with 80 inode slots. Smaller geometries are useful for exercising
//! capacity limits without filling megabytes of memory.

use crate::consts::{BLOCK_SIZE, DISK_SIZE, MAX_INODES, ROOT_INODE, SECTOR_SIZE};
use crate::util::error::{Error, Result};

/// Smallest sector that can hold an encoded superblock.
pub const MIN_SECTOR_SIZE: usize = 64;

/// Smallest block that can hold an inode record with a few directory entries.
pub const MIN_BLOCK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// Total size of the in-memory disk in bytes.
    pub disk_size: u64,
    /// Size of a block, a whole multiple of `sector_size`.
    pub block_size: usize,
    /// Size of a device sector.
    pub sector_size: usize,
    /// Number of inode slots, including the root directory.
    pub max_inodes: u32,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            disk_size: DISK_SIZE,
            block_size: BLOCK_SIZE,
            sector_size: SECTOR_SIZE,
            max_inodes: MAX_INODES,
        }
    }
}

impl FsConfig {
    pub fn new(disk_size: u64, block_size: usize, sector_size: usize, max_inodes: u32) -> Self {
        Self { disk_size, block_size, sector_size, max_inodes }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sector_size < MIN_SECTOR_SIZE {
            return Err(invalid(format!("sector size must be at least {} bytes", MIN_SECTOR_SIZE)));
        }
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(invalid(format!("block size must be at least {} bytes", MIN_BLOCK_SIZE)));
        }
        if self.block_size % self.sector_size != 0 {
            return Err(invalid(format!(
                "block size {} is not a multiple of the sector size {}",
                self.block_size, self.sector_size
            )));
        }
        if self.disk_size == 0 || self.disk_size % self.block_size as u64 != 0 {
            return Err(invalid(format!(
                "disk size {} is not a positive multiple of the block size {}",
                self.disk_size, self.block_size
            )));
        }
        if self.disk_size / self.block_size as u64 > u32::MAX as u64 {
            return Err(invalid("disk has more blocks than a block index can address".to_string()));
        }
        if self.max_inodes <= ROOT_INODE.get() {
            return Err(invalid(format!("at least {} inodes are required", ROOT_INODE.get() + 1)));
        }
        if self.metadata_blocks() as u64 >= self.block_count() as u64 {
            return Err(invalid("layout leaves no room for data blocks".to_string()));
        }
        Ok(())
    }

    pub fn block_count(&self) -> u32 {
        (self.disk_size / self.block_size as u64) as u32
    }

    /// Blocks needed by the free-block bitmap, one bit per block.
    pub fn bitmap_blocks(&self) -> u32 {
        let bytes = (self.block_count() as usize).div_ceil(8);
        bytes.div_ceil(self.block_size) as u32
    }

    /// Superblock, inode region and bitmap.
    pub fn metadata_blocks(&self) -> u32 {
        1 + self.max_inodes + self.bitmap_blocks()
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidConfig(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry() {
        let config = FsConfig::default();
        config.validate().unwrap();
        assert_eq!(config.block_count(), 6144);
        assert_eq!(config.bitmap_blocks(), 1);
        assert_eq!(config.metadata_blocks(), 82);
        assert_eq!(crate::consts::MAX_INDIRECT_BLOCKS, 256);
        assert_eq!(crate::consts::max_file_size(config.block_size), (3 + 256) * 1024);
    }

    #[test]
    fn rejects_bad_geometry() {
        let base = FsConfig::default();

        let misaligned = FsConfig { block_size: 1000, ..base };
        assert!(misaligned.validate().is_err());

        let ragged_disk = FsConfig { disk_size: base.disk_size + 1, ..base };
        assert!(ragged_disk.validate().is_err());

        let no_root = FsConfig { max_inodes: 2, ..base };
        assert!(no_root.validate().is_err());

        let no_data = FsConfig { disk_size: 64 * 1024, max_inodes: 70, ..base };
        assert!(no_data.validate().is_err());

        let tiny_sector = FsConfig { sector_size: 32, block_size: 256, ..base };
        assert!(tiny_sector.validate().is_err());
    }
}
