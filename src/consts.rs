use std::fmt;

use serde::{Deserialize, Serialize};

pub const BLOCK_SIZE: usize = 1024;
pub const DISK_SIZE: u64 = 6 * 1024 * 1024;
pub const SECTOR_SIZE: usize = 512;
pub const MAX_INODES: u32 = 80;
pub const DIRECT_POINTERS: usize = 3;
pub const FILE_NAME_LENGTH: usize = 12;
pub const POINTER_SIZE: usize = std::mem::size_of::<u32>();

/// Data-block indices one indirect block holds at the default block size.
pub const MAX_INDIRECT_BLOCKS: usize = indirect_capacity(BLOCK_SIZE);

pub const fn indirect_capacity(block_size: usize) -> usize {
    block_size / POINTER_SIZE
}

/// Largest file the direct pointers plus one indirect block can address.
pub const fn max_file_size(block_size: usize) -> u64 {
    ((DIRECT_POINTERS + indirect_capacity(block_size)) * block_size) as u64
}

pub const ROOT_INODE: InodeId = InodeId(2);
pub const ROOT_NAME: &str = "root";

/// Index of a block on the device. Only the data region is handed out by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockIndex(pub(crate) u32);

/// Slot number in the inode region. Never a block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct InodeId(pub(crate) u32);

impl BlockIndex {
    pub const fn new(index: u32) -> BlockIndex {
        BlockIndex(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn offset(self, by: u32) -> BlockIndex {
        BlockIndex(self.0 + by)
    }
}

impl InodeId {
    pub const fn new(id: u32) -> InodeId {
        InodeId(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for InodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-width name, truncated or zero-padded to `FILE_NAME_LENGTH` bytes.
///
/// Two names are equal only if their padded bytes are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FileName([u8; FILE_NAME_LENGTH]);

impl FileName {
    pub fn new(name: &str) -> FileName {
        let mut bytes = [0u8; FILE_NAME_LENGTH];
        let source = name.as_bytes();
        let len = source.len().min(FILE_NAME_LENGTH);
        bytes[..len].copy_from_slice(&source[..len]);
        FileName(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(FILE_NAME_LENGTH);
        &self.0[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl From<&str> for FileName {
    fn from(name: &str) -> Self {
        FileName::new(name)
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_truncates_and_pads() {
        let long = FileName::new("a-very-long-file-name.txt");
        assert_eq!(long.as_bytes(), b"a-very-long-");
        assert_eq!(long, FileName::new("a-very-long-something-else"));

        let short = FileName::new("a.txt");
        assert_eq!(short.as_bytes(), b"a.txt");
        assert_eq!(short.to_string(), "a.txt");
        assert_ne!(short, FileName::new("a.txt2"));
    }

    #[test]
    fn empty_file_name() {
        assert!(FileName::new("").is_empty());
        assert!(!FileName::new("x").is_empty());
    }
}
