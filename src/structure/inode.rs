use std::time::SystemTime;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::consts::{BlockIndex, FileName, InodeId, DIRECT_POINTERS};
use crate::driver::DeviceDriver;
use crate::structure::indirect::IndirectBlock;
use crate::structure::Structure;
use crate::util::error::{Error, Result};
use crate::util::serializable::{record_codec, ByteSerializable};

/// A (name, inode) pair inside a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: FileName,
    pub inode: InodeId,
}

/// Metadata for one file or directory, stored as one record per inode block.
///
/// At most `DIRECT_POINTERS` blocks are referenced directly; the indirect block is
/// allocated the first time a file needs one more and holds every block after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub(crate) id: InodeId,
    pub(crate) name: FileName,
    pub(crate) valid: bool,
    pub(crate) is_directory: bool,
    pub(crate) links: u32,
    pub(crate) cursor: u64,
    pub(crate) direct: Vec<BlockIndex>,
    pub(crate) indirect: Option<BlockIndex>,
    pub(crate) size: u64,
    pub(crate) created_at: SystemTime,
    pub(crate) modified_at: SystemTime,
    pub(crate) entries: Vec<FileEntry>,
}

impl Inode {
    pub fn new(id: InodeId, name: FileName, is_directory: bool) -> Inode {
        let now = SystemTime::now();
        Inode {
            id,
            name,
            valid: true,
            is_directory,
            links: 0,
            cursor: 0,
            direct: Vec::new(),
            indirect: None,
            size: 0,
            created_at: now,
            modified_at: now,
            entries: Vec::new(),
        }
    }

    /// Free slot image written at format time.
    pub fn empty(id: InodeId) -> Inode {
        Inode {
            valid: false,
            created_at: SystemTime::UNIX_EPOCH,
            modified_at: SystemTime::UNIX_EPOCH,
            ..Inode::new(id, FileName::default(), false)
        }
    }

    pub fn id(&self) -> InodeId {
        self.id
    }

    pub fn name(&self) -> FileName {
        self.name
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn links(&self) -> u32 {
        self.links
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn direct_blocks(&self) -> &[BlockIndex] {
        &self.direct
    }

    pub fn indirect_block(&self) -> Option<BlockIndex> {
        self.indirect
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn modified_at(&self) -> SystemTime {
        self.modified_at
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub(crate) fn touch(&mut self) {
        self.modified_at = SystemTime::now();
    }

    /// Writes `data` at byte `offset`, allocating blocks as needed.
    ///
    /// Capacity is checked up front: on `FileTooLarge` or `DiskFull` nothing is allocated.
    pub(crate) fn write_at<A: DeviceDriver>(
        &mut self,
        structure: &mut Structure<A>,
        offset: u64,
        data: &[u8],
    ) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let end = offset + data.len() as u64;
        let limit = structure.max_file_size();
        if end > limit {
            return Err(Error::FileTooLarge { requested: end, limit });
        }

        let block_size = structure.block_size();
        self.ensure_blocks(structure, (end as usize).div_ceil(block_size))?;
        let blocks = self.data_blocks(structure)?;

        let mut start = offset as usize;
        let end = end as usize;
        let mut written = 0;
        while start < end {
            let logical = start / block_size;
            let block_end = ((logical + 1) * block_size).min(end);
            let len = block_end - start;
            let src = &data[written..written + len];

            if len == block_size {
                structure.write_block(blocks[logical], src)?;
            } else {
                let mut block = structure.read_block(blocks[logical])?;
                let inner = start % block_size;
                block[inner..inner + len].copy_from_slice(src);
                structure.write_block(blocks[logical], &block)?;
            }

            written += len;
            start = block_end;
        }

        self.size = self.size.max(end as u64);
        self.touch();
        Ok(written)
    }

    /// Direct blocks followed by the used slots of the indirect block, trimmed to `size`.
    pub(crate) fn read_all<A: DeviceDriver>(&self, structure: &Structure<A>) -> Result<Vec<u8>> {
        let blocks = self.data_blocks(structure)?;
        let mut data = Vec::with_capacity(blocks.len() * structure.block_size());
        for block in blocks {
            data.append(&mut structure.read_block(block)?);
        }

        if (data.len() as u64) < self.size {
            return Err(Error::Corrupt {
                block: structure.inode_block(self.id).get(),
                reason: format!("inode {} claims {} bytes but holds {}", self.id, self.size, data.len()),
            });
        }
        data.truncate(self.size as usize);
        Ok(data)
    }

    /// Frees every data block and the indirect block.
    pub(crate) fn release_blocks<A: DeviceDriver>(&mut self, structure: &mut Structure<A>) -> Result<()> {
        for block in self.data_blocks(structure)? {
            structure.free_block(block)?;
        }
        if let Some(indirect) = self.indirect.take() {
            structure.free_block(indirect)?;
        }
        self.direct.clear();
        self.size = 0;
        self.cursor = 0;
        Ok(())
    }

    pub(crate) fn data_blocks<A: DeviceDriver>(&self, structure: &Structure<A>) -> Result<Vec<BlockIndex>> {
        let mut blocks = self.direct.clone();
        if let Some(indirect) = self.indirect {
            blocks.extend(structure.read_indirect(indirect)?.used());
        }
        for &block in &blocks {
            structure.check_data_block(block)?;
        }
        Ok(blocks)
    }

    fn ensure_blocks<A: DeviceDriver>(&mut self, structure: &mut Structure<A>, target: usize) -> Result<()> {
        let current = self.data_blocks(structure)?.len();
        if target <= current {
            return Ok(());
        }

        let needs_indirect = self.indirect.is_none() && target > DIRECT_POINTERS;
        let needed = (target - current + needs_indirect as usize) as u32;
        let available = structure.free_block_count();
        if needed > available {
            return Err(Error::DiskFull { needed, available });
        }

        let capacity = structure.pointers_per_block();
        let mut table = match self.indirect {
            Some(indirect) => Some(structure.read_indirect(indirect)?),
            None => None,
        };

        for logical in current..target {
            if logical < DIRECT_POINTERS {
                let block = structure.allocate_block()?;
                self.direct.push(block);
                continue;
            }

            if self.indirect.is_none() {
                let indirect = structure.allocate_block()?;
                log::debug!("inode {} takes indirect block {}", self.id, indirect);
                self.indirect = Some(indirect);
            }
            let block = structure.allocate_block()?;
            table
                .get_or_insert_with(|| IndirectBlock::new(capacity))
                .set(logical - DIRECT_POINTERS, block);
        }

        if let (Some(indirect), Some(table)) = (self.indirect, &table) {
            structure.write_indirect(indirect, table)?;
        }
        Ok(())
    }
}

impl ByteSerializable for Inode {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        record_codec(usize::MAX)
            .serialize(self)
            .map_err(|source| Error::Codec { block: 0, source })
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        record_codec(bytes.len())
            .deserialize(bytes)
            .map_err(|source| Error::Codec { block: 0, source })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::{FileEntry, Inode};
    use crate::config::FsConfig;
    use crate::consts::{BlockIndex, FileName, InodeId};
    use crate::driver::MemoryDrive;
    use crate::structure::Structure;
    use crate::util::error::Error;
    use crate::util::serializable::ByteSerializable;

    fn structure() -> Structure<MemoryDrive> {
        let config = FsConfig::default();
        Structure::new(MemoryDrive::new(config.disk_size, config.sector_size), &config).unwrap()
    }

    fn file(structure: &mut Structure<MemoryDrive>) -> Inode {
        let id = structure.find_free_inode().unwrap();
        let inode = Inode::new(id, FileName::new("data.bin"), false);
        structure.write_inode(&inode).unwrap();
        inode
    }

    #[test]
    fn inode_to_bytes() {
        let mut inode = Inode::new(InodeId(7), FileName::new("dir"), true);
        inode.direct = vec![BlockIndex(90), BlockIndex(91), BlockIndex(92)];
        inode.indirect = Some(BlockIndex(93));
        inode.size = 4000;
        inode.cursor = 12;
        inode.links = 1;
        inode.created_at = SystemTime::UNIX_EPOCH + Duration::new(1_700_000_000, 123);
        inode.entries = vec![
            FileEntry { name: FileName::new("file1"), inode: InodeId(4) },
            FileEntry { name: FileName::new("file2"), inode: InodeId(5) },
        ];

        let bytes = inode.to_bytes().unwrap();
        assert!(bytes.len() < 1024);
        assert_eq!(Inode::from_bytes(&bytes).unwrap(), inode);
    }

    #[test]
    fn inode_from_zeroed_block_is_free() {
        let inode = Inode::from_bytes(&[0u8; 1024]).unwrap();
        assert!(!inode.is_valid());
        assert_eq!(inode.entries().len(), 0);
    }

    #[test]
    fn inode_from_garbage_fails() {
        assert!(matches!(Inode::from_bytes(&[0xff; 1024]), Err(Error::Codec { .. })));
    }

    #[test]
    fn inode_data() {
        let mut structure = structure();
        let mut inode = file(&mut structure);

        let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(inode.write_at(&mut structure, 0, &data).unwrap(), 2500);
        assert_eq!(inode.direct.len(), 3);
        assert_eq!(inode.indirect, None);
        assert_eq!(inode.read_all(&structure).unwrap(), data);
    }

    #[test]
    fn direct_capacity_boundary() {
        let mut structure = structure();

        let mut exact = file(&mut structure);
        exact.write_at(&mut structure, 0, &vec![1; 3 * 1024]).unwrap();
        assert_eq!(exact.indirect, None);

        let mut over = file(&mut structure);
        over.write_at(&mut structure, 0, &vec![1; 3 * 1024 + 1]).unwrap();
        assert!(over.indirect.is_some());
        assert_eq!(over.data_blocks(&structure).unwrap().len(), 4);
    }

    #[test]
    fn indirect_block_allocated_once() {
        let mut structure = structure();
        let mut inode = file(&mut structure);

        inode.write_at(&mut structure, 0, &vec![7; 4 * 1024]).unwrap();
        let indirect = inode.indirect;
        inode.write_at(&mut structure, 4 * 1024, &vec![8; 3 * 1024]).unwrap();
        assert_eq!(inode.indirect, indirect);

        let data = inode.read_all(&structure).unwrap();
        assert_eq!(data.len(), 7 * 1024);
        assert!(data[..4 * 1024].iter().all(|&b| b == 7));
        assert!(data[4 * 1024..].iter().all(|&b| b == 8));
    }

    #[test]
    fn overwrite_inside_a_block() {
        let mut structure = structure();
        let mut inode = file(&mut structure);

        inode.write_at(&mut structure, 0, b"hello world").unwrap();
        inode.write_at(&mut structure, 6, b"there").unwrap();
        assert_eq!(inode.read_all(&structure).unwrap(), b"hello there");
        assert_eq!(inode.size(), 11);
    }

    #[test]
    fn too_large_allocates_nothing() {
        let mut structure = structure();
        let mut inode = file(&mut structure);
        let free = structure.free_block_count();

        let limit = structure.max_file_size();
        let result = inode.write_at(&mut structure, 0, &vec![1; limit as usize + 1]);
        assert!(matches!(result, Err(Error::FileTooLarge { .. })));
        assert_eq!(structure.free_block_count(), free);
        assert!(inode.direct.is_empty());
    }

    #[test]
    fn release_blocks_returns_everything() {
        let mut structure = structure();
        let mut inode = file(&mut structure);
        let free = structure.free_block_count();

        inode.write_at(&mut structure, 0, &vec![3; 5000]).unwrap();
        assert_eq!(structure.free_block_count(), free - 6);

        inode.release_blocks(&mut structure).unwrap();
        assert_eq!(structure.free_block_count(), free);
        assert_eq!(inode.size(), 0);
        assert_eq!(inode.indirect, None);
    }
}
