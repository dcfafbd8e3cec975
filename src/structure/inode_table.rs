use crate::consts::{BlockIndex, InodeId};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::inode::Inode;
use crate::util::error::{Error, Result};
use crate::util::serializable::ByteSerializable;

/// Fixed-capacity inode region: slot `i` is the record in block `table_index + i`.
///
/// Slot occupancy is the record's own validity flag; there is no separate map.
pub struct InodeTable {
    table_index: BlockIndex,
    pub(crate) inode_count: u32,
}

impl InodeTable {
    pub fn create<A: DeviceDriver>(io: &mut IO<A>, table_index: BlockIndex, inode_count: u32) -> Result<InodeTable> {
        let table = InodeTable::read(table_index, inode_count);
        for i in 0..inode_count {
            table.write_inode(io, &Inode::empty(InodeId(i)))?;
        }
        Ok(table)
    }

    pub fn read(table_index: BlockIndex, inode_count: u32) -> InodeTable {
        InodeTable { table_index, inode_count }
    }

    pub fn read_inode<A: DeviceDriver>(&self, io: &IO<A>, id: InodeId) -> Result<Inode> {
        let block = self.inode_block(id)?;
        let buffer = io.read_block(block)?;
        let inode = Inode::from_bytes(&buffer).map_err(|err| err.at_block(block))?;
        if inode.id != id {
            return Err(Error::Corrupt {
                block: block.get(),
                reason: format!("slot {} holds the record of inode {}", id, inode.id),
            });
        }
        Ok(inode)
    }

    pub fn write_inode<A: DeviceDriver>(&self, io: &mut IO<A>, inode: &Inode) -> Result<()> {
        let block = self.inode_block(inode.id)?;
        let bytes = inode.to_bytes().map_err(|err| err.at_block(block))?;
        if bytes.len() > io.block_size {
            if inode.is_directory {
                return Err(Error::DirectoryFull(inode.id));
            }
            return Err(Error::BlockOverflow { len: bytes.len(), block_size: io.block_size });
        }
        log::debug!("writing inode {} ({} bytes) to block {}", inode.id, bytes.len(), block);
        io.write_block(block, &bytes)
    }

    /// Lowest slot whose record is not valid.
    pub fn find_free<A: DeviceDriver>(&self, io: &IO<A>) -> Result<InodeId> {
        for i in 0..self.inode_count {
            if !self.read_inode(io, InodeId(i))?.valid {
                return Ok(InodeId(i));
            }
        }
        Err(Error::InodeTableFull)
    }

    pub fn free_count<A: DeviceDriver>(&self, io: &IO<A>) -> Result<u32> {
        let mut free = 0;
        for i in 0..self.inode_count {
            if !self.read_inode(io, InodeId(i))?.valid {
                free += 1;
            }
        }
        Ok(free)
    }

    #[inline]
    pub(crate) fn inode_block(&self, id: InodeId) -> Result<BlockIndex> {
        if id.get() >= self.inode_count {
            return Err(Error::NoSuchInode(id));
        }
        Ok(self.table_index.offset(id.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::InodeTable;
    use crate::consts::{BlockIndex, FileName, InodeId};
    use crate::driver::MemoryDrive;
    use crate::io::IO;
    use crate::structure::inode::{FileEntry, Inode};
    use crate::util::error::Error;

    fn io() -> IO<MemoryDrive> {
        IO::new(MemoryDrive::new(128 * 1024, 512), 1024).unwrap()
    }

    #[test]
    fn read_write_table() {
        let mut io = io();
        let table = InodeTable::create(&mut io, BlockIndex(1), 16).unwrap();
        assert_eq!(table.inode_count, 16);
        assert_eq!(table.free_count(&io).unwrap(), 16);
        assert_eq!(table.find_free(&io).unwrap(), InodeId(0));
        assert_eq!(table.inode_block(InodeId(15)).unwrap(), BlockIndex(16));
    }

    #[test]
    fn read_write_inode() {
        let mut io = io();
        let table = InodeTable::create(&mut io, BlockIndex(1), 16).unwrap();

        let mut memory_inode = Inode::new(InodeId(3), FileName::new("home"), true);
        memory_inode.entries.push(FileEntry { name: FileName::new("a.txt"), inode: InodeId(4) });
        table.write_inode(&mut io, &memory_inode).unwrap();
        let fs_inode = table.read_inode(&io, InodeId(3)).unwrap();
        assert_eq!(memory_inode, fs_inode);

        memory_inode.entries.clear();
        table.write_inode(&mut io, &memory_inode).unwrap();
        assert_eq!(table.read_inode(&io, InodeId(3)).unwrap().entries().len(), 0);
    }

    #[test]
    fn first_invalid_slot_wins() {
        let mut io = io();
        let table = InodeTable::create(&mut io, BlockIndex(1), 4).unwrap();
        table.write_inode(&mut io, &Inode::new(InodeId(0), FileName::new("a"), false)).unwrap();
        table.write_inode(&mut io, &Inode::new(InodeId(2), FileName::new("b"), false)).unwrap();
        assert_eq!(table.find_free(&io).unwrap(), InodeId(1));

        table.write_inode(&mut io, &Inode::new(InodeId(1), FileName::new("c"), false)).unwrap();
        table.write_inode(&mut io, &Inode::new(InodeId(3), FileName::new("d"), false)).unwrap();
        assert!(matches!(table.find_free(&io), Err(Error::InodeTableFull)));
    }

    #[test]
    fn oversized_directory_is_refused() {
        let mut io = io();
        let table = InodeTable::create(&mut io, BlockIndex(1), 4).unwrap();
        let mut directory = Inode::new(InodeId(2), FileName::new("big"), true);
        for i in 0..100 {
            directory.entries.push(FileEntry { name: FileName::new(&format!("f{}", i)), inode: InodeId(i) });
        }
        assert!(matches!(table.write_inode(&mut io, &directory), Err(Error::DirectoryFull(InodeId(2)))));
        assert!(!table.read_inode(&io, InodeId(2)).unwrap().is_valid());
    }

    #[test]
    fn corrupt_slot_is_reported() {
        let mut io = io();
        let table = InodeTable::create(&mut io, BlockIndex(1), 4).unwrap();
        io.write_block(BlockIndex(2), &vec![0xff; 1024]).unwrap();
        assert!(matches!(table.read_inode(&io, InodeId(1)), Err(Error::Codec { block: 2, .. })));
        assert!(matches!(table.read_inode(&io, InodeId(9)), Err(Error::NoSuchInode(InodeId(9)))));
    }
}
