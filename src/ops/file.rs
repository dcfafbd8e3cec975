use crate::driver::DeviceDriver;
use crate::structure::inode::Inode;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Allocate a new inode. The caller links it into a directory separately.
    Create,
    /// Resolve the file; its data is read as part of the open.
    Read,
    /// Resolve the file and move the cursor to its end.
    Append,
    /// Resolve the file, leaving the cursor where it was.
    Write,
}

/// A regular file inode. Writes go to the cursor and advance it.
pub struct File {
    pub inode: Inode,
}

impl File {
    pub fn from_inode(inode: Inode) -> Result<File> {
        if inode.is_directory {
            return Err(Error::IsADirectory(inode.id));
        }
        Ok(File { inode })
    }

    pub fn seek_end(&mut self) {
        self.inode.cursor = self.inode.size;
        self.inode.touch();
    }

    pub fn write<A: DeviceDriver>(&mut self, structure: &mut Structure<A>, data: &[u8]) -> Result<usize> {
        let written = self.inode.write_at(structure, self.inode.cursor, data)?;
        self.inode.cursor += written as u64;
        structure.write_inode(&self.inode)?;
        Ok(written)
    }

    pub fn get_data<A: DeviceDriver>(&self, structure: &Structure<A>) -> Result<Vec<u8>> {
        self.inode.read_all(structure)
    }
}
