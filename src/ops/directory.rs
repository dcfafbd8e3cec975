use crate::consts::{FileName, InodeId};
use crate::structure::inode::{FileEntry, Inode};
use crate::util::error::{Error, Result};

/// A directory inode and its entry list.
pub struct Directory {
    pub inode: Inode,
}

impl Directory {
    pub fn from_inode(inode: Inode) -> Result<Directory> {
        if !inode.is_directory {
            return Err(Error::NotADirectory(inode.id));
        }
        Ok(Directory { inode })
    }

    pub fn get_entries(&self) -> &[FileEntry] {
        &self.inode.entries
    }

    /// Exact match on the padded name; the first entry in insertion order wins.
    pub fn lookup(&self, name: &FileName) -> Option<InodeId> {
        self.inode.entries.iter().find(|entry| entry.name == *name).map(|entry| entry.inode)
    }

    pub(crate) fn add_entry(&mut self, name: FileName, id: InodeId) -> Result<()> {
        if self.lookup(&name).is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        self.inode.entries.push(FileEntry { name, inode: id });
        self.inode.touch();
        Ok(())
    }

    pub(crate) fn remove_entry(&mut self, name: &FileName) -> Option<FileEntry> {
        let position = self.inode.entries.iter().position(|entry| entry.name == *name)?;
        self.inode.touch();
        Some(self.inode.entries.remove(position))
    }
}
