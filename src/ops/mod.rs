use crate::config::FsConfig;
use crate::consts::{BlockIndex, FileName, InodeId, ROOT_INODE, ROOT_NAME};
use crate::driver::{DeviceDriver, MemoryDrive};
use crate::ops::directory::Directory;
use crate::ops::file::{File, OpenMode};
use crate::structure::inode::{FileEntry, Inode};
use crate::structure::superblock::SuperBlock;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

pub mod directory;
pub mod file;

/// The file operations on top of a formatted disk.
///
/// Creating a file and linking it into a directory are separate steps:
/// `open` with [`OpenMode::Create`] only allocates the inode, and
/// [`FileSystem::add_file_to_directory`] makes it reachable by name.
pub struct FileSystem<A: DeviceDriver = MemoryDrive> {
    structure: Structure<A>,
}

impl FileSystem<MemoryDrive> {
    /// Formats a fresh in-memory disk with the default geometry.
    pub fn initialize() -> Result<FileSystem<MemoryDrive>> {
        FileSystem::with_config(FsConfig::default())
    }

    pub fn with_config(config: FsConfig) -> Result<FileSystem<MemoryDrive>> {
        config.validate()?;
        FileSystem::format(MemoryDrive::new(config.disk_size, config.sector_size), &config)
    }
}

impl<A: DeviceDriver> FileSystem<A> {
    pub fn format(device: A, config: &FsConfig) -> Result<FileSystem<A>> {
        let mut structure = Structure::new(device, config)?;

        let mut root = Inode::new(ROOT_INODE, FileName::new(ROOT_NAME), true);
        root.links = 1;
        structure.write_inode(&root)?;
        log::info!("root directory is inode {}", ROOT_INODE);

        Ok(FileSystem { structure })
    }

    pub fn mount(device: A) -> Result<FileSystem<A>> {
        let structure = Structure::mount(device)?;
        let root_id = structure.superblock.root_inode;
        let root = structure.read_inode(root_id)?;
        if !root.valid || !root.is_directory {
            return Err(Error::Corrupt {
                block: structure.inode_block(root_id).get(),
                reason: "root directory is missing".to_string(),
            });
        }
        Ok(FileSystem { structure })
    }

    pub fn into_device(self) -> A {
        self.structure.into_device()
    }

    pub fn device(&self) -> &A {
        self.structure.device()
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.structure.superblock
    }

    /// Decodes block 0 from the disk rather than returning the cached copy.
    pub fn read_superblock(&self) -> Result<SuperBlock> {
        SuperBlock::read(&self.structure.io)
    }

    pub fn root(&self) -> InodeId {
        self.structure.superblock.root_inode
    }

    pub fn block_size(&self) -> usize {
        self.structure.block_size()
    }

    pub fn max_file_size(&self) -> u64 {
        self.structure.max_file_size()
    }

    pub fn open(&mut self, filename: &str, directory: InodeId, mode: OpenMode) -> Result<Inode> {
        match mode {
            OpenMode::Create => self.create_file(filename, directory),
            OpenMode::Read => {
                let inode = self.get_correct_inode(filename, directory)?;
                if !inode.is_directory {
                    let data = inode.read_all(&self.structure)?;
                    log::debug!("opened {} for reading, {} bytes", inode.name, data.len());
                }
                Ok(inode)
            }
            OpenMode::Append => {
                let mut file = File::from_inode(self.get_correct_inode(filename, directory)?)?;
                file.seek_end();
                self.structure.write_inode(&file.inode)?;
                Ok(file.inode)
            }
            OpenMode::Write => Ok(File::from_inode(self.get_correct_inode(filename, directory)?)?.inode),
        }
    }

    /// Allocates a regular file inode without linking it anywhere.
    pub fn create_file(&mut self, filename: &str, parent: InodeId) -> Result<Inode> {
        let name = Self::file_name(filename)?;
        self.directory(parent)?;

        let id = self.structure.find_free_inode()?;
        let inode = Inode::new(id, name, false);
        self.structure.write_inode(&inode)?;
        log::info!("created file {} as inode {}", name, id);
        Ok(inode)
    }

    /// Allocates a directory inode and links it into `parent`.
    pub fn create_directory(&mut self, filename: &str, parent: InodeId) -> Result<Inode> {
        let name = Self::file_name(filename)?;
        if self.directory(parent)?.lookup(&name).is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }

        let id = self.structure.find_free_inode()?;
        self.structure.write_inode(&Inode::new(id, name, true))?;
        let directory = self.structure.read_inode(id)?;
        if let Err(err) = self.link(filename, directory, parent) {
            self.structure.write_inode(&Inode::empty(id))?;
            return Err(err);
        }
        log::info!("created directory {} as inode {}", name, id);
        self.structure.read_inode(id)
    }

    /// Links a regular file into `parent` under `filename`.
    ///
    /// Directories get their single link from [`FileSystem::create_directory`]
    /// and cannot be linked again.
    pub fn add_file_to_directory(&mut self, filename: &str, inode: InodeId, parent: InodeId) -> Result<()> {
        let target = self.live_inode(inode)?;
        if target.is_directory {
            log::warn!("refusing to link directory {} as {}", inode, filename);
            return Err(Error::IsADirectory(inode));
        }
        self.link(filename, target, parent)
    }

    /// Resolves `filename` in `directory` to a live inode.
    pub fn get_correct_inode(&self, filename: &str, directory: InodeId) -> Result<Inode> {
        let id = self
            .find_inode(filename, directory)?
            .ok_or_else(|| Error::NotFound(filename.to_string()))?;
        self.live_inode(id).map_err(|err| match err {
            Error::NoSuchInode(_) => Error::NotFound(filename.to_string()),
            other => other,
        })
    }

    pub fn find_inode(&self, filename: &str, parent: InodeId) -> Result<Option<InodeId>> {
        Ok(self.directory(parent)?.lookup(&FileName::new(filename)))
    }

    /// Writes at the cursor and advances it by the number of bytes written.
    pub fn write_file(&mut self, inode: InodeId, data: &[u8]) -> Result<usize> {
        let mut file = File::from_inode(self.live_inode(inode)?)?;
        let written = file.write(&mut self.structure, data)?;
        log::debug!("wrote {} bytes to inode {}, cursor at {}", written, inode, file.inode.cursor);
        Ok(written)
    }

    pub fn read_file(&self, inode: InodeId) -> Result<Vec<u8>> {
        File::from_inode(self.live_inode(inode)?)?.get_data(&self.structure)
    }

    /// Removes the entry and drops one link; the inode and its blocks are
    /// reclaimed when no links remain.
    pub fn unlink(&mut self, filename: &str, parent: InodeId) -> Result<()> {
        if filename == ROOT_NAME {
            log::warn!("refusing to unlink the root directory");
            return Err(Error::RootDirectory);
        }
        let name = FileName::new(filename);
        let mut directory = self.directory(parent)?;
        let id = directory.lookup(&name).ok_or_else(|| Error::NotFound(filename.to_string()))?;
        if id == ROOT_INODE {
            return Err(Error::RootDirectory);
        }

        let mut target = self.structure.read_inode(id)?;
        if target.valid && target.is_directory && !target.entries.is_empty() {
            return Err(Error::DirectoryNotEmpty(filename.to_string()));
        }

        directory.remove_entry(&name);
        self.structure.write_inode(&directory.inode)?;

        if !target.valid {
            log::warn!("entry {} pointed at unused inode {}", name, id);
            return Ok(());
        }
        target.links = target.links.saturating_sub(1);
        if target.links == 0 {
            self.reclaim(target)
        } else {
            target.touch();
            self.structure.write_inode(&target)
        }
    }

    /// Frees an inode that was created but never linked.
    pub fn discard(&mut self, inode: InodeId) -> Result<()> {
        let target = self.live_inode(inode)?;
        if target.links > 0 {
            return Err(Error::StillLinked(inode));
        }
        self.reclaim(target)
    }

    pub fn list_directory(&self, directory: InodeId) -> Result<Vec<FileEntry>> {
        Ok(self.directory(directory)?.get_entries().to_vec())
    }

    pub fn stat(&self, inode: InodeId) -> Result<Inode> {
        self.live_inode(inode)
    }

    /// Raw slot access; the record is returned whether or not it is in use.
    pub fn read_inode(&self, inode: InodeId) -> Result<Inode> {
        self.structure.read_inode(inode)
    }

    pub fn write_inode(&mut self, inode: &Inode) -> Result<()> {
        self.structure.write_inode(inode)
    }

    pub fn find_free_inode(&self) -> Result<InodeId> {
        self.structure.find_free_inode()
    }

    pub fn find_free_data_block(&self) -> Result<BlockIndex> {
        self.structure.find_free_block()
    }

    pub fn free_blocks(&self) -> u32 {
        self.structure.free_block_count()
    }

    pub fn free_inodes(&self) -> Result<u32> {
        self.structure.free_inode_count()
    }

    fn link(&mut self, filename: &str, mut target: Inode, parent: InodeId) -> Result<()> {
        let name = Self::file_name(filename)?;
        let mut directory = self.directory(parent)?;

        directory.add_entry(name, target.id)?;
        // DirectoryFull surfaces here, before the target's link count changes.
        self.structure.write_inode(&directory.inode)?;

        target.links += 1;
        self.structure.write_inode(&target)?;
        log::debug!("linked {} to inode {} in directory {}", name, target.id, parent);
        Ok(())
    }

    fn reclaim(&mut self, mut inode: Inode) -> Result<()> {
        inode.release_blocks(&mut self.structure)?;
        log::info!("reclaimed inode {} ({})", inode.id, inode.name);
        self.structure.write_inode(&Inode::empty(inode.id))
    }

    fn live_inode(&self, id: InodeId) -> Result<Inode> {
        let inode = self.structure.read_inode(id)?;
        if !inode.valid {
            return Err(Error::NoSuchInode(id));
        }
        Ok(inode)
    }

    fn directory(&self, id: InodeId) -> Result<Directory> {
        Directory::from_inode(self.live_inode(id)?)
    }

    fn file_name(filename: &str) -> Result<FileName> {
        let name = FileName::new(filename);
        if name.is_empty() || filename == ROOT_NAME {
            return Err(Error::InvalidName(filename.to_string()));
        }
        if name.as_bytes().len() < filename.len() {
            log::debug!("file name {:?} truncated to {}", filename, name);
        }
        Ok(name)
    }
}
