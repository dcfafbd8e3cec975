//! A small block file system on a simulated sector device.
//!
//! The disk is split into fixed regions: a superblock in block 0, one inode
//! record per block, a free-block bitmap and the data blocks. Files address
//! their data through three direct pointers and one indirect block.
//!
//! ```
//! use blockfs::{FileSystem, OpenMode};
//!
//! let mut fs = FileSystem::initialize().unwrap();
//! let root = fs.root();
//! let file = fs.open("hello.txt", root, OpenMode::Create).unwrap();
//! fs.add_file_to_directory("hello.txt", file.id(), root).unwrap();
//! fs.write_file(file.id(), b"hello").unwrap();
//! assert_eq!(fs.read_file(file.id()).unwrap(), b"hello");
//! ```

pub mod config;
pub mod consts;
pub mod driver;
mod io;
pub mod ops;
pub mod structure;
pub mod util;

pub use config::FsConfig;
pub use consts::{BlockIndex, FileName, InodeId, ROOT_INODE};
pub use driver::{DeviceDriver, MemoryDrive};
pub use ops::file::OpenMode;
pub use ops::FileSystem;
pub use structure::inode::{FileEntry, Inode};
pub use structure::superblock::SuperBlock;
pub use util::error::{Error, ErrorNum, Result};
