use std::os::raw::c_int;

use thiserror::Error;

use crate::consts::{BlockIndex, InodeId};

pub type ErrorNum = c_int;

#[derive(Debug, Error)]
pub enum Error {
    #[error("inode table is full")]
    InodeTableFull,

    #[error("disk is full: {needed} blocks needed, {available} available")]
    DiskFull { needed: u32, available: u32 },

    #[error("file too large: {requested} bytes exceeds the {limit} byte limit")]
    FileTooLarge { requested: u64, limit: u64 },

    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("inode {0} is not in use")]
    NoSuchInode(InodeId),

    #[error("inode {0} is not a directory")]
    NotADirectory(InodeId),

    #[error("inode {0} is a directory")]
    IsADirectory(InodeId),

    #[error("entry already exists: {0}")]
    AlreadyExists(String),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("directory {0} has no room for another entry")]
    DirectoryFull(InodeId),

    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("the root directory cannot be unlinked")]
    RootDirectory,

    #[error("inode {0} is still linked from a directory")]
    StillLinked(InodeId),

    #[error("no superblock found, the disk is not formatted")]
    NotFormatted,

    #[error("unable to encode or decode the record in block {block}: {source}")]
    Codec {
        block: u32,
        #[source]
        source: bincode::Error,
    },

    #[error("corrupt block {block}: {reason}")]
    Corrupt { block: u32, reason: String },

    #[error("block {index} out of range ({count} blocks)")]
    OutOfRange { index: u32, count: u32 },

    #[error("{len} bytes do not fit in a {block_size} byte block")]
    BlockOverflow { len: usize, block_size: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn errno(&self) -> ErrorNum {
        match self {
            Error::InodeTableFull | Error::DiskFull { .. } | Error::DirectoryFull(_) => libc::ENOSPC,
            Error::FileTooLarge { .. } => libc::EFBIG,
            Error::NotFound(_) | Error::NoSuchInode(_) => libc::ENOENT,
            Error::NotADirectory(_) => libc::ENOTDIR,
            Error::IsADirectory(_) => libc::EISDIR,
            Error::AlreadyExists(_) => libc::EEXIST,
            Error::DirectoryNotEmpty(_) => libc::ENOTEMPTY,
            Error::InvalidName(_) | Error::InvalidConfig(_) => libc::EINVAL,
            Error::RootDirectory | Error::StillLinked(_) => libc::EBUSY,
            Error::NotFormatted
            | Error::Codec { .. }
            | Error::Corrupt { .. }
            | Error::OutOfRange { .. }
            | Error::BlockOverflow { .. } => libc::EIO,
        }
    }

    /// The disk image is inconsistent and no recovery is defined. Callers should stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NotFormatted
                | Error::Codec { .. }
                | Error::Corrupt { .. }
                | Error::OutOfRange { .. }
                | Error::BlockOverflow { .. }
                | Error::NotADirectory(_)
        )
    }

    /// Attaches the block a record was read from or written to.
    pub(crate) fn at_block(self, block: BlockIndex) -> Error {
        match self {
            Error::Codec { source, .. } => Error::Codec { block: block.get(), source },
            other => other,
        }
    }
}
