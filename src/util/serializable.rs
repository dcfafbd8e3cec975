use bincode::Options;

use crate::util::error::Result;

pub trait ByteSerializable: Sized {
    fn to_bytes(&self) -> Result<Vec<u8>>;
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// Record encoding shared by the superblock and inode records.
///
/// Records are zero-padded to a whole block on disk, so trailing bytes are allowed.
/// The limit keeps a corrupt length prefix from reading past the buffer.
pub(crate) fn record_codec(limit: usize) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
        .with_limit(limit as u64)
}
