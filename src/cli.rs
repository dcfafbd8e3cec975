use std::path::PathBuf;

use blockfs::consts::{BLOCK_SIZE, DISK_SIZE, MAX_INODES, SECTOR_SIZE};
use blockfs::FsConfig;
use clap::Parser;

/// Formats an in-memory disk, copies host files into its root directory and
/// prints what ended up on it.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Host files to copy into the root directory
    pub files: Vec<PathBuf>,

    /// Disk size in bytes
    #[arg(long, default_value_t = DISK_SIZE)]
    pub disk_size: u64,

    /// Block size in bytes, a multiple of the sector size
    #[arg(long, default_value_t = BLOCK_SIZE)]
    pub block_size: usize,

    #[arg(long, default_value_t = SECTOR_SIZE)]
    pub sector_size: usize,

    /// Number of inode slots
    #[arg(long, default_value_t = MAX_INODES)]
    pub max_inodes: u32,

    /// Write the raw disk image here when done
    #[arg(long)]
    pub image: Option<PathBuf>,
}

impl Cli {
    pub fn config(&self) -> FsConfig {
        FsConfig::new(self.disk_size, self.block_size, self.sector_size, self.max_inodes)
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_standard_disk() {
        let cli = Cli::parse_from(["blockfs", "a.txt", "b.txt"]);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.config(), blockfs::FsConfig::default());
    }

    #[test]
    fn geometry_flags() {
        let cli = Cli::parse_from(["blockfs", "--disk-size", "262144", "--max-inodes", "16"]);
        let config = cli.config();
        assert_eq!(config.disk_size, 262144);
        assert_eq!(config.max_inodes, 16);
        assert!(cli.image.is_none());
    }
}
