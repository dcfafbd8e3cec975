mod cli;

use std::io;
use std::path::Path;
use std::{fs, process};

use blockfs::util::format::pretty_size_from_bytes;
use blockfs::{Error, FileSystem, InodeId, OpenMode, Result};
use clap::Parser;
use cli::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let fs = match run(&cli) {
        Ok(fs) => fs,
        Err(err) => {
            log::error!("{} (errno {})", err, err.errno());
            process::exit(1);
        }
    };

    if let Some(image) = &cli.image {
        if let Err(err) = write_image(&fs, image) {
            log::error!("unable to write image {}: {}", image.display(), err);
            process::exit(1);
        }
        log::info!("wrote disk image to {}", image.display());
    }
}

fn run(cli: &Cli) -> Result<FileSystem> {
    let mut fs = FileSystem::with_config(cli.config())?;
    println!("Superblock: {:?}", fs.read_superblock()?);

    for path in &cli.files {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("skipping {}: {}", path.display(), err);
                continue;
            }
        };
        match import(&mut fs, path, &data) {
            Ok(id) => log::info!("imported {} as inode {}", path.display(), id),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => log::warn!("skipping {}: {}", path.display(), err),
        }
    }

    let root = fs.root();
    for entry in fs.list_directory(root)? {
        let inode = fs.stat(entry.inode)?;
        println!("{:>4} {:<12} {:>10}", entry.inode, entry.name, pretty_size_from_bytes(inode.size()));
    }
    let block_size = fs.block_size() as u64;
    println!(
        "{} free in {} blocks, {} inodes free",
        pretty_size_from_bytes(fs.free_blocks() as u64 * block_size),
        fs.free_blocks(),
        fs.free_inodes()?
    );
    Ok(fs)
}

fn write_image(fs: &FileSystem, image: &Path) -> io::Result<()> {
    fs::write(image, fs.device().as_bytes())
}

fn import(fs: &mut FileSystem, path: &Path, data: &[u8]) -> Result<InodeId> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let root = fs.root();
    if fs.find_inode(&name, root)?.is_some() {
        return Err(Error::AlreadyExists(name));
    }

    let inode = fs.open(&name, root, OpenMode::Create)?;
    if let Err(err) = fs.add_file_to_directory(&name, inode.id(), root) {
        fs.discard(inode.id())?;
        return Err(err);
    }
    if let Err(err) = fs.write_file(inode.id(), data) {
        fs.unlink(&name, root)?;
        return Err(err);
    }

    if fs.read_file(inode.id())? != data {
        return Err(Error::Corrupt {
            block: 0,
            reason: format!("{} reads back differently than it was written", name),
        });
    }
    Ok(inode.id())
}

#[cfg(test)]
mod tests {
    use super::{import, write_image};
    use blockfs::{FileSystem, FsConfig};
    use std::path::Path;

    fn fs() -> FileSystem {
        FileSystem::with_config(FsConfig::new(64 * 1024, 1024, 512, 8)).unwrap()
    }

    #[test]
    fn image_write_failure_is_reported() {
        let fs = fs();
        let missing = std::env::temp_dir().join("blockfs-no-such-dir").join("disk.img");
        assert!(write_image(&fs, &missing).is_err());
    }

    #[test]
    fn image_holds_the_whole_disk() {
        let fs = fs();
        let image = std::env::temp_dir().join(format!("blockfs-{}.img", std::process::id()));
        write_image(&fs, &image).unwrap();
        let bytes = std::fs::read(&image).unwrap();
        std::fs::remove_file(&image).unwrap();
        assert_eq!(bytes.len(), 64 * 1024);
        assert_eq!(&bytes[..], fs.device().as_bytes());
    }

    #[test]
    fn import_links_and_verifies() {
        let mut fs = fs();
        let id = import(&mut fs, Path::new("/tmp/notes.txt"), b"hello").unwrap();
        assert_eq!(fs.get_correct_inode("notes.txt", fs.root()).unwrap().id(), id);
        assert!(matches!(
            import(&mut fs, Path::new("/other/notes.txt"), b"again"),
            Err(blockfs::Error::AlreadyExists(_))
        ));
    }
}
