use crate::driver::DeviceDriver;

// Callers guarantee block_size is a whole multiple of the sector size.

pub(crate) fn raw_write_block<A: DeviceDriver>(drive: &mut A, block_size: usize, data: &[u8], index: u64) {
    let sector_size = drive.get_sector_size();
    if block_size == sector_size {
        drive.write_sector(index, data);
    } else {
        let ratio = (block_size / sector_size) as u64;
        let start = index * ratio;

        for (i, sector) in data.chunks(sector_size).enumerate() {
            log::trace!("writing sector {} of block {}", start + i as u64, index);
            drive.write_sector(start + i as u64, sector);
        }
    }
}

pub(crate) fn raw_read_block<A: DeviceDriver>(drive: &A, block_size: usize, index: u64) -> Vec<u8> {
    let sector_size = drive.get_sector_size();
    if block_size == sector_size {
        drive.read_sector(index)
    } else {
        let ratio = (block_size / sector_size) as u64;
        let start = index * ratio;

        let mut buffer = Vec::with_capacity(block_size);
        for i in start..start + ratio {
            buffer.append(&mut drive.read_sector(i));
        }
        buffer
    }
}
