use crate::driver::DeviceDriver;

/// Volatile disk: one contiguous byte arena owned by the process.
pub struct MemoryDrive {
    data: Vec<u8>,
    sector_size: usize,
}

impl MemoryDrive {
    pub fn new(bytes: u64, sector_size: usize) -> MemoryDrive {
        MemoryDrive { data: vec![0; bytes as usize], sector_size }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Raw access for tests that need to damage an image.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn sector_range(&self, index: u64) -> std::ops::Range<usize> {
        let start = index as usize * self.sector_size;
        start..start + self.sector_size
    }
}

impl DeviceDriver for MemoryDrive {
    fn get_sector_count(&self) -> u64 {
        (self.data.len() / self.sector_size) as u64
    }

    fn get_sector_size(&self) -> usize {
        self.sector_size
    }

    fn read_sector(&self, index: u64) -> Vec<u8> {
        self.data[self.sector_range(index)].to_vec()
    }

    fn write_sector(&mut self, index: u64, data: &[u8]) {
        let range = self.sector_range(index);
        self.data[range].copy_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDrive;
    use crate::driver::DeviceDriver;

    #[test]
    fn read_write_sectors() {
        let mut drive = MemoryDrive::new(1024 * 512, 512);
        assert_eq!(drive.get_sector_count(), 1024);
        assert_eq!(drive.get_size(), 1024 * 512);

        let sector0 = vec![0x42; 512];
        let sector1 = vec![0x1; 512];
        let sector1023 = vec![0x52; 512];

        drive.write_sector(0, &sector0);
        drive.write_sector(1, &sector1);
        drive.write_sector(1023, &sector1023);

        assert_eq!(drive.read_sector(0), sector0);
        assert_eq!(drive.read_sector(1), sector1);
        assert_eq!(drive.read_sector(1023), sector1023);
        assert_eq!(drive.read_sector(2), vec![0; 512]);
        assert_eq!(&drive.as_bytes()[512..1024], sector1.as_slice());
    }
}
