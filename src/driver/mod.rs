pub(crate) mod memory_drive;

pub use memory_drive::MemoryDrive;

/// Sector-addressed storage underneath the block layer.
///
/// Callers stay within `get_sector_count()` and pass exactly `get_sector_size()` bytes;
/// the block layer checks both before reaching the driver.
pub trait DeviceDriver {
    fn get_sector_count(&self) -> u64;
    fn get_sector_size(&self) -> usize;
    fn read_sector(&self, index: u64) -> Vec<u8>;
    fn write_sector(&mut self, index: u64, data: &[u8]);

    fn get_size(&self) -> u64 {
        self.get_sector_count() * self.get_sector_size() as u64
    }
}
