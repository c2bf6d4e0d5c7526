// Disk geometry and the block device contract used by the USB workflows

use gpt_disk_io::BlockIo;

use crate::error::{InstallerError, InstallerResult};

pub const MIB: u64 = 1024 * 1024;
pub const GIB: u64 = 1024 * MIB;

/// Largest sector count an MBR entry can hold.
pub const MAX_MBR_SECTORS: u64 = 0xFFFF_FFFF;

/// Sector count and sector size of a physical disk
///
/// Read once from the device before partitioning; nothing changes it while
/// an operation is in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiskGeometry {
    pub total_sectors: u64,
    pub sector_size: u32,
}

impl DiskGeometry {
    pub const fn new(total_sectors: u64, sector_size: u32) -> Self {
        Self {
            total_sectors,
            sector_size,
        }
    }

    /// Largest sector size the planner and the FAT32 formatter accept.
    pub const MAX_SECTOR_SIZE: u32 = 4096;

    /// Sector size must hold an MBR, be a power of two and be at most 4 KiB,
    /// which keeps `align_sectors()` nonzero.
    pub fn validate(&self) -> InstallerResult<()> {
        if self.sector_size < 512
            || self.sector_size > Self::MAX_SECTOR_SIZE
            || !self.sector_size.is_power_of_two()
        {
            return Err(InstallerError::InvalidGeometry);
        }
        Ok(())
    }

    pub fn size_bytes(&self) -> u128 {
        self.total_sectors as u128 * self.sector_size as u128
    }

    pub fn size_mb(&self) -> u64 {
        (self.size_bytes() / MIB as u128) as u64
    }

    /// Drives under 1 GiB get a single FAT32 partition and 1 MiB alignment.
    pub fn is_small(&self) -> bool {
        self.size_bytes() < GIB as u128
    }

    pub fn sectors_for_bytes(&self, bytes: u64) -> u64 {
        bytes / self.sector_size as u64
    }

    pub fn sectors_per_gib(&self) -> u64 {
        self.sectors_for_bytes(GIB)
    }

    /// Partition alignment in sectors: 16 MiB on >= 1 GiB media, else 1 MiB.
    pub fn align_sectors(&self) -> u64 {
        if self.is_small() {
            self.sectors_for_bytes(MIB)
        } else {
            self.sectors_for_bytes(16 * MIB)
        }
    }
}

/// Raw block device the installer partitions
///
/// Sector writes go through [`BlockIo::write_blocks`]; this trait adds the
/// bring-up step and the device-info query on top.
pub trait DiskDevice: BlockIo {
    /// Bring the device up. Called before every partition or format pass.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Total sectors and sector size as reported by the device.
    fn device_info(&mut self) -> Result<DiskGeometry, Self::Error> {
        let total_sectors = self.num_blocks()?;
        Ok(DiskGeometry::new(total_sectors, self.block_size().to_u32()))
    }
}

/// Initialize `disk`, mapping failure to `DeviceInitError`
pub fn initialize_device<D: DiskDevice>(disk: &mut D) -> InstallerResult<()> {
    disk.initialize()
        .map_err(|_| InstallerError::DeviceInitError)
}

/// Read and validate the geometry of `disk`
pub fn read_geometry<D: DiskDevice>(disk: &mut D) -> InstallerResult<DiskGeometry> {
    let geometry = disk
        .device_info()
        .map_err(|_| InstallerError::DeviceInfoError)?;
    geometry.validate()?;
    Ok(geometry)
}
