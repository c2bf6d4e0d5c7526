// Two-partition MBR layout planner (FAT32 + secondary)

use super::geometry::{DiskGeometry, MAX_MBR_SECTORS};
use crate::error::{InstallerError, InstallerResult};

/// FAT32 with LBA addressing
pub const FAT32_LBA_TYPE: u8 = 0x0C;

/// Secondary partition (NTFS/exFAT id)
pub const SECONDARY_TYPE: u8 = 0x07;

/// One planned partition. `size_sectors == 0` means the slot is unused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlannedPartition {
    pub start_sector: u64,
    pub size_sectors: u64,
    pub type_id: u8,
}

impl PlannedPartition {
    pub const fn absent(type_id: u8) -> Self {
        Self {
            start_sector: 0,
            size_sectors: 0,
            type_id,
        }
    }

    pub fn is_present(&self) -> bool {
        self.size_sectors > 0
    }

    /// First sector past the partition
    pub fn end_sector(&self) -> u64 {
        self.start_sector + self.size_sectors
    }
}

/// Result of [`plan_partitions`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    pub align_sectors: u64,
    pub fat: PlannedPartition,
    pub secondary: PlannedPartition,
}

impl PartitionPlan {
    /// Entries in MBR slot order
    pub fn entries(&self) -> [PlannedPartition; 2] {
        [self.fat, self.secondary]
    }
}

#[inline]
fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

/// Compute aligned partition boundaries for `geometry`
///
/// Partition 1 (FAT32) starts one alignment unit in and gets `fat_percent`
/// of the disk, never less than 1 GiB when the disk can hold that. The rest
/// of the disk, starting on the next alignment boundary, becomes partition 2.
/// Sizes beyond the 32-bit MBR field are truncated to `0xFFFFFFFF`.
pub fn plan_partitions(geometry: &DiskGeometry, fat_percent: u8) -> InstallerResult<PartitionPlan> {
    if fat_percent > 100 {
        return Err(InstallerError::InvalidFatPercent);
    }
    geometry.validate()?;

    let total = geometry.total_sectors;
    let align = geometry.align_sectors();
    let gib_sectors = geometry.sectors_per_gib();

    // Sector 0 is the MBR; the first usable unit has to exist
    if total <= align {
        return Err(InstallerError::DiskTooSmall);
    }

    let fat_start = align;
    let mut fat_size = (total as u128 * fat_percent as u128 / 100) as u64;
    if fat_size < gib_sectors && total >= gib_sectors + align {
        fat_size = gib_sectors;
    }
    fat_size = fat_size.min(MAX_MBR_SECTORS);
    if fat_start + fat_size > total {
        fat_size = total - fat_start;
    }
    if fat_size == 0 {
        return Err(InstallerError::FatPartitionEmpty);
    }

    let fat = PlannedPartition {
        start_sector: fat_start,
        size_sectors: fat_size,
        type_id: FAT32_LBA_TYPE,
    };

    let mut secondary = PlannedPartition::absent(SECONDARY_TYPE);
    if fat_percent < 100 {
        let start = align_up(fat.end_sector(), align);
        // Unaddressable or past the end: drop partition 2 instead of failing
        if start < total && start <= MAX_MBR_SECTORS {
            secondary.start_sector = start;
            secondary.size_sectors = (total - start).min(MAX_MBR_SECTORS);
        }
    }

    Ok(PartitionPlan {
        align_sectors: align,
        fat,
        secondary,
    })
}
