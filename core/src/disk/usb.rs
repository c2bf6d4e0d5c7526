// USB drive partitioning and FAT32 formatting workflows

use super::geometry::{initialize_device, read_geometry, DiskDevice};
use super::mbr::MasterBootRecord;
use super::planner::{plan_partitions, PartitionPlan};
use crate::config::FAT32_LABEL;
use crate::error::{logged, InstallerError, InstallerResult};
use crate::fs::{format_fat32, verify_fat32, Fat32Params, Fat32VolumeInfo};
use crate::mount::{MountState, Volume};
use crate::{log_error, log_info};

/// Serial for a new FAT32 volume, derived from where it lives on disk
fn volume_id_for(start_lba: u32, sector_count: u32) -> u32 {
    start_lba.rotate_left(16) ^ sector_count ^ 0x4152_4F4D
}

/// Re-partition the USB drive and format partition 1 as FAT32
///
/// Everything on the drive is lost. If the MBR write fails nothing else is
/// touched. The FAT32 volume is left unmounted.
pub fn partition_usb<D: DiskDevice>(
    disk: &mut D,
    fat_percent: u8,
    mounts: &mut MountState,
) -> InstallerResult<PartitionPlan> {
    if mounts.release(Volume::UsbFat) {
        log_info!("Released {} before partitioning", Volume::UsbFat.name());
    }

    initialize_device(disk).map_err(logged)?;
    let geometry = read_geometry(disk).map_err(logged)?;
    let plan = plan_partitions(&geometry, fat_percent)?;

    log_info!(
        "FAT32: {} sectors at {}, second partition: {} sectors at {}",
        plan.fat.size_sectors,
        plan.fat.start_sector,
        plan.secondary.size_sectors,
        plan.secondary.start_sector
    );

    let mbr = MasterBootRecord::build(&plan, geometry.sector_size)?;
    log_info!("Writing MBR...");
    if let Err(e) = mbr.write_to(disk) {
        log_error!("Failed to write MBR!");
        return Err(e);
    }
    drop(mbr);

    format_usb_fat(disk, mounts)?;
    Ok(plan)
}

/// Format the first FAT32 partition of an already partitioned USB drive
pub fn format_usb_fat<D: DiskDevice>(
    disk: &mut D,
    mounts: &mut MountState,
) -> InstallerResult<Fat32VolumeInfo> {
    mounts.release(Volume::UsbFat);

    initialize_device(disk).map_err(logged)?;

    let mbr = MasterBootRecord::read_from(disk)?;
    let entry = mbr
        .fat_partition()
        .ok_or(InstallerError::PartitionTableMissing)?;
    drop(mbr);

    log_info!("Formatting FAT32 partition...");
    let params = Fat32Params {
        label: FAT32_LABEL,
        volume_id: volume_id_for(entry.start_lba, entry.sector_count),
    };
    if let Err(e) = format_fat32(
        disk,
        entry.start_lba as u64,
        entry.sector_count as u64,
        &params,
    ) {
        log_error!("FAT32 format failed: {}", e.as_str());
        return Err(e.into());
    }

    let info = verify_fat32(disk, entry.start_lba as u64)?;
    log_info!("USB drive formatted successfully!");
    Ok(info)
}
