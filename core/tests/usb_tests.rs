//! USB partition + FAT32 format workflow tests

mod common;

use aroma_core::disk::mbr::{MBR_SIGNATURE_OFFSET, PARTITION_TABLE_OFFSET};
use aroma_core::disk::planner::{FAT32_LBA_TYPE, SECONDARY_TYPE};
use aroma_core::disk::{format_usb_fat, partition_usb, MasterBootRecord};
use aroma_core::fs::verify_fat32;
use aroma_core::mount::{MountState, Volume};
use aroma_core::InstallerError;
use common::SparseDisk;

fn le32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

#[test]
fn test_partition_4gib_drive_end_to_end() {
    let mut disk = SparseDisk::with_gib(4);
    let mut mounts = MountState::new();
    mounts.set_mounted(Volume::UsbFat);
    mounts.set_mounted(Volume::SdCard);

    let plan = partition_usb(&mut disk, 80, &mut mounts).unwrap();

    assert_eq!(plan.align_sectors, 32_768);
    assert_eq!(plan.fat.start_sector, 32_768);
    assert_eq!(plan.fat.size_sectors, 6_710_886);
    assert_eq!(plan.secondary.start_sector, 6_750_208);
    assert_eq!(plan.secondary.size_sectors, 1_638_400);

    let mbr = disk.sector(0);
    let e1 = PARTITION_TABLE_OFFSET;
    let e2 = PARTITION_TABLE_OFFSET + 16;
    assert_eq!(mbr[e1], 0x00);
    assert_eq!(mbr[e1 + 4], FAT32_LBA_TYPE);
    assert_eq!(le32(&mbr, e1 + 8), 32_768);
    assert_eq!(le32(&mbr, e1 + 12), 6_710_886);
    assert_eq!(mbr[e2 + 4], SECONDARY_TYPE);
    assert_eq!(le32(&mbr, e2 + 8), 6_750_208);
    assert_eq!(le32(&mbr, e2 + 12), 1_638_400);
    assert!(mbr[e2 + 16..MBR_SIGNATURE_OFFSET].iter().all(|&b| b == 0));
    assert_eq!(&mbr[510..512], &[0x55, 0xAA]);
    // No boot code is written
    assert!(mbr[..PARTITION_TABLE_OFFSET].iter().all(|&b| b == 0));

    let info = verify_fat32(&mut disk, 32_768).unwrap();
    assert_eq!(info.total_sectors, 6_710_886);
    assert_eq!(info.sectors_per_cluster, 8);
    assert_eq!(info.label_str(), "AROMA");

    assert!(!mounts.is_mounted(Volume::UsbFat));
    assert!(mounts.is_mounted(Volume::SdCard));
    // partition_usb and the chained format each bring the device up
    assert_eq!(disk.init_calls, 2);
}

#[test]
fn test_full_share_leaves_slot_two_empty() {
    let mut disk = SparseDisk::with_gib(2);
    let plan = partition_usb(&mut disk, 100, &mut MountState::new()).unwrap();

    assert!(!plan.secondary.is_present());
    let mbr = disk.sector(0);
    assert!(mbr[PARTITION_TABLE_OFFSET + 16..PARTITION_TABLE_OFFSET + 32]
        .iter()
        .all(|&b| b == 0));
    assert_eq!(
        le32(&mbr, PARTITION_TABLE_OFFSET + 12) as u64,
        plan.fat.size_sectors
    );
    verify_fat32(&mut disk, plan.fat.start_sector).unwrap();
}

#[test]
fn test_small_drive_uses_1mib_alignment() {
    // 512 MiB
    let mut disk = SparseDisk::new(1_048_576, 512);
    let plan = partition_usb(&mut disk, 100, &mut MountState::new()).unwrap();

    assert_eq!(plan.align_sectors, 2048);
    assert_eq!(plan.fat.start_sector, 2048);
    assert_eq!(plan.fat.size_sectors, 1_048_576 - 2048);
    verify_fat32(&mut disk, 2048).unwrap();
}

#[test]
fn test_4k_sector_drive() {
    // 2 GiB of 4 KiB sectors
    let mut disk = SparseDisk::new(524_288, 4096);
    let plan = partition_usb(&mut disk, 80, &mut MountState::new()).unwrap();

    assert_eq!(plan.align_sectors, 4096);
    assert_eq!(plan.fat.size_sectors, 419_430);
    assert_eq!(plan.secondary.start_sector, 425_984);
    assert_eq!(plan.secondary.size_sectors, 98_304);

    let mbr = disk.sector(0);
    assert_eq!(mbr.len(), 4096);
    assert_eq!(&mbr[510..512], &[0x55, 0xAA]);
    assert!(mbr[512..].iter().all(|&b| b == 0));

    let info = verify_fat32(&mut disk, 4096).unwrap();
    assert_eq!(info.sectors_per_cluster, 1);
}

#[test]
fn test_mbr_write_failure_skips_format() {
    let mut disk = SparseDisk::with_gib(4);
    disk.fail_write_at = Some(0);

    let err = partition_usb(&mut disk, 80, &mut MountState::new()).unwrap_err();

    assert_eq!(err, InstallerError::IoWriteError);
    assert!(disk.is_blank());
    assert_eq!(disk.write_calls, 0);
    assert_eq!(disk.init_calls, 1);
}

#[test]
fn test_init_failure_touches_nothing() {
    let mut disk = SparseDisk::with_gib(4);
    disk.fail_init = true;

    let err = partition_usb(&mut disk, 80, &mut MountState::new()).unwrap_err();

    assert_eq!(err, InstallerError::DeviceInitError);
    assert!(disk.is_blank());
}

#[test]
fn test_invalid_percent_rejected_before_writing() {
    let mut disk = SparseDisk::with_gib(4);
    let err = partition_usb(&mut disk, 101, &mut MountState::new()).unwrap_err();

    assert_eq!(err, InstallerError::InvalidFatPercent);
    assert!(disk.is_blank());
}

#[test]
fn test_format_failure_after_mbr_keeps_table() {
    let mut disk = SparseDisk::with_gib(4);
    // Boot sector of partition 1
    disk.fail_write_at = Some(32_768);

    let err = partition_usb(&mut disk, 80, &mut MountState::new()).unwrap_err();

    assert!(matches!(err, InstallerError::Filesystem(_)));
    let mbr = disk.sector(0);
    assert_eq!(&mbr[510..512], &[0x55, 0xAA]);
}

#[test]
fn test_format_unpartitioned_drive() {
    let mut disk = SparseDisk::with_gib(4);
    let err = format_usb_fat(&mut disk, &mut MountState::new()).unwrap_err();
    assert_eq!(err, InstallerError::PartitionTableMissing);
    assert!(disk.is_blank());
}

#[test]
fn test_reformat_existing_partition() {
    let mut disk = SparseDisk::with_gib(2);
    let plan = partition_usb(&mut disk, 50, &mut MountState::new()).unwrap();
    let mbr_before = disk.sector(0);

    // Leave junk in the root directory cluster, then reformat
    let info = verify_fat32(&mut disk, plan.fat.start_sector).unwrap();
    let root = plan.fat.start_sector + info.reserved_sectors as u64 + 2 * info.fat_size as u64;
    let mut junk = disk.sector(root);
    junk[64..96].fill(0x41);
    disk.sectors.insert(root, junk);

    let mut mounts = MountState::new();
    mounts.set_mounted(Volume::UsbFat);
    let reformatted = format_usb_fat(&mut disk, &mut mounts).unwrap();

    assert_eq!(reformatted, info);
    assert_eq!(disk.sector(0), mbr_before);
    assert!(disk.sector(root)[64..96].iter().all(|&b| b == 0));
    assert!(!mounts.is_mounted(Volume::UsbFat));
}

#[test]
fn test_mbr_reads_back_as_written() {
    let mut disk = SparseDisk::with_gib(4);
    let plan = partition_usb(&mut disk, 30, &mut MountState::new()).unwrap();

    let mbr = MasterBootRecord::read_from(&mut disk).unwrap();
    let fat = mbr.fat_partition().unwrap();
    assert_eq!(fat.start_lba as u64, plan.fat.start_sector);
    assert_eq!(fat.sector_count as u64, plan.fat.size_sectors);
    let second = mbr.entry(1).unwrap();
    assert_eq!(second.type_id, SECONDARY_TYPE);
    assert_eq!(second.start_lba as u64, plan.secondary.start_sector);
}
