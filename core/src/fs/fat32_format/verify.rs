// FAT32 post-format verification

use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

use super::format::{
    BACKUP_BOOT_SECTOR, FAT_EOC, FAT_MEDIA_ENTRY, FSINFO_LEAD_SIG, FSINFO_SECTOR,
    FSINFO_STRUC_SIG, FSINFO_TRAIL_SIG, FS_TYPE, NUM_FATS, OEM_NAME, ROOT_CLUSTER,
};
use super::Fat32Error;
use crate::aligned::AlignedBuffer;

/// What the boot sector of a verified volume says
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fat32VolumeInfo {
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_size: u32,
    pub volume_id: u32,
    pub label: [u8; 11],
}

impl Fat32VolumeInfo {
    /// Label with the space padding removed
    pub fn label_str(&self) -> &str {
        let end = self.label.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        core::str::from_utf8(&self.label[..end]).unwrap_or("")
    }
}

fn le16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn le32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_sector<B: BlockIo>(block_io: &mut B, lba: u64, buf: &mut [u8]) -> Result<(), Fat32Error> {
    block_io
        .read_blocks(Lba(lba), buf)
        .map_err(|_| Fat32Error::IoError)
}

fn check(ok: bool) -> Result<(), Fat32Error> {
    if ok {
        Ok(())
    } else {
        Err(Fat32Error::Corrupted)
    }
}

/// Verify FAT32 filesystem integrity after formatting
pub fn verify_fat32<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
) -> Result<Fat32VolumeInfo, Fat32Error> {
    let sector_size = block_io.block_size().to_u32();
    let mut buffer = AlignedBuffer::ios(sector_size as usize).ok_or(Fat32Error::AllocationError)?;
    let mut backup = AlignedBuffer::ios(sector_size as usize).ok_or(Fat32Error::AllocationError)?;

    // Boot sector
    read_sector(block_io, partition_lba_start, &mut buffer)?;
    check(buffer[510] == 0x55 && buffer[511] == 0xAA)?;
    check(&buffer[3..11] == OEM_NAME)?;
    if le16(&buffer, 11) as u32 != sector_size {
        return Err(Fat32Error::InvalidBlockSize);
    }
    check(buffer[16] == NUM_FATS)?;
    check(le32(&buffer, 44) == ROOT_CLUSTER)?;
    check(le16(&buffer, 48) == FSINFO_SECTOR)?;
    check(le16(&buffer, 50) == BACKUP_BOOT_SECTOR)?;
    check(&buffer[82..90] == FS_TYPE)?;

    let mut label = [0u8; 11];
    label.copy_from_slice(&buffer[71..82]);
    let info = Fat32VolumeInfo {
        total_sectors: le32(&buffer, 32),
        sectors_per_cluster: buffer[13],
        reserved_sectors: le16(&buffer, 14),
        fat_size: le32(&buffer, 36),
        volume_id: le32(&buffer, 67),
        label,
    };
    check(info.sectors_per_cluster.is_power_of_two())?;
    check(info.fat_size > 0)?;

    // Backup boot sector must be an exact copy
    read_sector(
        block_io,
        partition_lba_start + BACKUP_BOOT_SECTOR as u64,
        &mut backup,
    )?;
    check(*buffer == *backup)?;

    // FSInfo
    read_sector(block_io, partition_lba_start + FSINFO_SECTOR as u64, &mut buffer)?;
    check(le32(&buffer, 0) == FSINFO_LEAD_SIG)?;
    check(le32(&buffer, 484) == FSINFO_STRUC_SIG)?;
    check(le32(&buffer, 508) == FSINFO_TRAIL_SIG)?;

    // Both FATs start with media entry, EOC, root EOC
    for fat in 0..NUM_FATS as u64 {
        let lba = partition_lba_start + info.reserved_sectors as u64 + fat * info.fat_size as u64;
        read_sector(block_io, lba, &mut buffer)?;
        check(le32(&buffer, 0) == FAT_MEDIA_ENTRY)?;
        check(le32(&buffer, 4) == FAT_EOC)?;
        check(le32(&buffer, 8) == FAT_EOC)?;
    }

    Ok(info)
}
