// FAT32 filesystem formatter

use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

use super::Fat32Error;
use crate::aligned::AlignedBuffer;

pub(super) const OEM_NAME: &[u8; 8] = b"AROMA   ";
pub(super) const FS_TYPE: &[u8; 8] = b"FAT32   ";
pub(super) const RESERVED_SECTORS: u16 = 32;
pub(super) const NUM_FATS: u8 = 2;
pub(super) const ROOT_CLUSTER: u32 = 2;
pub(super) const FSINFO_SECTOR: u16 = 1;
pub(super) const BACKUP_BOOT_SECTOR: u16 = 6;
pub(super) const MEDIA_FIXED: u8 = 0xF8;

pub(super) const FSINFO_LEAD_SIG: u32 = 0x4161_5252;
pub(super) const FSINFO_STRUC_SIG: u32 = 0x6141_7272;
pub(super) const FSINFO_TRAIL_SIG: u32 = 0xAA55_0000;

pub(super) const FAT_MEDIA_ENTRY: u32 = 0x0FFF_FFF8;
pub(super) const FAT_EOC: u32 = 0x0FFF_FFFF;

const ATTR_VOLUME_ID: u8 = 0x08;

/// ~65MB, smallest partition accepted
const MIN_PARTITION_BYTES: u64 = 133_120 * 512;

const MIN_CLUSTERS: u64 = 65_525;
const MAX_CLUSTERS: u64 = 0x0FFF_FFF4;

/// Bytes zeroed per write while clearing the FAT area
const ZERO_CHUNK_BYTES: usize = 64 * 1024;

/// Label and serial of a new volume
#[derive(Copy, Clone, Debug)]
pub struct Fat32Params<'a> {
    pub label: &'a str,
    pub volume_id: u32,
}

/// Sizes derived from the partition before anything is written
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fat32Layout {
    pub sector_size: u32,
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_size: u32,
    pub cluster_count: u32,
}

impl Fat32Layout {
    pub fn compute(partition_sectors: u64, sector_size: u32) -> Result<Self, Fat32Error> {
        if !(512..=4096).contains(&sector_size) || !sector_size.is_power_of_two() {
            return Err(Fat32Error::InvalidBlockSize);
        }
        if partition_sectors > u32::MAX as u64 {
            return Err(Fat32Error::PartitionTooLarge);
        }
        let ss = sector_size as u64;
        let size_bytes = partition_sectors * ss;
        if size_bytes < MIN_PARTITION_BYTES {
            return Err(Fat32Error::PartitionTooSmall);
        }

        let sectors_per_cluster = (cluster_bytes_for(size_bytes) / sector_size).max(1);
        let spc = sectors_per_cluster as u64;
        let reserved = RESERVED_SECTORS as u64;

        // Every cluster costs spc sectors of data plus 4 bytes in each FAT
        let data_area = partition_sectors - reserved;
        let est_clusters = (data_area * ss).div_ceil(spc * ss + 4 * NUM_FATS as u64);
        let fat_size = ((est_clusters + 2) * 4).div_ceil(ss);

        let meta = reserved + fat_size * NUM_FATS as u64;
        if meta + spc > partition_sectors {
            return Err(Fat32Error::PartitionTooSmall);
        }
        let cluster_count = (partition_sectors - meta) / spc;
        if cluster_count < MIN_CLUSTERS {
            return Err(Fat32Error::PartitionTooSmall);
        }
        if cluster_count > MAX_CLUSTERS {
            return Err(Fat32Error::PartitionTooLarge);
        }

        Ok(Self {
            sector_size,
            total_sectors: partition_sectors as u32,
            sectors_per_cluster: sectors_per_cluster as u8,
            reserved_sectors: RESERVED_SECTORS,
            fat_size: fat_size as u32,
            cluster_count: cluster_count as u32,
        })
    }

    /// Partition-relative sector of the first FAT
    pub fn fat_start(&self) -> u64 {
        self.reserved_sectors as u64
    }

    /// Partition-relative sector of cluster 2
    pub fn data_start(&self) -> u64 {
        self.fat_start() + self.fat_size as u64 * NUM_FATS as u64
    }
}

/// Cluster size by partition size (Microsoft's FAT32 defaults)
fn cluster_bytes_for(size_bytes: u64) -> u32 {
    const MB: u64 = 1024 * 1024;
    match size_bytes {
        s if s <= 260 * MB => 512,
        s if s <= 8 * 1024 * MB => 4096,
        s if s <= 16 * 1024 * MB => 8192,
        s if s <= 32 * 1024 * MB => 16384,
        _ => 32768,
    }
}

/// Upper-cased, space-padded 8.3 volume label
pub fn encode_label(label: &str) -> Result<[u8; 11], Fat32Error> {
    let mut out = [b' '; 11];
    if label.is_empty() {
        out.copy_from_slice(b"NO NAME    ");
        return Ok(out);
    }
    if label.len() > 11 {
        return Err(Fat32Error::InvalidLabel);
    }
    for (slot, &c) in out.iter_mut().zip(label.as_bytes()) {
        if !c.is_ascii() || c < 0x20 || b"\"*+,./:;<=>?[\\]|".contains(&c) {
            return Err(Fat32Error::InvalidLabel);
        }
        *slot = c.to_ascii_uppercase();
    }
    Ok(out)
}

#[inline]
fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn encode_boot_sector(
    buf: &mut [u8],
    layout: &Fat32Layout,
    hidden_sectors: u32,
    volume_id: u32,
    label: &[u8; 11],
) {
    buf.fill(0);
    buf[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]); // JMP short + NOP
    buf[3..11].copy_from_slice(OEM_NAME);
    put_u16(buf, 11, layout.sector_size as u16);
    buf[13] = layout.sectors_per_cluster;
    put_u16(buf, 14, layout.reserved_sectors);
    buf[16] = NUM_FATS;
    buf[21] = MEDIA_FIXED;
    put_u16(buf, 24, 63); // sectors per track
    put_u16(buf, 26, 255); // heads
    put_u32(buf, 28, hidden_sectors);
    put_u32(buf, 32, layout.total_sectors);
    put_u32(buf, 36, layout.fat_size);
    put_u32(buf, 44, ROOT_CLUSTER);
    put_u16(buf, 48, FSINFO_SECTOR);
    put_u16(buf, 50, BACKUP_BOOT_SECTOR);
    buf[64] = 0x80; // drive number
    buf[66] = 0x29; // extended boot signature
    put_u32(buf, 67, volume_id);
    buf[71..82].copy_from_slice(label);
    buf[82..90].copy_from_slice(FS_TYPE);

    // Not bootable: halt
    buf[90] = 0xF4; // HLT
    buf[91] = 0xEB; // JMP $-1
    buf[92] = 0xFD;

    buf[510] = 0x55;
    buf[511] = 0xAA;
}

fn encode_fsinfo(buf: &mut [u8], free_clusters: u32) {
    buf.fill(0);
    put_u32(buf, 0, FSINFO_LEAD_SIG);
    put_u32(buf, 484, FSINFO_STRUC_SIG);
    put_u32(buf, 488, free_clusters);
    put_u32(buf, 492, ROOT_CLUSTER + 1); // next free
    put_u32(buf, 508, FSINFO_TRAIL_SIG);
}

fn write_sector<B: BlockIo>(block_io: &mut B, lba: u64, buf: &[u8]) -> Result<(), Fat32Error> {
    block_io
        .write_blocks(Lba(lba), buf)
        .map_err(|_| Fat32Error::IoError)
}

/// Zero `count` sectors starting at `lba`
fn zero_sectors<B: BlockIo>(
    block_io: &mut B,
    lba: u64,
    count: u64,
    sector_size: u32,
) -> Result<(), Fat32Error> {
    let ss = sector_size as usize;
    let chunk = AlignedBuffer::ios(ZERO_CHUNK_BYTES.max(ss)).ok_or(Fat32Error::AllocationError)?;
    let per_chunk = (chunk.len() / ss) as u64;

    let mut done = 0u64;
    while done < count {
        let n = (count - done).min(per_chunk);
        write_sector(block_io, lba + done, &chunk[..n as usize * ss])?;
        done += n;
    }
    Ok(())
}

/// Format partition as FAT32
///
/// Clears the reserved area, both FATs and the root cluster, then writes the
/// boot sector, FSInfo, their backups, the initial FAT entries and the
/// volume label entry.
pub fn format_fat32<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    partition_sectors: u64,
    params: &Fat32Params<'_>,
) -> Result<Fat32Layout, Fat32Error> {
    let sector_size = block_io.block_size().to_u32();
    let layout = Fat32Layout::compute(partition_sectors, sector_size)?;
    let label = encode_label(params.label)?;

    #[cfg(feature = "fat32_debug")]
    crate::log_info!(
        "FAT32: {} sectors, {} per cluster, FAT {} sectors, {} clusters",
        layout.total_sectors,
        layout.sectors_per_cluster,
        layout.fat_size,
        layout.cluster_count
    );

    let root_start = layout.data_start();
    zero_sectors(
        block_io,
        partition_lba_start,
        root_start + layout.sectors_per_cluster as u64,
        sector_size,
    )?;

    let mut sector = AlignedBuffer::ios(sector_size as usize).ok_or(Fat32Error::AllocationError)?;

    // Hidden sectors is a 32-bit field; MBR partitions never start higher
    let hidden = partition_lba_start.min(u32::MAX as u64) as u32;
    encode_boot_sector(&mut sector, &layout, hidden, params.volume_id, &label);
    write_sector(block_io, partition_lba_start, &sector)?;
    write_sector(
        block_io,
        partition_lba_start + BACKUP_BOOT_SECTOR as u64,
        &sector,
    )?;

    // Root directory occupies one cluster
    encode_fsinfo(&mut sector, layout.cluster_count - 1);
    write_sector(block_io, partition_lba_start + FSINFO_SECTOR as u64, &sector)?;
    write_sector(
        block_io,
        partition_lba_start + BACKUP_BOOT_SECTOR as u64 + FSINFO_SECTOR as u64,
        &sector,
    )?;

    sector.clear();
    put_u32(&mut sector, 0, FAT_MEDIA_ENTRY);
    put_u32(&mut sector, 4, FAT_EOC);
    put_u32(&mut sector, 8, FAT_EOC); // root directory
    for fat in 0..NUM_FATS as u64 {
        let lba = partition_lba_start + layout.fat_start() + fat * layout.fat_size as u64;
        write_sector(block_io, lba, &sector)?;
    }

    if !params.label.is_empty() {
        sector.clear();
        sector[..11].copy_from_slice(&label);
        sector[11] = ATTR_VOLUME_ID;
        write_sector(block_io, partition_lba_start + root_start, &sector)?;
    }

    block_io.flush().map_err(|_| Fat32Error::IoError)?;
    Ok(layout)
}
