// Legacy MBR construction and parsing

use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

use super::planner::{PartitionPlan, PlannedPartition};
use crate::aligned::AlignedBuffer;
use crate::error::{InstallerError, InstallerResult};

pub const PARTITION_TABLE_OFFSET: usize = 446;
pub const PARTITION_ENTRY_SIZE: usize = 16;
pub const MBR_PARTITION_SLOTS: usize = 4;
pub const MBR_SIGNATURE_OFFSET: usize = 510;
pub const MBR_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// One 16-byte partition table entry. CHS fields are left zero; only LBA
/// addressing is used.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MbrPartitionEntry {
    pub status: u8,
    pub type_id: u8,
    pub start_lba: u32,
    pub sector_count: u32,
}

impl MbrPartitionEntry {
    /// Entry for a planned partition. Callers only pass planned values,
    /// which never exceed the 32-bit fields.
    pub fn from_planned(partition: &PlannedPartition) -> Self {
        Self {
            status: 0,
            type_id: partition.type_id,
            start_lba: partition.start_sector as u32,
            sector_count: partition.size_sectors as u32,
        }
    }

    pub fn is_used(&self) -> bool {
        self.type_id != 0 && self.sector_count != 0
    }

    pub fn encode(&self) -> [u8; PARTITION_ENTRY_SIZE] {
        let mut entry = [0u8; PARTITION_ENTRY_SIZE];
        entry[0] = self.status;
        entry[4] = self.type_id;
        entry[8..12].copy_from_slice(&self.start_lba.to_le_bytes());
        entry[12..16].copy_from_slice(&self.sector_count.to_le_bytes());
        entry
    }

    pub fn decode(entry: &[u8; PARTITION_ENTRY_SIZE]) -> Self {
        Self {
            status: entry[0],
            type_id: entry[4],
            start_lba: u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]),
            sector_count: u32::from_le_bytes([entry[12], entry[13], entry[14], entry[15]]),
        }
    }
}

/// Sector-0 image: zero-filled, populated, written once
pub struct MasterBootRecord {
    sector: AlignedBuffer,
}

impl MasterBootRecord {
    fn empty(sector_size: u32) -> InstallerResult<Self> {
        if (sector_size as usize) < MBR_SIGNATURE_OFFSET + 2 {
            return Err(InstallerError::InvalidGeometry);
        }
        let sector =
            AlignedBuffer::ios(sector_size as usize).ok_or(InstallerError::AllocationError)?;
        Ok(Self { sector })
    }

    /// Build the MBR for `plan`. Slot 2 stays empty when partition 2 is absent.
    pub fn build(plan: &PartitionPlan, sector_size: u32) -> InstallerResult<Self> {
        let mut mbr = Self::empty(sector_size)?;
        mbr.set_entry(0, &MbrPartitionEntry::from_planned(&plan.fat));
        if plan.secondary.is_present() {
            mbr.set_entry(1, &MbrPartitionEntry::from_planned(&plan.secondary));
        }
        mbr.sector[MBR_SIGNATURE_OFFSET..MBR_SIGNATURE_OFFSET + 2].copy_from_slice(&MBR_SIGNATURE);
        Ok(mbr)
    }

    /// Read sector 0 of `disk`
    pub fn read_from<B: BlockIo>(disk: &mut B) -> InstallerResult<Self> {
        let mut mbr = Self::empty(disk.block_size().to_u32())?;
        disk.read_blocks(Lba(0), &mut mbr.sector)
            .map_err(|_| InstallerError::IoReadError)?;
        Ok(mbr)
    }

    /// Write to sector 0 of `disk` and flush
    pub fn write_to<B: BlockIo>(&self, disk: &mut B) -> InstallerResult<()> {
        disk.write_blocks(Lba(0), &self.sector)
            .map_err(|_| InstallerError::IoWriteError)?;
        disk.flush().map_err(|_| InstallerError::IoWriteError)
    }

    fn set_entry(&mut self, slot: usize, entry: &MbrPartitionEntry) {
        let offset = PARTITION_TABLE_OFFSET + slot * PARTITION_ENTRY_SIZE;
        self.sector[offset..offset + PARTITION_ENTRY_SIZE].copy_from_slice(&entry.encode());
    }

    pub fn entry(&self, slot: usize) -> Option<MbrPartitionEntry> {
        if slot >= MBR_PARTITION_SLOTS {
            return None;
        }
        let offset = PARTITION_TABLE_OFFSET + slot * PARTITION_ENTRY_SIZE;
        let mut raw = [0u8; PARTITION_ENTRY_SIZE];
        raw.copy_from_slice(&self.sector[offset..offset + PARTITION_ENTRY_SIZE]);
        Some(MbrPartitionEntry::decode(&raw))
    }

    pub fn has_signature(&self) -> bool {
        self.sector[MBR_SIGNATURE_OFFSET..MBR_SIGNATURE_OFFSET + 2] == MBR_SIGNATURE
    }

    /// First used entry with the FAT32 LBA type
    pub fn fat_partition(&self) -> Option<MbrPartitionEntry> {
        if !self.has_signature() {
            return None;
        }
        (0..MBR_PARTITION_SLOTS)
            .filter_map(|slot| self.entry(slot))
            .find(|e| e.is_used() && e.type_id == super::planner::FAT32_LBA_TYPE)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.sector
    }
}
