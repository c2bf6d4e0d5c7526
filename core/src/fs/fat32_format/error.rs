// Common error type for FAT32 formatting operations

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fat32Error {
    IoError,
    PartitionTooSmall,
    PartitionTooLarge,
    InvalidBlockSize,
    InvalidLabel,
    AllocationError,
    /// On-disk structures do not match a freshly formatted volume
    Corrupted,
}

impl Fat32Error {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IoError => "block I/O failed",
            Self::PartitionTooSmall => "partition too small for FAT32",
            Self::PartitionTooLarge => "partition too large for FAT32",
            Self::InvalidBlockSize => "unsupported sector size",
            Self::InvalidLabel => "invalid volume label",
            Self::AllocationError => "out of memory",
            Self::Corrupted => "filesystem structures corrupted",
        }
    }
}
