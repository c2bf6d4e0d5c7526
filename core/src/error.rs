//! Installer error types
//!
//! One error enum for the partitioning and FSA layers. Follows the same
//! pattern as `Fat32Error` in the fs module: plain `Copy` variants plus a
//! human-readable description for the status console.

use core::fmt;

use crate::fs::Fat32Error;

/// Errors that can occur while partitioning, formatting or mounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerError {
    /// Block device did not come up
    DeviceInitError,
    /// Sector count / sector size could not be read
    DeviceInfoError,
    /// MBR or data write failed
    IoWriteError,
    /// Sector read failed
    IoReadError,
    /// Request or sector buffer allocation failed
    AllocationError,
    /// Sector size is zero, below 512 or not a power of two
    InvalidGeometry,
    /// FAT32 share outside 0..=100
    InvalidFatPercent,
    /// Disk has no room past the first alignment unit
    DiskTooSmall,
    /// FAT32 share rounds down to zero sectors
    FatPartitionEmpty,
    /// Sector 0 holds no usable FAT32 entry
    PartitionTableMissing,
    /// FAT32 formatter failed
    Filesystem(Fat32Error),
    /// IOS open of the FSA device failed
    ServiceOpenFailed(i32),
    /// FSA Format returned a nonzero status
    FormatFailed(i32),
    /// FSA Mount returned a nonzero status
    MountFailed(i32),
    /// FSA Unmount returned a nonzero status (callers may ignore this)
    UnmountFailed(i32),
}

impl InstallerError {
    /// Get a human-readable description of the error
    pub const fn description(&self) -> &'static str {
        match self {
            Self::DeviceInitError => "Failed to initialize USB drive",
            Self::DeviceInfoError => "Failed to get USB drive info",
            Self::IoWriteError => "Failed to write to drive",
            Self::IoReadError => "Failed to read from drive",
            Self::AllocationError => "Out of memory",
            Self::InvalidGeometry => "Unsupported drive geometry",
            Self::InvalidFatPercent => "FAT32 share must be 0-100%",
            Self::DiskTooSmall => "Drive is too small to partition",
            Self::FatPartitionEmpty => "FAT32 partition would be empty",
            Self::PartitionTableMissing => "Drive is not partitioned",
            Self::Filesystem(_) => "Failed to format FAT32 partition",
            Self::ServiceOpenFailed(_) => "Failed to open /dev/fsa",
            Self::FormatFailed(_) => "Failed to format device",
            Self::MountFailed(_) => "Failed to mount device",
            Self::UnmountFailed(_) => "Failed to unmount device",
        }
    }

    /// Raw IOS status carried by service failures
    pub const fn status_code(&self) -> Option<i32> {
        match self {
            Self::ServiceOpenFailed(code)
            | Self::FormatFailed(code)
            | Self::MountFailed(code)
            | Self::UnmountFailed(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for InstallerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem(inner) => write!(f, "{} ({})", self.description(), inner.as_str()),
            _ => match self.status_code() {
                // IOS codes are conventionally shown as raw 32-bit hex
                Some(code) => write!(f, "{} (status: 0x{:08X})", self.description(), code as u32),
                None => f.write_str(self.description()),
            },
        }
    }
}

impl From<Fat32Error> for InstallerError {
    fn from(err: Fat32Error) -> Self {
        match err {
            Fat32Error::AllocationError => Self::AllocationError,
            other => Self::Filesystem(other),
        }
    }
}

/// Result type for installer operations
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Log `err` to the status console and pass it on, for `map_err`
pub(crate) fn logged(err: InstallerError) -> InstallerError {
    crate::log_error!("{}", err);
    err
}
