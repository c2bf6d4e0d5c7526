//! Fixed installer constants.
//!
//! Nothing here is read at runtime; device paths and flags are part of the
//! console's firmware contract.

/// IOS device node of the filesystem-access service.
pub const FSA_DEVICE_PATH: &str = "/dev/fsa";

/// Raw SD card block device.
pub const SD_CARD_DEVICE: &str = "/dev/sdcard01";

/// Volume path the SD card is mounted at.
pub const SD_CARD_MOUNT_PATH: &str = "/vol/external01";

/// Filesystem name passed to FSA Format for the SD card.
pub const SD_CARD_FILESYSTEM: &str = "fat";

/// Unmount flags used before formatting the SD card (force + keep client).
pub const SD_UNMOUNT_FLAGS: u32 = 0x8000_0002;

/// Mount flags used after formatting the SD card.
pub const SD_MOUNT_FLAGS: u32 = 2;

/// Volume label written to freshly formatted FAT32 partitions.
pub const FAT32_LABEL: &str = "aroma";

/// Percentage of the USB disk offered to the FAT32 partition by default.
pub const DEFAULT_FAT_PERCENT: u8 = 80;

/// Step used when the user adjusts the FAT32 share.
pub const FAT_PERCENT_STEP: u8 = 10;
