// Filesystem operations

pub mod fat32_format;

pub use fat32_format::{
    format_fat32, verify_fat32, Fat32Error, Fat32Layout, Fat32Params, Fat32VolumeInfo,
};
