mod error;
mod format;
mod verify;

pub use error::Fat32Error;
pub use format::{encode_label, format_fat32, Fat32Layout, Fat32Params};
pub use verify::{verify_fat32, Fat32VolumeInfo};
