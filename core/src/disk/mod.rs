// Disk geometry, partition planning and MBR handling

pub mod geometry;
pub mod mbr;
pub mod planner;
pub mod policy;
pub mod usb;

pub use geometry::{DiskDevice, DiskGeometry};
pub use mbr::{MasterBootRecord, MbrPartitionEntry};
pub use planner::{plan_partitions, PartitionPlan, PlannedPartition};
pub use usb::{format_usb_fat, partition_usb};
