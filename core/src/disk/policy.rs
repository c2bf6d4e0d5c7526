// FAT32 share policy applied before the planner runs
//
// The planner takes whatever percentage it is given; these helpers hold the
// rules the partition menu enforces on the user's choice.

use super::geometry::{DiskGeometry, GIB};
use crate::config::{DEFAULT_FAT_PERCENT, FAT_PERCENT_STEP};

/// Starting share: everything for drives under 1 GiB, else the default.
pub fn initial_fat_percent(geometry: &DiskGeometry) -> u8 {
    if geometry.is_small() {
        100
    } else {
        DEFAULT_FAT_PERCENT
    }
}

/// One step down, refused when it would leave partition 1 under 1 GiB.
pub fn decrease_fat_percent(geometry: &DiskGeometry, current: u8) -> u8 {
    if current <= FAT_PERCENT_STEP || geometry.is_small() {
        return current;
    }
    let next = current - FAT_PERCENT_STEP;
    if geometry.size_bytes() * next as u128 / 100 >= GIB as u128 {
        next
    } else {
        current
    }
}

/// One step up, capped at 100.
pub fn increase_fat_percent(current: u8) -> u8 {
    if current >= 100 {
        100
    } else {
        (current + FAT_PERCENT_STEP).min(100)
    }
}

/// Expected (FAT32, secondary) sizes in MiB for the confirmation screen.
pub fn preview_sizes_mb(geometry: &DiskGeometry, fat_percent: u8) -> (u64, u64) {
    let total = geometry.size_mb();
    let fat = total * fat_percent.min(100) as u64 / 100;
    (fat, total - fat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::geometry::MIB;

    #[test]
    fn test_small_drive_forced_to_full_fat() {
        let geometry = DiskGeometry::new(512 * MIB / 512, 512);
        assert_eq!(initial_fat_percent(&geometry), 100);
        assert_eq!(decrease_fat_percent(&geometry, 100), 100);
    }

    #[test]
    fn test_default_share_on_large_drive() {
        let geometry = DiskGeometry::new(62_521_344, 512);
        assert_eq!(initial_fat_percent(&geometry), 80);
        assert_eq!(decrease_fat_percent(&geometry, 80), 70);
        assert_eq!(increase_fat_percent(80), 90);
        assert_eq!(increase_fat_percent(100), 100);
    }

    #[test]
    fn test_decrease_keeps_fat_above_1gib() {
        // 4 GiB: 30% is 1.2 GiB, 20% would be 0.8 GiB
        let geometry = DiskGeometry::new(4 * GIB / 512, 512);
        assert_eq!(decrease_fat_percent(&geometry, 40), 30);
        assert_eq!(decrease_fat_percent(&geometry, 30), 30);
    }

    #[test]
    fn test_never_below_one_step() {
        let geometry = DiskGeometry::new(1_953_525_168, 512);
        assert_eq!(decrease_fat_percent(&geometry, 10), 10);
    }

    #[test]
    fn test_preview() {
        let geometry = DiskGeometry::new(2 * GIB / 512, 512);
        assert_eq!(preview_sizes_mb(&geometry, 50), (1024, 1024));
    }
}
