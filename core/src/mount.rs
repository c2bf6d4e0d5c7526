//! Mount bookkeeping
//!
//! Which volumes are currently mounted, carried as a value by whoever does
//! the mounting instead of process-wide flags.

/// Volumes the installer mounts or touches
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Volume {
    /// SD card at /vol/external01
    SdCard,
    /// First USB partition through the FAT driver
    UsbFat,
    /// System SLC
    Slc,
    /// Inserted disc
    Disc,
}

impl Volume {
    const fn bit(self) -> u8 {
        match self {
            Self::SdCard => 1 << 0,
            Self::UsbFat => 1 << 1,
            Self::Slc => 1 << 2,
            Self::Disc => 1 << 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SdCard => "SD card",
            Self::UsbFat => "USB FAT32 partition",
            Self::Slc => "SLC storage",
            Self::Disc => "disc",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MountState {
    mounted: u8,
}

impl MountState {
    pub const fn new() -> Self {
        Self { mounted: 0 }
    }

    pub fn is_mounted(&self, volume: Volume) -> bool {
        self.mounted & volume.bit() != 0
    }

    pub fn set_mounted(&mut self, volume: Volume) {
        self.mounted |= volume.bit();
    }

    /// Mark `volume` unmounted; returns whether it was mounted before.
    pub fn release(&mut self, volume: Volume) -> bool {
        let was = self.is_mounted(volume);
        self.mounted &= !volume.bit();
        was
    }

    pub fn any_mounted(&self) -> bool {
        self.mounted != 0
    }
}
