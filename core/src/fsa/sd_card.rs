// SD card wipe through the FSA service

use super::client::open_storage_service;
use super::request::{FormatRequest, MountRequest, UnmountRequest};
use super::transport::IosTransport;
use crate::config::{
    FSA_DEVICE_PATH, SD_CARD_DEVICE, SD_CARD_FILESYSTEM, SD_CARD_MOUNT_PATH, SD_MOUNT_FLAGS,
    SD_UNMOUNT_FLAGS,
};
use crate::error::{logged, InstallerResult};
use crate::mount::{MountState, Volume};
use crate::{log_info, log_warn};

/// Reformat the SD card as FAT and mount it back at `/vol/external01`
///
/// A failed unmount is not fatal (the card may not have been mounted).
/// The service handle is closed on every return path.
pub fn format_sd_card<T: IosTransport + ?Sized>(
    transport: &T,
    mounts: &mut MountState,
) -> InstallerResult<()> {
    log_info!("Opening {}...", FSA_DEVICE_PATH);
    let mut service = open_storage_service(transport).map_err(logged)?;

    log_info!("Unmounting SD card...");
    let unmount = UnmountRequest {
        mount_path: SD_CARD_MOUNT_PATH,
        flags: SD_UNMOUNT_FLAGS,
    };
    if let Err(e) = service.unmount(&unmount) {
        let status = e.status_code().unwrap_or(-1);
        log_warn!("Unmount failed (status: 0x{:08X}), ignoring...", status as u32);
    }
    mounts.release(Volume::SdCard);

    log_info!("Formatting SD card...");
    let format = FormatRequest {
        device: SD_CARD_DEVICE,
        filesystem: SD_CARD_FILESYSTEM,
        flags: 0,
        param_5: 0,
        param_6: 0,
    };
    service.format(&format).map_err(logged)?;

    log_info!("Mounting SD card...");
    let mount = MountRequest {
        device: SD_CARD_DEVICE,
        mount_path: SD_CARD_MOUNT_PATH,
        flags: SD_MOUNT_FLAGS,
        arg: &[],
    };
    service.mount(&mount).map_err(logged)?;
    mounts.set_mounted(Volume::SdCard);

    log_info!("SD card formatted and mounted.");
    Ok(())
}
