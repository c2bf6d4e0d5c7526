//! FSA service client
//!
//! One [`FsaClient`] owns one open `/dev/fsa` handle and one IPC buffer for
//! its whole lifetime. The handle is closed when the client is dropped.

use alloc::boxed::Box;
use core::marker::PhantomData;

use super::request::{
    FormatRequest, FsaCommand, FsaRequest, MountRequest, UnmountRequest, IPC_BUFFER_SIZE,
    REQUEST_SIZE,
};
use super::transport::{AbiRevision, IoVec, IosHandle, IosTransport};
use super::wire::{BigEndianWire, NativeWire, WireEncoding};
use crate::aligned::AlignedBuffer;
use crate::config::FSA_DEVICE_PATH;
use crate::error::{InstallerError, InstallerResult};
use crate::{log_info, log_warn};

/// Format/mount capability, independent of the wire revision
pub trait StorageService {
    fn format(&mut self, request: &FormatRequest<'_>) -> InstallerResult<()>;

    fn mount(&mut self, request: &MountRequest<'_>) -> InstallerResult<()>;

    fn unmount(&mut self, request: &UnmountRequest<'_>) -> InstallerResult<()>;

    fn revision(&self) -> AbiRevision;
}

fn check_status(status: i32, err: fn(i32) -> InstallerError) -> InstallerResult<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(err(status))
    }
}

pub struct FsaClient<'t, T: IosTransport + ?Sized, E: WireEncoding> {
    transport: &'t T,
    handle: IosHandle,
    buffer: AlignedBuffer,
    _encoding: PhantomData<E>,
}

impl<'t, T: IosTransport + ?Sized, E: WireEncoding> FsaClient<'t, T, E> {
    /// Allocate the IPC buffer and open the FSA device
    pub fn open(transport: &'t T) -> InstallerResult<Self> {
        let buffer = AlignedBuffer::ios(IPC_BUFFER_SIZE).ok_or(InstallerError::AllocationError)?;
        let handle = transport
            .open(FSA_DEVICE_PATH, 0)
            .map_err(InstallerError::ServiceOpenFailed)?;
        if handle < 0 {
            return Err(InstallerError::ServiceOpenFailed(handle));
        }
        log_info!("Opened {} ({} requests)", FSA_DEVICE_PATH, E::NAME);

        Ok(Self {
            transport,
            handle,
            buffer,
            _encoding: PhantomData,
        })
    }

    /// Encode `request` and send it as a plain ioctl
    fn send<R: FsaRequest>(&mut self, request: &R) -> i32 {
        self.buffer.clear();
        let (input, output) = self.buffer.split_at_mut(REQUEST_SIZE);
        request.encode::<E>(self.handle as u32, input);
        self.transport.ioctl(self.handle, R::COMMAND.opcode(), input, output)
    }
}

impl<T: IosTransport + ?Sized, E: WireEncoding> StorageService for FsaClient<'_, T, E> {
    fn format(&mut self, request: &FormatRequest<'_>) -> InstallerResult<()> {
        let status = self.send(request);
        check_status(status, InstallerError::FormatFailed)
    }

    fn mount(&mut self, request: &MountRequest<'_>) -> InstallerResult<()> {
        self.buffer.clear();
        let (input, output) = self.buffer.split_at_mut(REQUEST_SIZE);
        request.encode::<E>(self.handle as u32, input);

        let mut vectors = [IoVec::In(input), IoVec::In(request.arg), IoVec::Out(output)];
        let status = self
            .transport
            .ioctlv(self.handle, FsaCommand::Mount.opcode(), 2, 1, &mut vectors);
        check_status(status, InstallerError::MountFailed)
    }

    fn unmount(&mut self, request: &UnmountRequest<'_>) -> InstallerResult<()> {
        let status = self.send(request);
        check_status(status, InstallerError::UnmountFailed)
    }

    fn revision(&self) -> AbiRevision {
        E::REVISION
    }
}

impl<T: IosTransport + ?Sized, E: WireEncoding> Drop for FsaClient<'_, T, E> {
    fn drop(&mut self) {
        let status = self.transport.close(self.handle);
        if status < 0 {
            log_warn!("Closing {} failed (status: 0x{:08X})", FSA_DEVICE_PATH, status as u32);
        }
    }
}

/// Open `/dev/fsa` with the request encoding the transport's service expects
pub fn open_storage_service<'t, T: IosTransport + ?Sized>(
    transport: &'t T,
) -> InstallerResult<Box<dyn StorageService + 't>> {
    let service: Box<dyn StorageService + 't> = match transport.abi_revision() {
        AbiRevision::Legacy => Box::new(FsaClient::<T, BigEndianWire>::open(transport)?),
        AbiRevision::NativeOverlay => Box::new(FsaClient::<T, NativeWire>::open(transport)?),
    };
    Ok(service)
}
