//! FSA request records
//!
//! Buffer layout (0x40 aligned, zeroed before use):
//!
//! ```text
//! 0x000  u32   client handle
//! 0x004  u32   command
//! 0x008  ...   command payload ("inbuf", 0x518 bytes)
//! 0x520  ...   response region (0x293 bytes)
//! ```
//!
//! Payload offsets below are relative to 0x008.
//!
//! | command        | field        | offset | width |
//! |----------------|--------------|--------|-------|
//! | Format (0x69)  | device       | 0x004  | 0x280 |
//! |                | filesystem   | 0x284  | 8     |
//! |                | flags        | 0x28C  | 4     |
//! |                | param_5      | 0x290  | 4     |
//! |                | param_6      | 0x294  | 4     |
//! | Unmount (0x02) | path         | 0x004  | 0x280 |
//! |                | flags        | 0x284  | 4     |
//! | Mount (0x01)   | device       | 0x004  | 0x280 |
//! |                | path         | 0x284  | 0x280 |
//! |                | flags        | 0x504  | 4     |
//! |                | arg length   | 0x508  | 4     |

use super::wire::{StrField, U32Field, WireEncoding};

/// Request region handed to ioctl/ioctlv
pub const REQUEST_SIZE: usize = 0x520;
/// Response region following the request
pub const RESPONSE_SIZE: usize = 0x293;
/// Whole IPC buffer
pub const IPC_BUFFER_SIZE: usize = REQUEST_SIZE + RESPONSE_SIZE;

const PAYLOAD: usize = 0x08;
const PATH_WIDTH: usize = 0x280;
const FS_NAME_WIDTH: usize = 8;

const HANDLE: U32Field = U32Field::at(0x00);
const COMMAND: U32Field = U32Field::at(0x04);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FsaCommand {
    Mount = 0x01,
    Unmount = 0x02,
    Format = 0x69,
}

impl FsaCommand {
    pub const fn opcode(self) -> u32 {
        self as u32
    }

    pub fn from_opcode(opcode: u32) -> Option<Self> {
        match opcode {
            0x01 => Some(Self::Mount),
            0x02 => Some(Self::Unmount),
            0x69 => Some(Self::Format),
            _ => None,
        }
    }
}

/// Leading words shared by every request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RequestHeader {
    pub handle: u32,
    pub command: u32,
}

impl RequestHeader {
    pub fn decode<E: WireEncoding>(request: &[u8]) -> Option<Self> {
        if request.len() < REQUEST_SIZE {
            return None;
        }
        Some(Self {
            handle: HANDLE.read::<E>(request),
            command: COMMAND.read::<E>(request),
        })
    }
}

/// Common encode path: zero the region, write the header, then the payload
pub trait FsaRequest {
    const COMMAND: FsaCommand;

    fn encode_payload<E: WireEncoding>(&self, request: &mut [u8]);

    /// Fill `request` (at least `REQUEST_SIZE` bytes)
    fn encode<E: WireEncoding>(&self, handle: u32, request: &mut [u8]) {
        let request = &mut request[..REQUEST_SIZE];
        request.fill(0);
        HANDLE.write::<E>(request, handle);
        COMMAND.write::<E>(request, Self::COMMAND.opcode());
        self.encode_payload::<E>(request);
    }
}

fn header_matches<E: WireEncoding>(request: &[u8], command: FsaCommand) -> Option<RequestHeader> {
    let header = RequestHeader::decode::<E>(request)?;
    if header.command == command.opcode() {
        Some(header)
    } else {
        None
    }
}

/// Format(device, filesystem, flags, param_5, param_6)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FormatRequest<'a> {
    pub device: &'a str,
    pub filesystem: &'a str,
    pub flags: u32,
    pub param_5: u32,
    pub param_6: u32,
}

impl<'a> FormatRequest<'a> {
    pub const DEVICE: StrField = StrField::new(PAYLOAD + 0x004, PATH_WIDTH);
    pub const FILESYSTEM: StrField = StrField::new(PAYLOAD + 0x284, FS_NAME_WIDTH);
    pub const FLAGS: U32Field = U32Field::at(PAYLOAD + 0x28C);
    pub const PARAM_5: U32Field = U32Field::at(PAYLOAD + 0x290);
    pub const PARAM_6: U32Field = U32Field::at(PAYLOAD + 0x294);

    pub fn decode<E: WireEncoding>(request: &'a [u8]) -> Option<(RequestHeader, Self)> {
        let header = header_matches::<E>(request, FsaCommand::Format)?;
        Some((
            header,
            Self {
                device: Self::DEVICE.read(request)?,
                filesystem: Self::FILESYSTEM.read(request)?,
                flags: Self::FLAGS.read::<E>(request),
                param_5: Self::PARAM_5.read::<E>(request),
                param_6: Self::PARAM_6.read::<E>(request),
            },
        ))
    }
}

impl FsaRequest for FormatRequest<'_> {
    const COMMAND: FsaCommand = FsaCommand::Format;

    fn encode_payload<E: WireEncoding>(&self, request: &mut [u8]) {
        Self::DEVICE.write(request, self.device);
        Self::FILESYSTEM.write(request, self.filesystem);
        Self::FLAGS.write::<E>(request, self.flags);
        Self::PARAM_5.write::<E>(request, self.param_5);
        Self::PARAM_6.write::<E>(request, self.param_6);
    }
}

/// Unmount(path, flags)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnmountRequest<'a> {
    pub mount_path: &'a str,
    pub flags: u32,
}

impl<'a> UnmountRequest<'a> {
    pub const PATH: StrField = StrField::new(PAYLOAD + 0x004, PATH_WIDTH);
    pub const FLAGS: U32Field = U32Field::at(PAYLOAD + 0x284);

    pub fn decode<E: WireEncoding>(request: &'a [u8]) -> Option<(RequestHeader, Self)> {
        let header = header_matches::<E>(request, FsaCommand::Unmount)?;
        Some((
            header,
            Self {
                mount_path: Self::PATH.read(request)?,
                flags: Self::FLAGS.read::<E>(request),
            },
        ))
    }
}

impl FsaRequest for UnmountRequest<'_> {
    const COMMAND: FsaCommand = FsaCommand::Unmount;

    fn encode_payload<E: WireEncoding>(&self, request: &mut [u8]) {
        Self::PATH.write(request, self.mount_path);
        Self::FLAGS.write::<E>(request, self.flags);
    }
}

/// Mount(device, path, flags, arg)
///
/// `arg` travels as its own ioctlv vector; only its length is written into
/// the request region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MountRequest<'a> {
    pub device: &'a str,
    pub mount_path: &'a str,
    pub flags: u32,
    pub arg: &'a [u8],
}

impl<'a> MountRequest<'a> {
    pub const DEVICE: StrField = StrField::new(PAYLOAD + 0x004, PATH_WIDTH);
    pub const PATH: StrField = StrField::new(PAYLOAD + 0x284, PATH_WIDTH);
    pub const FLAGS: U32Field = U32Field::at(PAYLOAD + 0x504);
    pub const ARG_LEN: U32Field = U32Field::at(PAYLOAD + 0x508);

    /// Decode from the request vector and the argument vector. Fails if the
    /// recorded length does not match `arg`.
    pub fn decode<E: WireEncoding>(
        request: &'a [u8],
        arg: &'a [u8],
    ) -> Option<(RequestHeader, Self)> {
        let header = header_matches::<E>(request, FsaCommand::Mount)?;
        if Self::ARG_LEN.read::<E>(request) as usize != arg.len() {
            return None;
        }
        Some((
            header,
            Self {
                device: Self::DEVICE.read(request)?,
                mount_path: Self::PATH.read(request)?,
                flags: Self::FLAGS.read::<E>(request),
                arg,
            },
        ))
    }
}

impl FsaRequest for MountRequest<'_> {
    const COMMAND: FsaCommand = FsaCommand::Mount;

    fn encode_payload<E: WireEncoding>(&self, request: &mut [u8]) {
        Self::DEVICE.write(request, self.device);
        Self::PATH.write(request, self.mount_path);
        Self::FLAGS.write::<E>(request, self.flags);
        Self::ARG_LEN.write::<E>(request, self.arg.len() as u32);
    }
}
