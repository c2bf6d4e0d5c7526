//! Filesystem-access (FSA) service requests
//!
//! Format, Mount and Unmount are sent to `/dev/fsa` as raw IOS ioctls.
//! Requests are encoded at fixed byte offsets; the integer encoding is
//! picked from the transport's ABI revision when the service is opened.

pub mod client;
pub mod request;
pub mod sd_card;
pub mod transport;
pub mod wire;

pub use client::{open_storage_service, FsaClient, StorageService};
pub use request::{
    FormatRequest, FsaCommand, FsaRequest, MountRequest, RequestHeader, UnmountRequest,
    IPC_BUFFER_SIZE, REQUEST_SIZE, RESPONSE_SIZE,
};
pub use sd_card::format_sd_card;
pub use transport::{AbiRevision, IoVec, IosHandle, IosTransport};
pub use wire::{BigEndianWire, NativeWire, StrField, U32Field, WireEncoding};
