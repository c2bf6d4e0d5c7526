//! IOS transport contract
//!
//! The installer never talks to IOS directly; the platform layer hands in
//! something implementing [`IosTransport`]. All calls block until IOS
//! answers, there is no timeout on this side.

/// Open IOS descriptor. Negative values are errors and never stored.
pub type IosHandle = i32;

/// Wire revision of the FSA request buffer spoken by the running service
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AbiRevision {
    /// Integers marshaled byte by byte, big-endian
    Legacy,
    /// Request record overlaid as a native-order struct
    NativeOverlay,
}

/// One element of an ioctlv scatter list
pub enum IoVec<'a> {
    /// Read by the service
    In(&'a [u8]),
    /// Written by the service
    Out(&'a mut [u8]),
}

impl IoVec<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::In(buf) => buf.len(),
            Self::Out(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::In(buf) => buf,
            Self::Out(buf) => buf,
        }
    }
}

pub trait IosTransport {
    /// Open a device node. `Err` carries the negative IOS status.
    fn open(&self, path: &str, mode: u32) -> Result<IosHandle, i32>;

    fn close(&self, handle: IosHandle) -> i32;

    fn ioctl(&self, handle: IosHandle, request: u32, input: &[u8], output: &mut [u8]) -> i32;

    /// `vectors` holds `in_count` input vectors followed by `out_count`
    /// output vectors.
    fn ioctlv(
        &self,
        handle: IosHandle,
        request: u32,
        in_count: u32,
        out_count: u32,
        vectors: &mut [IoVec<'_>],
    ) -> i32;

    /// Which request layout the FSA service behind this transport expects.
    fn abi_revision(&self) -> AbiRevision;
}
