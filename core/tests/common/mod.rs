//! Common test utilities: a sparse in-memory disk and a recording IOS
//! transport

#![allow(dead_code)]

use aroma_core::disk::DiskDevice;
use aroma_core::fsa::{AbiRevision, IoVec, IosHandle, IosTransport, REQUEST_SIZE};
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;

/// In-memory disk that only stores non-zero sectors
///
/// Lets tests partition multi-GiB "drives" without allocating them.
#[derive(Debug, Clone)]
pub struct SparseDisk {
    pub sectors: BTreeMap<u64, Vec<u8>>,
    pub block_size: u32,
    pub total_sectors: u64,
    /// `write_blocks` covering this LBA fails
    pub fail_write_at: Option<u64>,
    pub fail_init: bool,
    pub init_calls: usize,
    pub write_calls: usize,
}

impl SparseDisk {
    pub fn new(total_sectors: u64, block_size: u32) -> Self {
        Self {
            sectors: BTreeMap::new(),
            block_size,
            total_sectors,
            fail_write_at: None,
            fail_init: false,
            init_calls: 0,
            write_calls: 0,
        }
    }

    /// Disk of `gib` GiB with 512-byte sectors
    pub fn with_gib(gib: u64) -> Self {
        Self::new(gib * 1024 * 1024 * 2, 512)
    }

    /// Copy of one sector (zeros if never written)
    pub fn sector(&self, lba: u64) -> Vec<u8> {
        self.sectors
            .get(&lba)
            .cloned()
            .unwrap_or_else(|| vec![0u8; self.block_size as usize])
    }

    pub fn is_blank(&self) -> bool {
        self.sectors.is_empty()
    }

    fn check_range(&self, start_lba: Lba, len: usize, kind: io::ErrorKind) -> io::Result<u64> {
        let bs = self.block_size as usize;
        if len % bs != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer is not a multiple of the block size",
            ));
        }
        let count = (len / bs) as u64;
        if start_lba.0 + count > self.total_sectors {
            return Err(io::Error::new(kind, "access beyond end of device"));
        }
        Ok(count)
    }
}

impl BlockIo for SparseDisk {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(self.block_size).expect("valid block size")
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok(self.total_sectors)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        self.check_range(start_lba, dst.len(), io::ErrorKind::UnexpectedEof)?;
        let bs = self.block_size as usize;
        for (i, chunk) in dst.chunks_mut(bs).enumerate() {
            match self.sectors.get(&(start_lba.0 + i as u64)) {
                Some(data) => chunk.copy_from_slice(data),
                None => chunk.fill(0),
            }
        }
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let count = self.check_range(start_lba, src.len(), io::ErrorKind::WriteZero)?;
        if let Some(bad) = self.fail_write_at {
            if (start_lba.0..start_lba.0 + count).contains(&bad) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
            }
        }
        self.write_calls += 1;
        let bs = self.block_size as usize;
        for (i, chunk) in src.chunks(bs).enumerate() {
            let lba = start_lba.0 + i as u64;
            if chunk.iter().all(|&b| b == 0) {
                self.sectors.remove(&lba);
            } else {
                self.sectors.insert(lba, chunk.to_vec());
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl DiskDevice for SparseDisk {
    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no drive"));
        }
        Ok(())
    }
}

/// One call seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IosCall {
    Open {
        path: String,
        mode: u32,
    },
    Close(IosHandle),
    Ioctl {
        handle: IosHandle,
        request: u32,
        input: Vec<u8>,
        output_len: usize,
    },
    Ioctlv {
        handle: IosHandle,
        request: u32,
        in_count: u32,
        out_count: u32,
        /// (is output, contents at call time)
        vectors: Vec<(bool, Vec<u8>)>,
    },
}

/// IOS transport that records every call and answers with canned statuses
pub struct MockTransport {
    pub revision: AbiRevision,
    pub open_result: Result<IosHandle, i32>,
    /// Status per FSA opcode; missing entries answer 0
    pub statuses: RefCell<BTreeMap<u32, i32>>,
    pub calls: RefCell<Vec<IosCall>>,
}

impl MockTransport {
    pub const HANDLE: IosHandle = 5;

    pub fn new(revision: AbiRevision) -> Self {
        Self {
            revision,
            open_result: Ok(Self::HANDLE),
            statuses: RefCell::new(BTreeMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn fail_command(&self, opcode: u32, status: i32) {
        self.statuses.borrow_mut().insert(opcode, status);
    }

    fn status_for(&self, opcode: u32) -> i32 {
        self.statuses.borrow().get(&opcode).copied().unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<IosCall> {
        self.calls.borrow().clone()
    }

    /// Opcodes of every ioctl/ioctlv, in order
    pub fn opcodes(&self) -> Vec<u32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                IosCall::Ioctl { request, .. } | IosCall::Ioctlv { request, .. } => Some(*request),
                _ => None,
            })
            .collect()
    }

    /// Request region of the n-th ioctl/ioctlv
    pub fn request_bytes(&self, n: usize) -> Vec<u8> {
        let calls = self.calls.borrow();
        let call = calls
            .iter()
            .filter(|c| matches!(c, IosCall::Ioctl { .. } | IosCall::Ioctlv { .. }))
            .nth(n)
            .expect("no such request");
        match call {
            IosCall::Ioctl { input, .. } => input.clone(),
            IosCall::Ioctlv { vectors, .. } => vectors[0].1.clone(),
            _ => unreachable!(),
        }
    }

    pub fn close_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, IosCall::Close(_)))
            .count()
    }
}

impl IosTransport for MockTransport {
    fn open(&self, path: &str, mode: u32) -> Result<IosHandle, i32> {
        self.calls.borrow_mut().push(IosCall::Open {
            path: path.to_string(),
            mode,
        });
        self.open_result
    }

    fn close(&self, handle: IosHandle) -> i32 {
        self.calls.borrow_mut().push(IosCall::Close(handle));
        0
    }

    fn ioctl(&self, handle: IosHandle, request: u32, input: &[u8], output: &mut [u8]) -> i32 {
        assert_eq!(input.len(), REQUEST_SIZE);
        self.calls.borrow_mut().push(IosCall::Ioctl {
            handle,
            request,
            input: input.to_vec(),
            output_len: output.len(),
        });
        self.status_for(request)
    }

    fn ioctlv(
        &self,
        handle: IosHandle,
        request: u32,
        in_count: u32,
        out_count: u32,
        vectors: &mut [IoVec<'_>],
    ) -> i32 {
        let recorded = vectors
            .iter()
            .map(|v| (matches!(v, IoVec::Out(_)), v.as_slice().to_vec()))
            .collect();
        self.calls.borrow_mut().push(IosCall::Ioctlv {
            handle,
            request,
            in_count,
            out_count,
            vectors: recorded,
        });
        self.status_for(request)
    }

    fn abi_revision(&self) -> AbiRevision {
        self.revision
    }
}
