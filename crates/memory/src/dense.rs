use thiserror::Error;

use crate::MemoryBus;

/// Errors returned by the checked [`DenseMemory`] accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenseMemoryError {
    /// The requested address range is outside the backed RAM.
    #[error("guest memory access out of range: paddr=0x{paddr:x} len={len} size=0x{size:x}")]
    OutOfRange { paddr: u64, len: usize, size: u64 },
    /// The requested size cannot be represented by the current platform's `usize`.
    #[error("guest memory size {size} does not fit in usize")]
    SizeTooLarge { size: u64 },
}

pub type DenseMemoryResult<T> = Result<T, DenseMemoryError>;

/// Dense (contiguous) guest RAM starting at physical address 0.
///
/// Through [`MemoryBus`], bytes outside `[0, size)` read as `0xFF` and writes to them are dropped,
/// so a device DMA that straddles the end of RAM still completes.
#[derive(Debug, Clone)]
pub struct DenseMemory {
    data: Box<[u8]>,
}

impl DenseMemory {
    pub fn new(size: u64) -> DenseMemoryResult<Self> {
        let size_usize =
            usize::try_from(size).map_err(|_| DenseMemoryError::SizeTooLarge { size })?;
        Ok(Self {
            data: vec![0u8; size_usize].into_boxed_slice(),
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Checked read: fails instead of floating high when any byte is outside RAM.
    pub fn read_into(&self, paddr: u64, dst: &mut [u8]) -> DenseMemoryResult<()> {
        let (start, end) = self.range_to_usize(paddr, dst.len())?;
        dst.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    /// Checked write: fails instead of dropping bytes when any byte is outside RAM.
    pub fn write_from(&mut self, paddr: u64, src: &[u8]) -> DenseMemoryResult<()> {
        let (start, end) = self.range_to_usize(paddr, src.len())?;
        self.data[start..end].copy_from_slice(src);
        Ok(())
    }

    fn range_to_usize(&self, paddr: u64, len: usize) -> DenseMemoryResult<(usize, usize)> {
        let out_of_range = DenseMemoryError::OutOfRange {
            paddr,
            len,
            size: self.size(),
        };
        let start = usize::try_from(paddr).map_err(|_| out_of_range.clone())?;
        let end = start.checked_add(len).ok_or_else(|| out_of_range.clone())?;
        if end > self.data.len() {
            return Err(out_of_range);
        }
        Ok((start, end))
    }

    /// Number of leading bytes of `[paddr, paddr + len)` that are backed by RAM.
    fn backed_prefix(&self, paddr: u64, len: usize) -> usize {
        let size = self.size();
        if paddr >= size {
            return 0;
        }
        let avail = size - paddr;
        len.min(usize::try_from(avail).unwrap_or(usize::MAX))
    }
}

impl MemoryBus for DenseMemory {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        let backed = self.backed_prefix(paddr, buf.len());
        if backed != 0 {
            let start = paddr as usize;
            buf[..backed].copy_from_slice(&self.data[start..start + backed]);
        }
        buf[backed..].fill(0xFF);
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        let backed = self.backed_prefix(paddr, buf.len());
        if backed != 0 {
            let start = paddr as usize;
            self.data[start..start + backed].copy_from_slice(&buf[..backed]);
        }
    }
}
