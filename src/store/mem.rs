//! In-memory block store over a borrowed byte region.

use super::{BlockStore, StoreError};

const BLOCK_SIZE: usize = 512;

enum Mem<'a> {
    Ro(&'a [u8]),
    Rw(&'a mut [u8]),
}

/// Block store backed by caller-owned memory.
///
/// The region is divided into 512-byte blocks; a trailing partial block is
/// not addressable. Operations never fail beyond bounds and writability
/// checks — there is no sticky error state.
pub struct MemStore<'a> {
    mem: Mem<'a>,
    block_count: u64,
    pos: u64,
}

impl<'a> MemStore<'a> {
    /// Create a writable store over `data`.
    pub fn new(data: &'a mut [u8]) -> Self {
        let block_count = (data.len() / BLOCK_SIZE) as u64;
        MemStore { mem: Mem::Rw(data), block_count, pos: 0 }
    }

    /// Create a read-only store over `data`. Writes fail with
    /// [`StoreError::NotWritable`].
    pub fn read_only(data: &'a [u8]) -> Self {
        let block_count = (data.len() / BLOCK_SIZE) as u64;
        MemStore { mem: Mem::Ro(data), block_count, pos: 0 }
    }
}

impl BlockStore for MemStore<'_> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }

    fn is_writable(&self) -> bool {
        matches!(self.mem, Mem::Rw(_))
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, lba: u64) -> Result<(), StoreError> {
        if lba >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        self.pos = lba;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), StoreError> {
        if self.pos >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        let off = self.pos as usize * BLOCK_SIZE;
        let src = match &self.mem {
            Mem::Ro(data) => &data[off..off + BLOCK_SIZE],
            Mem::Rw(data) => &data[off..off + BLOCK_SIZE],
        };
        buf[..BLOCK_SIZE].copy_from_slice(src);
        self.pos += 1;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        if self.pos >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        let off = self.pos as usize * BLOCK_SIZE;
        match &mut self.mem {
            Mem::Ro(_) => return Err(StoreError::NotWritable),
            Mem::Rw(data) => {
                data[off..off + BLOCK_SIZE].copy_from_slice(&buf[..BLOCK_SIZE]);
            }
        }
        self.pos += 1;
        Ok(())
    }
}
