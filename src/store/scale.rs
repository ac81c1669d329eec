//! Block-size rescaling decorator.

use super::{BlockStore, StoreError};

/// Presents an inner store under a larger block size.
///
/// With an inner block size `S` and a presented size `L = k * S`, every
/// logical block maps onto `k` consecutive inner blocks; a logical read
/// or write issues `k` inner operations. Construction with a presented
/// size that is not a whole multiple of `S` fails closed: every
/// subsequent operation reports [`StoreError::Io`].
pub struct ScaleStore<S> {
    inner: S,
    scale: u64,
    block_size: usize,
    block_count: u64,
    pos: u64,
    valid: bool,
}

impl<S: BlockStore> ScaleStore<S> {
    /// Wrap `inner`, presenting `block_size`-byte blocks.
    pub fn new(mut inner: S, block_size: usize) -> Self {
        let inner_size = inner.block_size();
        let scale = (block_size / inner_size) as u64;
        let valid = scale >= 1 && block_size % inner_size == 0;
        let block_count = if valid { inner.block_count() / scale } else { 0 };

        if valid {
            let _ = inner.rewind();
        }

        ScaleStore { inner, scale, block_size, block_count, pos: 0, valid }
    }

    /// Give back the wrapped store.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BlockStore> BlockStore for ScaleStore<S> {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }

    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, lba: u64) -> Result<(), StoreError> {
        if !self.valid {
            return Err(StoreError::Io);
        }
        if lba >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        self.inner.seek(lba * self.scale)?;
        self.pos = lba;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), StoreError> {
        if !self.valid {
            return Err(StoreError::Io);
        }
        let inner_size = self.inner.block_size();
        for i in 0..self.scale as usize {
            if let Err(err) = self.inner.read(&mut buf[i * inner_size..(i + 1) * inner_size]) {
                // Try to put the inner cursor back where this logical
                // block starts.
                let _ = self.seek(self.pos);
                return Err(err);
            }
        }
        self.pos += 1;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        if !self.valid {
            return Err(StoreError::Io);
        }
        let inner_size = self.inner.block_size();
        for i in 0..self.scale as usize {
            if let Err(err) = self.inner.write(&buf[i * inner_size..(i + 1) * inner_size]) {
                let _ = self.seek(self.pos);
                return Err(err);
            }
        }
        self.pos += 1;
        Ok(())
    }
}
