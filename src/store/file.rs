//! Host-file block store.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{BlockStore, StoreError};

const BLOCK_SIZE: usize = 512;

/// Block store backed by a file on the host filesystem.
///
/// Offsets are 64-bit throughout, so images larger than 4 GiB work on any
/// platform with a 64-bit `std::io`. Backend failures are sticky: the
/// first failed read, write or seek closes the handle and every
/// subsequent operation reports [`StoreError::Io`]. Bounds and
/// writability pre-checks are not sticky.
#[derive(Debug)]
pub struct FileStore {
    file: Option<File>,
    writable: bool,
    block_count: u64,
    pos: u64,
}

impl FileStore {
    /// Open the image at `path`. A trailing partial block is not
    /// addressable.
    pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|_| StoreError::Io)?;
        let len = file.metadata().map_err(|_| StoreError::Io)?.len();

        Ok(FileStore {
            file: Some(file),
            writable,
            block_count: len / BLOCK_SIZE as u64,
            pos: 0,
        })
    }

    /// Drop the handle after a backend failure; all later operations see
    /// [`StoreError::Io`].
    fn close(&mut self) {
        if self.file.take().is_some() {
            log::warn!("file store: backend failure, handle closed");
        }
    }
}

impl BlockStore for FileStore {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, lba: u64) -> Result<(), StoreError> {
        let file = self.file.as_mut().ok_or(StoreError::Io)?;
        if lba >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        if file.seek(SeekFrom::Start(lba * BLOCK_SIZE as u64)).is_err() {
            self.close();
            return Err(StoreError::Io);
        }
        self.pos = lba;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), StoreError> {
        let file = self.file.as_mut().ok_or(StoreError::Io)?;
        if self.pos >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        if file.read_exact(&mut buf[..BLOCK_SIZE]).is_err() {
            self.close();
            return Err(StoreError::Io);
        }
        self.pos += 1;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        let file = self.file.as_mut().ok_or(StoreError::Io)?;
        if self.pos >= self.block_count {
            return Err(StoreError::OutOfBounds);
        }
        if !self.writable {
            return Err(StoreError::NotWritable);
        }
        if file.write_all(&buf[..BLOCK_SIZE]).is_err() {
            self.close();
            return Err(StoreError::Io);
        }
        self.pos += 1;
        Ok(())
    }
}
