//! File I/O: cursor movement, reads, writes and truncation.

use super::bpb::{DIR_ENTRY_SIZE, DIR_ENTRY_SIZE_FIELD};
use super::table::{CLUSTER_EOC, CLUSTER_FREE};
use super::{FatFs, BLOCK_EOC, SECTOR_SIZE};
use crate::fs::{FsError, Node};
use crate::store::BlockStore;

impl<S: BlockStore> FatFs<S> {
    /// Move a node's cursor.
    ///
    /// `pos == 0` rewinds any node; directories support nothing else.
    /// For files the cursor walks forward block by block, extending the
    /// chain when the target lies past its end; seeking backwards (or
    /// from a cursor already at end-of-chain) restarts at the chain
    /// head.
    pub(crate) fn seek_node(&mut self, node: &mut Node, pos: u64) -> Result<(), FsError> {
        self.require_mounted()?;
        if !node.exists {
            return Err(FsError::NotFound);
        }
        let mut ctx = Self::node_context(node)?;

        if pos == 0 {
            ctx.current_block = ctx.start_block;
            ctx.current_entry = 0;
            Self::set_node_context(node, ctx);
            node.pos = 0;
            return Ok(());
        }

        if node.directory {
            // Directory cursors only rewind.
            return Err(FsError::Unavailable);
        }

        if pos < node.pos || ctx.current_block == BLOCK_EOC {
            ctx.current_block = ctx.start_block;
            ctx.current_entry = 0;
            Self::set_node_context(node, ctx);
            node.pos = 0;
        }

        while node.pos / SECTOR_SIZE < pos / SECTOR_SIZE {
            self.inc_node_block(node, true)?;
            node.pos = (node.pos / SECTOR_SIZE + 1) * SECTOR_SIZE;
        }
        node.pos = pos;
        Ok(())
    }

    /// Read up to `buf.len()` bytes at the file cursor.
    ///
    /// Copies run sector by sector through the data cache. Reading never
    /// touches the FAT: hitting the end of the chain just parks the
    /// cursor there and the byte count carries the readable tail.
    pub(crate) fn read_node(&mut self, file: &mut Node, buf: &mut [u8]) -> (usize, Result<(), FsError>) {
        if let Err(err) = self.require_mounted() {
            return (0, Err(err));
        }
        if !file.exists {
            return (0, Err(FsError::NotFound));
        }
        if file.directory {
            return (0, Err(FsError::NotFile));
        }
        if let Err(err) = Self::node_context(file) {
            return (0, Err(err));
        }

        if file.pos >= file.size {
            return (0, Err(FsError::Eof));
        }

        let mut bytes_read = 0;
        while bytes_read < buf.len() {
            if let Err(err) = self.load_node_block(file) {
                return (bytes_read, Err(err));
            }

            let sector_off = (file.pos % SECTOR_SIZE) as usize;
            let to_copy = (buf.len() - bytes_read)
                .min((file.size - file.pos) as usize)
                .min(SECTOR_SIZE as usize - sector_off);

            buf[bytes_read..bytes_read + to_copy]
                .copy_from_slice(&self.data_cache[sector_off..sector_off + to_copy]);
            bytes_read += to_copy;
            file.pos += to_copy as u64;

            if sector_off + to_copy == SECTOR_SIZE as usize {
                if let Err(err) = self.inc_node_block(file, false) {
                    return (bytes_read, Err(err));
                }
            }

            if file.pos >= file.size && bytes_read < buf.len() {
                // The file ended before the request was satisfied.
                return (bytes_read, Err(FsError::Eof));
            }
        }

        (bytes_read, Ok(()))
    }

    /// Write `buf` at the file cursor, extending the chain as needed.
    ///
    /// Each sector is a read-modify-write through the data cache. On
    /// every exit path the parent directory entry's size field is synced
    /// to the new end position; the in-memory size is not rolled back
    /// when that sync fails.
    pub(crate) fn write_node(&mut self, file: &mut Node, buf: &[u8]) -> (usize, Result<(), FsError>) {
        if let Err(err) = self.require_mounted() {
            return (0, Err(err));
        }
        if !file.exists {
            return (0, Err(FsError::NotFound));
        }
        if file.directory {
            return (0, Err(FsError::NotFile));
        }
        if let Err(err) = Self::node_context(file) {
            return (0, Err(err));
        }

        let mut written = 0;
        let mut status: Result<(), FsError> = Ok(());

        while written < buf.len() {
            let lba = match self.load_node_block(file) {
                Ok(lba) => lba,
                Err(FsError::Eof) => {
                    // The fixed root region cannot grow; a chain cursor
                    // at end-of-chain needs a seek to re-anchor first.
                    let in_root = Self::node_context(file)
                        .map(|ctx| ctx.in_root_region)
                        .unwrap_or(false);
                    status = Err(if in_root { FsError::NoSpace } else { FsError::Eof });
                    break;
                }
                Err(err) => {
                    status = Err(err);
                    break;
                }
            };

            let sector_off = (file.pos % SECTOR_SIZE) as usize;
            let to_copy = (buf.len() - written).min(SECTOR_SIZE as usize - sector_off);

            self.data_cache[sector_off..sector_off + to_copy]
                .copy_from_slice(&buf[written..written + to_copy]);
            if let Err(err) = self.store_block(lba) {
                status = Err(err);
                break;
            }

            written += to_copy;
            file.pos += to_copy as u64;

            if sector_off + to_copy == SECTOR_SIZE as usize {
                if let Err(err) = self.inc_node_block(file, true) {
                    status = Err(err);
                    break;
                }
            }
        }

        if file.pos > file.size {
            file.size = file.pos;
        }
        let sync = self.sync_dirent_size(file);
        if status.is_ok() {
            status = sync;
        }

        (written, status)
    }

    /// Cut the file off at its current position.
    ///
    /// The cluster holding the cursor becomes the end of the chain; every
    /// cluster behind it is freed. A cursor already at end-of-chain means
    /// there is nothing to free.
    pub(crate) fn truncate_node(&mut self, file: &mut Node) -> Result<(), FsError> {
        self.require_mounted()?;
        if !file.exists {
            return Err(FsError::NotFound);
        }
        if file.directory {
            return Err(FsError::NotFile);
        }
        let ctx = Self::node_context(file)?;

        file.size = file.pos;
        self.sync_dirent_size(file)?;

        if ctx.current_block == BLOCK_EOC {
            return Ok(());
        }

        // Round down to the enclosing cluster, terminate it there, then
        // free the rest of the old chain.
        let survivor_block = ctx.current_block - ctx.current_block % self.cluster_size;
        let mut cluster = self.block_to_cluster(survivor_block);
        let mut first = true;
        loop {
            let next = self.get_fat_entry(cluster)?;
            self.set_fat_entry(cluster, if first { CLUSTER_EOC } else { CLUSTER_FREE })?;
            first = false;
            if self.cluster_to_block(next) == BLOCK_EOC {
                break;
            }
            cluster = next;
        }

        Ok(())
    }

    /// Write the node's size into its parent directory entry.
    ///
    /// Nested read-modify-write on the parent's block through the data
    /// cache. Nodes without a parent entry (the root) sync nothing.
    fn sync_dirent_size(&mut self, node: &Node) -> Result<(), FsError> {
        let ctx = Self::node_context(node)?;
        let Some(parent) = ctx.parent else {
            return Ok(());
        };

        self.load_block(parent.lba)?;
        let off = parent.index * DIR_ENTRY_SIZE + DIR_ENTRY_SIZE_FIELD;
        self.data_cache[off..off + 4].copy_from_slice(&(node.size as u32).to_le_bytes());
        self.store_block(parent.lba)
    }
}
