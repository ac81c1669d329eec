//! Directory operations: the root node and entry iteration.

use super::bpb::{DirAttributes, RawDirEntry, DIR_ENTRY_SIZE};
use super::{DirentPos, FatFs, FatNodeContext, FatType, SECTOR_SIZE};
use crate::fs::{FsError, Node};
use crate::store::BlockStore;

impl<S: BlockStore> FatFs<S> {
    /// Build the root directory node.
    ///
    /// On FAT12/16 the root lives in the fixed region between the FATs
    /// and the data area; on FAT32 it is an ordinary cluster chain.
    pub(crate) fn root_node(&mut self) -> Result<Node, FsError> {
        self.require_mounted()?;

        let mut node = Node::new("/", true, true, 0);
        let in_root_region = self.fat_type != FatType::Fat32;
        let start_block = if in_root_region {
            0
        } else {
            self.cluster_to_block(self.root_cluster)
        };

        Self::set_node_context(
            &mut node,
            FatNodeContext {
                start_block,
                current_block: start_block,
                current_entry: 0,
                in_root_region,
                parent: None,
            },
        );
        Ok(node)
    }

    /// Fetch the next live entry from `parent`, skipping deleted entries
    /// and the volume-label / disk attribute types.
    ///
    /// The parent's entry cursor always advances past what was examined;
    /// its block cursor moves on whenever the examined entry was the last
    /// one in its block. A name starting with a NUL byte ends the
    /// directory.
    pub(crate) fn read_dir_entry(&mut self, parent: &mut Node) -> Result<Node, FsError> {
        self.require_mounted()?;
        if !parent.exists {
            return Err(FsError::NotFound);
        }
        if !parent.directory {
            return Err(FsError::NotDirectory);
        }

        let entries_per_block = SECTOR_SIZE / DIR_ENTRY_SIZE as u64;

        loop {
            let lba = self.load_node_block(parent)?;

            let ctx = Self::node_context(parent)?;
            let index = (ctx.current_entry % entries_per_block) as usize;

            // The entry bytes outlive the block advance below.
            let mut raw = [0u8; DIR_ENTRY_SIZE];
            raw.copy_from_slice(&self.data_cache[index * DIR_ENTRY_SIZE..(index + 1) * DIR_ENTRY_SIZE]);

            if (ctx.current_entry + 1) % entries_per_block == 0 {
                self.inc_node_block(parent, false)?;
            }

            let entry = RawDirEntry(&raw);
            if entry.is_end() {
                return Err(FsError::Eof);
            }

            let mut ctx = Self::node_context(parent)?;
            ctx.current_entry += 1;
            Self::set_node_context(parent, ctx);

            let attrs = entry.attributes();
            if entry.is_deleted()
                || attrs.intersects(DirAttributes::VOLUME_LABEL | DirAttributes::DISK)
            {
                continue;
            }

            parent.pos += 1;

            let directory = attrs.contains(DirAttributes::DIRECTORY);
            let size = if directory { 0 } else { entry.file_size() as u64 };
            let mut child = Node::new(&entry.name(), true, directory, size);

            let start_block = self.cluster_to_block(entry.start_cluster());
            Self::set_node_context(
                &mut child,
                FatNodeContext {
                    start_block,
                    current_block: start_block,
                    current_entry: 0,
                    in_root_region: false,
                    parent: Some(DirentPos { lba, index }),
                },
            );

            return Ok(child);
        }
    }
}
