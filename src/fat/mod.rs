//! FAT12/16/32 filesystem engine.
//!
//! Submodules:
//! - [`bpb`]: boot sector / BPB / EBPB decoding, directory entry layout
//! - `table`: FAT entry codec, cluster math, chain traversal, allocation
//! - `dir`: directory iteration and 8.3 name handling
//! - `file`: seek / read / write / truncate
//!
//! The engine keeps two single-slot write-through block caches: one for
//! the FAT area, one shared by the data area and the FAT12/16 root
//! region. LBA 0 (the boot sector) never enters either cache, which frees
//! the value 0 to act as the empty-slot sentinel.

pub mod bpb;
mod dir;
mod file;
mod table;

pub use bpb::DirAttributes;

use crate::fs::{Filesystem, FsError, Node, NodeContext};
use crate::store::BlockStore;
use bpb::BiosParameterBlock;
use core::fmt;

// Subtype thresholds, in data clusters.
const FAT12_MAX_CLUSTER_COUNT: u64 = 4084;
const FAT16_MAX_CLUSTER_COUNT: u64 = 65524;

/// Cursor sentinel: the node's chain has ended.
pub(crate) const BLOCK_EOC: u64 = u64::MAX;

/// Cache-slot sentinel: slot holds nothing.
const CACHE_EMPTY: u64 = 0;

/// The only logical sector size this version accepts.
pub(crate) const SECTOR_SIZE: u64 = 512;

/// FAT flavour of a mounted volume, decided by the data cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatType {
    /// Mount failed; every operation returns
    /// [`Unavailable`](FsError::Unavailable).
    None,
    /// Up to 4084 data clusters, 12-bit FAT entries.
    Fat12,
    /// Up to 65524 data clusters, 16-bit FAT entries.
    Fat16,
    /// Anything larger, 28-bit FAT entries.
    Fat32,
}

impl fmt::Display for FatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatType::None => write!(f, "none"),
            FatType::Fat12 => write!(f, "FAT12"),
            FatType::Fat16 => write!(f, "FAT16"),
            FatType::Fat32 => write!(f, "FAT32"),
        }
    }
}

/// Where a directory entry lives: the absolute LBA of its block and the
/// entry index inside that block. Needed to write size changes back.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DirentPos {
    pub lba: u64,
    pub index: usize,
}

/// Per-node cursor state of a [`FatFs`].
///
/// Block numbers are relative to the node's region: the FAT12/16 root
/// area for the root directory of those subtypes, the data area for
/// everything else. [`BLOCK_EOC`] in `current_block` means the cursor ran
/// off the end of the chain.
#[derive(Debug, Clone, Copy)]
pub struct FatNodeContext {
    pub(crate) start_block: u64,
    pub(crate) current_block: u64,
    pub(crate) current_entry: u64,
    pub(crate) in_root_region: bool,
    pub(crate) parent: Option<DirentPos>,
}

/// Parsed and validated superblock geometry.
struct Geometry {
    fat_type: FatType,
    volume_label: String,
    cluster_size: u64,
    reserved_blocks: u64,
    fat_count: u64,
    fat_size: u64,
    root_entry_count: u64,
    root_cluster: u32,
    block_count: u64,
    fat_lba: u64,
    root_lba: u64,
    data_lba: u64,
    data_block_count: u64,
    data_cluster_count: u64,
}

/// A mounted FAT filesystem over a block store.
///
/// [`mount`](FatFs::mount) never fails: when the boot sector does not
/// parse, the filesystem comes up with [`FatType::None`] and every
/// operation returns [`FsError::Unavailable`]. Check
/// [`fat_type`](FatFs::fat_type) after mounting.
pub struct FatFs<S> {
    store: S,
    fat_type: FatType,
    volume_label: String,
    cluster_size: u64,
    reserved_blocks: u64,
    fat_count: u64,
    fat_size: u64,
    root_entry_count: u64,
    root_cluster: u32,
    block_count: u64,
    fat_lba: u64,
    root_lba: u64,
    data_lba: u64,
    data_block_count: u64,
    data_cluster_count: u64,
    fat_cache: Vec<u8>,
    fat_cache_lba: u64,
    data_cache: Vec<u8>,
    data_cache_lba: u64,
}

impl<S: BlockStore> FatFs<S> {
    /// Mount the FAT volume found at LBA 0 of `store`.
    pub fn mount(mut store: S) -> Self {
        let geometry = match Self::parse_superblock(&mut store) {
            Ok(geometry) => {
                log::debug!(
                    "mounted {} volume \"{}\": {} clusters of {} block(s), data at LBA {}",
                    geometry.fat_type,
                    geometry.volume_label,
                    geometry.data_cluster_count,
                    geometry.cluster_size,
                    geometry.data_lba,
                );
                geometry
            }
            Err(reason) => {
                log::warn!("boot sector rejected: {}", reason);
                Geometry {
                    fat_type: FatType::None,
                    volume_label: String::new(),
                    cluster_size: 0,
                    reserved_blocks: 0,
                    fat_count: 0,
                    fat_size: 0,
                    root_entry_count: 0,
                    root_cluster: 0,
                    block_count: 0,
                    fat_lba: 0,
                    root_lba: 0,
                    data_lba: 0,
                    data_block_count: 0,
                    data_cluster_count: 0,
                }
            }
        };

        let cache_size = if geometry.fat_type == FatType::None {
            0
        } else {
            SECTOR_SIZE as usize
        };

        FatFs {
            store,
            fat_type: geometry.fat_type,
            volume_label: geometry.volume_label,
            cluster_size: geometry.cluster_size,
            reserved_blocks: geometry.reserved_blocks,
            fat_count: geometry.fat_count,
            fat_size: geometry.fat_size,
            root_entry_count: geometry.root_entry_count,
            root_cluster: geometry.root_cluster,
            block_count: geometry.block_count,
            fat_lba: geometry.fat_lba,
            root_lba: geometry.root_lba,
            data_lba: geometry.data_lba,
            data_block_count: geometry.data_block_count,
            data_cluster_count: geometry.data_cluster_count,
            fat_cache: vec![0; cache_size],
            fat_cache_lba: CACHE_EMPTY,
            data_cache: vec![0; cache_size],
            data_cache_lba: CACHE_EMPTY,
        }
    }

    /// The subtype decided at mount time, or [`FatType::None`].
    pub fn fat_type(&self) -> FatType {
        self.fat_type
    }

    /// Total number of blocks the superblock reports.
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Blocks per allocation cluster.
    pub fn cluster_blocks(&self) -> u64 {
        self.cluster_size
    }

    /// Blocks reserved in front of the first FAT.
    pub fn reserved_blocks(&self) -> u64 {
        self.reserved_blocks
    }

    /// Number of FAT copies on the volume.
    pub fn fat_count(&self) -> u64 {
        self.fat_count
    }

    /// Size of one FAT copy, in blocks.
    pub fn fat_blocks(&self) -> u64 {
        self.fat_size
    }

    /// Fixed root directory entry count (zero on FAT32).
    pub fn root_entries(&self) -> u64 {
        self.root_entry_count
    }

    /// Number of blocks in the data region.
    pub fn data_blocks(&self) -> u64 {
        self.data_block_count
    }

    /// Number of allocation clusters in the data region.
    pub fn data_clusters(&self) -> u64 {
        self.data_cluster_count
    }

    /// Read LBA 0 and validate every field this driver depends on.
    fn parse_superblock(store: &mut S) -> Result<Geometry, &'static str> {
        if store.block_size() as u64 != SECTOR_SIZE {
            return Err("backing block size is not 512");
        }

        let mut sector = vec![0u8; store.block_size()];
        store
            .read_at(0, &mut sector)
            .map_err(|_| "boot sector unreadable")?;

        if !BiosParameterBlock::signature_ok(&sector) {
            return Err("missing 0xAA55 signature");
        }

        let bpb = BiosParameterBlock::decode(&sector);

        if bpb.block_size != SECTOR_SIZE {
            return Err("logical sector size is not 512");
        }
        if bpb.reserved_blocks < 1 {
            // At the least the boot sector itself is reserved.
            return Err("no reserved blocks");
        }
        if bpb.cluster_size == 0 {
            return Err("zero cluster size");
        }
        if (bpb.root_entry_count * bpb::DIR_ENTRY_SIZE as u64) % bpb.block_size != 0 {
            // The root region must cover whole sectors.
            return Err("root directory region not sector-aligned");
        }
        if bpb.fat_size == 0 {
            return Err("zero FAT size");
        }
        if bpb.fat_count == 0 {
            return Err("zero FAT count");
        }

        let root_blocks = bpb.root_entry_count * bpb::DIR_ENTRY_SIZE as u64 / bpb.block_size;
        let fat_lba = bpb.reserved_blocks;
        let root_lba = bpb.reserved_blocks + bpb.fat_count * bpb.fat_size;
        let data_lba = root_lba + root_blocks;

        if data_lba >= bpb.block_count {
            return Err("data region starts past the end of the volume");
        }

        let data_block_count = bpb.block_count - data_lba;
        let data_cluster_count = data_block_count / bpb.cluster_size;
        if data_cluster_count == 0 {
            return Err("no data clusters");
        }

        let fat_type = if data_cluster_count <= FAT12_MAX_CLUSTER_COUNT {
            FatType::Fat12
        } else if data_cluster_count <= FAT16_MAX_CLUSTER_COUNT {
            FatType::Fat16
        } else {
            FatType::Fat32
        };

        if bpb.reserved_blocks + bpb.fat_count * bpb.fat_size + root_blocks + data_block_count
            != bpb.block_count
        {
            return Err("region sizes do not add up to the volume size");
        }

        let fat32 = fat_type == FatType::Fat32;
        let root_cluster = if fat32 { bpb::fat32_root_cluster(&sector) } else { 0 };

        Ok(Geometry {
            fat_type,
            volume_label: bpb::volume_label(&sector, fat32),
            cluster_size: bpb.cluster_size,
            reserved_blocks: bpb.reserved_blocks,
            fat_count: bpb.fat_count,
            fat_size: bpb.fat_size,
            root_entry_count: bpb.root_entry_count,
            root_cluster,
            block_count: bpb.block_count,
            fat_lba,
            root_lba,
            data_lba,
            data_block_count,
            data_cluster_count,
        })
    }

    fn require_mounted(&self) -> Result<(), FsError> {
        if self.fat_type == FatType::None {
            Err(FsError::Unavailable)
        } else {
            Ok(())
        }
    }

    /// Copy a node's FAT context out. Nodes carrying a foreign context
    /// never belong to this filesystem.
    pub(crate) fn node_context(node: &Node) -> Result<FatNodeContext, FsError> {
        match &node.context {
            NodeContext::Fat(ctx) => Ok(*ctx),
            _ => Err(FsError::Unavailable),
        }
    }

    pub(crate) fn set_node_context(node: &mut Node, ctx: FatNodeContext) {
        node.context = NodeContext::Fat(ctx);
    }

    /// Number of blocks in the FAT12/16 fixed root directory region.
    pub(crate) fn root_region_blocks(&self) -> u64 {
        self.root_entry_count * bpb::DIR_ENTRY_SIZE as u64 / SECTOR_SIZE
    }

    // =================================================================
    // Cached block I/O
    // =================================================================
    //
    // Read: a slot hit returns the buffered block; a miss reads through
    // and records the LBA, or clears the slot when the read fails.
    // Write: the store is written first; success records the LBA (the
    // slot buffer is the write source), failure clears the slot.

    /// Load the `block_no`-th FAT block into the FAT cache slot.
    pub(crate) fn load_fat_block(&mut self, block_no: u64) -> Result<(), FsError> {
        let lba = self.fat_lba + block_no;
        if lba == self.fat_cache_lba {
            return Ok(());
        }
        match self.store.read_at(lba, &mut self.fat_cache) {
            Ok(()) => {
                self.fat_cache_lba = lba;
                Ok(())
            }
            Err(_) => {
                self.fat_cache_lba = CACHE_EMPTY;
                Err(FsError::Io)
            }
        }
    }

    /// Write the FAT cache slot back as the `block_no`-th FAT block.
    pub(crate) fn store_fat_block(&mut self, block_no: u64) -> Result<(), FsError> {
        let lba = self.fat_lba + block_no;
        match self.store.write_at(lba, &self.fat_cache) {
            Ok(()) => {
                self.fat_cache_lba = lba;
                Ok(())
            }
            Err(_) => {
                self.fat_cache_lba = CACHE_EMPTY;
                Err(FsError::Io)
            }
        }
    }

    /// Load an absolute LBA into the data/root cache slot.
    pub(crate) fn load_block(&mut self, lba: u64) -> Result<(), FsError> {
        if lba == self.data_cache_lba {
            return Ok(());
        }
        match self.store.read_at(lba, &mut self.data_cache) {
            Ok(()) => {
                self.data_cache_lba = lba;
                Ok(())
            }
            Err(_) => {
                self.data_cache_lba = CACHE_EMPTY;
                Err(FsError::Io)
            }
        }
    }

    /// Write the data/root cache slot back to an absolute LBA.
    pub(crate) fn store_block(&mut self, lba: u64) -> Result<(), FsError> {
        match self.store.write_at(lba, &self.data_cache) {
            Ok(()) => {
                self.data_cache_lba = lba;
                Ok(())
            }
            Err(_) => {
                self.data_cache_lba = CACHE_EMPTY;
                Err(FsError::Io)
            }
        }
    }

    /// Load the block under a node's cursor into the data/root cache and
    /// return its absolute LBA.
    ///
    /// Fails with [`FsError::Eof`] past the fixed root region or when the
    /// cursor sits at end-of-chain.
    pub(crate) fn load_node_block(&mut self, node: &Node) -> Result<u64, FsError> {
        let ctx = Self::node_context(node)?;

        let lba = if ctx.in_root_region {
            if ctx.current_block >= self.root_region_blocks() {
                return Err(FsError::Eof);
            }
            self.root_lba + ctx.current_block
        } else {
            if ctx.current_block == BLOCK_EOC {
                return Err(FsError::Eof);
            }
            self.data_lba + ctx.current_block
        };

        self.load_block(lba)?;
        Ok(lba)
    }
}

impl<S: BlockStore> Filesystem for FatFs<S> {
    fn fs_type(&self) -> &'static str {
        "FAT"
    }

    fn volume_label(&self) -> &str {
        &self.volume_label
    }

    /// FAT name lookup is case-insensitive.
    fn is_case_sensitive(&self) -> bool {
        false
    }

    fn root(&mut self) -> Result<Node, FsError> {
        self.root_node()
    }

    fn read_dir(&mut self, parent: &mut Node) -> Result<Node, FsError> {
        self.read_dir_entry(parent)
    }

    fn seek(&mut self, node: &mut Node, pos: u64) -> Result<(), FsError> {
        self.seek_node(node, pos)
    }

    fn read(&mut self, file: &mut Node, buf: &mut [u8]) -> (usize, Result<(), FsError>) {
        self.read_node(file, buf)
    }

    fn write(&mut self, file: &mut Node, buf: &[u8]) -> (usize, Result<(), FsError>) {
        self.write_node(file, buf)
    }

    fn truncate(&mut self, file: &mut Node) -> Result<(), FsError> {
        self.truncate_node(file)
    }

    fn remove_node(&mut self, _node: &mut Node) -> Result<(), FsError> {
        Err(FsError::Unavailable)
    }

    fn rename_node(&mut self, _node: &mut Node, _new_name: &str) -> Result<(), FsError> {
        Err(FsError::Unavailable)
    }

    fn move_node(&mut self, _node: &mut Node, _new_path: &str) -> Result<(), FsError> {
        Err(FsError::Unavailable)
    }

    fn mkdir(&mut self, _parent: &mut Node, _name: &str) -> Result<Node, FsError> {
        Err(FsError::Unavailable)
    }

    fn mkfile(&mut self, _parent: &mut Node, _name: &str) -> Result<Node, FsError> {
        Err(FsError::Unavailable)
    }
}
