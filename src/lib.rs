//! Read/write FAT12/16/32 filesystem engine over pluggable block devices.
//!
//! The crate has two halves:
//!
//! - [`store`]: the block device contract ([`BlockStore`]) and three
//!   backends — caller memory ([`MemStore`]), a host file ([`FileStore`])
//!   and a block-size rescaling wrapper ([`ScaleStore`]).
//! - [`fs`] + [`fat`]: a generic filesystem interface ([`Filesystem`],
//!   [`Node`]) and its FAT implementation ([`FatFs`]), covering all three
//!   FAT widths with a two-slot write-through block cache.
//!
//! Mounting never panics and never fails loudly: a volume that does not
//! parse yields a filesystem whose operations all return
//! [`FsError::Unavailable`], with the reason logged through the [`log`]
//! facade.
//!
//! ```no_run
//! use microfat::{FatFs, FileStore, Filesystem};
//!
//! # fn main() -> Result<(), microfat::FsError> {
//! let store = FileStore::open("floppy.img", false).map_err(microfat::FsError::from)?;
//! let mut fs = FatFs::mount(store);
//!
//! let mut file = fs.get("/docs/readme.txt")?;
//! let mut buf = [0u8; 128];
//! let (n, _status) = fs.read(&mut file, &mut buf);
//! println!("{}", String::from_utf8_lossy(&buf[..n]));
//! # Ok(())
//! # }
//! ```
//!
//! Single-threaded by contract: a filesystem and its nodes belong to one
//! caller at a time. Long file names and timestamps are carried, not
//! interpreted.

pub mod fat;
pub mod fs;
pub mod store;

pub use fat::{DirAttributes, FatFs, FatNodeContext, FatType};
pub use fs::{Filesystem, FsError, Node, NodeContext, MAX_NAME_LENGTH};
pub use store::{BlockStore, FileStore, MemStore, ScaleStore, StoreError};
