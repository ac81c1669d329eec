//! Generic filesystem interface.
//!
//! [`Filesystem`] is the polymorphic facade every filesystem
//! implementation provides: directory traversal, metadata, file I/O. The
//! path walker ([`get`](Filesystem::get) / [`get_child`](Filesystem::get_child))
//! is implemented here once, on top of [`read_dir`](Filesystem::read_dir),
//! and shared by all backends.

mod node;

pub use node::{Node, NodeContext, MAX_NAME_LENGTH};

use crate::store::StoreError;
use core::fmt;

/// Filesystem operation error codes.
///
/// [`Eof`](FsError::Eof) is a normal signal — the end of a file or
/// directory — that flows through the same channel as real errors;
/// callers must tell it apart explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// An error in the block (store) layer.
    Io,
    /// No free clusters, or a write past a fixed-size directory region.
    NoSpace,
    /// File operation attempted on a non-file object.
    NotFile,
    /// Directory operation attempted on a non-directory object.
    NotDirectory,
    /// Referenced filesystem object does not exist.
    NotFound,
    /// Operation is not available on this filesystem.
    Unavailable,
    /// The end of a file or directory was reached.
    Eof,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::Io => write!(f, "I/O error in the block layer"),
            FsError::NoSpace => write!(f, "no space available"),
            FsError::NotFile => write!(f, "not a file"),
            FsError::NotDirectory => write!(f, "not a directory"),
            FsError::NotFound => write!(f, "object not found"),
            FsError::Unavailable => write!(f, "operation unavailable"),
            FsError::Eof => write!(f, "end of file or directory"),
        }
    }
}

impl std::error::Error for FsError {}

impl From<StoreError> for FsError {
    fn from(_: StoreError) -> Self {
        FsError::Io
    }
}

/// Interface shared by all filesystem implementations.
///
/// Operations take nodes by mutable reference: node cursors and the
/// filesystem's internal caches both move. `read` and `write` return the
/// transferred byte count next to the status so that partial transfers
/// survive an error; the count is authoritative either way.
pub trait Filesystem {
    /// Short name of the filesystem type, e.g. `"FAT"`.
    fn fs_type(&self) -> &'static str;

    /// Label describing this volume. May be empty.
    fn volume_label(&self) -> &str;

    /// Whether filenames compare case-sensitively. [`get`](Self::get) and
    /// [`get_child`](Self::get_child) behave accordingly.
    fn is_case_sensitive(&self) -> bool {
        true
    }

    /// The root directory of this filesystem.
    fn root(&mut self) -> Result<Node, FsError>;

    /// Read the next entry from a directory, advancing its cursor.
    /// Returns [`FsError::Eof`] once the directory is exhausted.
    fn read_dir(&mut self, parent: &mut Node) -> Result<Node, FsError>;

    /// Move a node's cursor: to a byte offset for files, or back to the
    /// start (`pos == 0`) for directories.
    fn seek(&mut self, node: &mut Node, pos: u64) -> Result<(), FsError>;

    /// Read up to `buf.len()` bytes from `file` at its cursor.
    ///
    /// Returns the byte count actually transferred together with the
    /// status; on [`FsError::Eof`] the count covers the readable tail.
    fn read(&mut self, file: &mut Node, buf: &mut [u8]) -> (usize, Result<(), FsError>);

    /// Write `buf` to `file` at its cursor, growing the file as needed.
    ///
    /// Returns the byte count actually transferred together with the
    /// status.
    fn write(&mut self, file: &mut Node, buf: &[u8]) -> (usize, Result<(), FsError>);

    /// Cut `file` off at its current position.
    fn truncate(&mut self, file: &mut Node) -> Result<(), FsError>;

    /// Delete a node.
    fn remove_node(&mut self, node: &mut Node) -> Result<(), FsError>;

    /// Rename a node in place.
    fn rename_node(&mut self, node: &mut Node, new_name: &str) -> Result<(), FsError>;

    /// Move a node to a new path.
    fn move_node(&mut self, node: &mut Node, new_path: &str) -> Result<(), FsError>;

    /// Create a subdirectory under `parent`.
    fn mkdir(&mut self, parent: &mut Node, name: &str) -> Result<Node, FsError>;

    /// Create an empty file under `parent`.
    fn mkfile(&mut self, parent: &mut Node, name: &str) -> Result<Node, FsError>;

    /// Move a node's cursor back to the start.
    fn rewind(&mut self, node: &mut Node) -> Result<(), FsError> {
        self.seek(node, 0)
    }

    /// Resolve `path` relative to the directory `dir`.
    ///
    /// Segments are matched against [`read_dir`](Self::read_dir) output
    /// one directory at a time; `.` and `..` are not honoured. An empty
    /// path (after stripping leading `/`) resolves to `dir` itself.
    fn get_child(&mut self, dir: &mut Node, path: &str) -> Result<Node, FsError> {
        if !dir.is_directory() {
            return Err(FsError::NotDirectory);
        }

        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Ok(dir.clone());
        }

        let (segment, rest) = match path.find('/') {
            Some(at) => (&path[..at], &path[at..]),
            None => (path, ""),
        };

        self.rewind(dir)?;

        loop {
            let mut child = match self.read_dir(dir) {
                Ok(child) => child,
                Err(FsError::Eof) => {
                    let _ = self.rewind(dir);
                    return Err(FsError::NotFound);
                }
                Err(err) => {
                    let _ = self.rewind(dir);
                    return Err(err);
                }
            };

            let matches = if self.is_case_sensitive() {
                child.name() == segment
            } else {
                child.name().eq_ignore_ascii_case(segment)
            };
            if !matches {
                continue;
            }

            self.rewind(dir)?;

            return if rest.is_empty() {
                Ok(child)
            } else if child.is_directory() {
                self.get_child(&mut child, rest)
            } else {
                Err(FsError::NotFound)
            };
        }
    }

    /// Resolve an absolute `path` starting at the root.
    fn get(&mut self, path: &str) -> Result<Node, FsError> {
        let mut root = self.root()?;
        self.get_child(&mut root, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy filesystem over a fixed tree, for exercising the walker
    /// without a block device.
    struct TreeFs {
        case_sensitive: bool,
    }

    // (parent, name, is_dir); directory cursors index into this table.
    const TREE: &[(&str, &str, bool)] = &[
        ("/", "ALPHA", true),
        ("/", "NOTES.TXT", false),
        ("ALPHA", "BETA", true),
        ("ALPHA", "A.TXT", false),
        ("BETA", "DEEP.TXT", false),
    ];

    impl TreeFs {
        fn dir_node(name: &str) -> Node {
            Node::new(name, true, true, 0)
        }
    }

    impl Filesystem for TreeFs {
        fn fs_type(&self) -> &'static str {
            "tree"
        }
        fn volume_label(&self) -> &str {
            ""
        }
        fn is_case_sensitive(&self) -> bool {
            self.case_sensitive
        }
        fn root(&mut self) -> Result<Node, FsError> {
            Ok(Self::dir_node("/"))
        }
        fn read_dir(&mut self, parent: &mut Node) -> Result<Node, FsError> {
            if !parent.is_directory() {
                return Err(FsError::NotDirectory);
            }
            let children: Vec<_> =
                TREE.iter().filter(|(p, _, _)| *p == parent.name()).collect();
            match children.get(parent.pos as usize) {
                Some((_, name, is_dir)) => {
                    parent.pos += 1;
                    Ok(Node::new(name, true, *is_dir, 0))
                }
                None => Err(FsError::Eof),
            }
        }
        fn seek(&mut self, node: &mut Node, pos: u64) -> Result<(), FsError> {
            if pos != 0 {
                return Err(FsError::Unavailable);
            }
            node.pos = 0;
            Ok(())
        }
        fn read(&mut self, _: &mut Node, _: &mut [u8]) -> (usize, Result<(), FsError>) {
            (0, Err(FsError::Unavailable))
        }
        fn write(&mut self, _: &mut Node, _: &[u8]) -> (usize, Result<(), FsError>) {
            (0, Err(FsError::Unavailable))
        }
        fn truncate(&mut self, _: &mut Node) -> Result<(), FsError> {
            Err(FsError::Unavailable)
        }
        fn remove_node(&mut self, _: &mut Node) -> Result<(), FsError> {
            Err(FsError::Unavailable)
        }
        fn rename_node(&mut self, _: &mut Node, _: &str) -> Result<(), FsError> {
            Err(FsError::Unavailable)
        }
        fn move_node(&mut self, _: &mut Node, _: &str) -> Result<(), FsError> {
            Err(FsError::Unavailable)
        }
        fn mkdir(&mut self, _: &mut Node, _: &str) -> Result<Node, FsError> {
            Err(FsError::Unavailable)
        }
        fn mkfile(&mut self, _: &mut Node, _: &str) -> Result<Node, FsError> {
            Err(FsError::Unavailable)
        }
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let mut fs = TreeFs { case_sensitive: true };
        assert_eq!(fs.get("").unwrap().name(), "/");
        assert_eq!(fs.get("/").unwrap().name(), "/");
        assert_eq!(fs.get("///").unwrap().name(), "/");
    }

    #[test]
    fn walks_nested_path() {
        let mut fs = TreeFs { case_sensitive: true };
        let node = fs.get("/ALPHA/BETA/DEEP.TXT").unwrap();
        assert_eq!(node.name(), "DEEP.TXT");
        assert!(!node.is_directory());
    }

    #[test]
    fn missing_segment_is_not_found() {
        let mut fs = TreeFs { case_sensitive: true };
        assert_eq!(fs.get("/ALPHA/GAMMA").unwrap_err(), FsError::NotFound);
        assert_eq!(fs.get("/MISSING").unwrap_err(), FsError::NotFound);
    }

    #[test]
    fn descending_into_a_file_is_not_found() {
        let mut fs = TreeFs { case_sensitive: true };
        assert_eq!(fs.get("/NOTES.TXT/X").unwrap_err(), FsError::NotFound);
    }

    #[test]
    fn case_sensitivity_is_honoured() {
        let mut fs = TreeFs { case_sensitive: true };
        assert_eq!(fs.get("/alpha").unwrap_err(), FsError::NotFound);

        let mut fs = TreeFs { case_sensitive: false };
        assert_eq!(fs.get("/alpha/beta/deep.txt").unwrap().name(), "DEEP.TXT");
    }

    #[test]
    fn walker_composes_with_get_child() {
        let mut fs = TreeFs { case_sensitive: true };
        let direct = fs.get("/ALPHA/A.TXT").unwrap();
        let mut root = fs.get("/").unwrap();
        let via_root = fs.get_child(&mut root, "ALPHA/A.TXT").unwrap();
        assert_eq!(direct.name(), via_root.name());
    }

    #[test]
    fn walker_rewinds_the_scanned_directory() {
        let mut fs = TreeFs { case_sensitive: true };
        let mut root = fs.root().unwrap();
        let _ = fs.get_child(&mut root, "NOTES.TXT").unwrap();
        assert_eq!(root.position(), 0);
        let _ = fs.get_child(&mut root, "MISSING").unwrap_err();
        assert_eq!(root.position(), 0);
    }
}
