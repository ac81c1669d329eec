//! File and directory handles.

/// Max length of node basenames, in bytes.
pub const MAX_NAME_LENGTH: usize = 32;

/// A file or directory inside a mounted filesystem.
///
/// Nodes are plain values produced by their filesystem; they hold a name,
/// metadata, a position cursor and a filesystem-private [`NodeContext`].
/// All state changes go through the owning [`Filesystem`]
/// (`fs.read(&mut node, ..)` and friends) — a node by itself cannot touch
/// the medium.
///
/// [`Filesystem`]: crate::fs::Filesystem
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) exists: bool,
    pub(crate) directory: bool,
    pub(crate) size: u64,
    pub(crate) pos: u64,
    pub(crate) context: NodeContext,
}

impl Node {
    pub(crate) fn new(name: &str, exists: bool, directory: bool, size: u64) -> Self {
        let mut name = name.to_owned();
        if name.len() > MAX_NAME_LENGTH {
            let mut cut = MAX_NAME_LENGTH;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            name.truncate(cut);
        }
        Node { name, exists, directory, size, pos: 0, context: NodeContext::None }
    }

    /// The node's basename. `"/"` for a root directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this node exists at all. `Node::default()` and nodes
    /// returned alongside errors do not.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Whether this node is a directory.
    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// File size in bytes. Zero for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current position: a byte offset for files, an entry index for
    /// directories.
    pub fn position(&self) -> u64 {
        self.pos
    }
}

/// Filesystem-private per-node state, tagged by backend.
///
/// Each filesystem implementation stores its cursor bookkeeping in its own
/// variant and rejects nodes carrying any other.
#[derive(Debug, Clone, Default)]
pub enum NodeContext {
    /// No filesystem has claimed this node.
    #[default]
    None,
    /// State for nodes of a [`FatFs`](crate::fat::FatFs).
    Fat(crate::fat::FatNodeContext),
}
