//! Content-addressed node stores
//!
//! The tree only needs a narrow contract from its storage: look a node up by
//! hash, insert a node under its hash, and ask whether a hash is present.
//! Nodes are never deleted or overwritten, so every historical root stays
//! readable.

mod file_store;
mod memory;
mod record;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use record::NodeRecord;

use crate::model::Hash;
use crate::smt::Node;
use crate::Result;

/// Storage for tree nodes, keyed by their content hash
///
/// Implementations must be safe to read while another thread writes: the
/// tree relies on this for proofs against pinned historical roots.
pub trait NodeStore: Send + Sync {
    /// Look up the node stored under `hash`
    fn get(&self, hash: &Hash) -> Result<Option<Node>>;

    /// Store `node` under `hash`. Storing identical content twice is a no-op.
    fn put(&self, hash: Hash, node: &Node) -> Result<()>;

    /// Check if a hash exists
    fn has(&self, hash: &Hash) -> Result<bool>;
}
