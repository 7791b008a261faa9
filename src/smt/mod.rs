//! Sparse Merkle tree over a fixed number of levels
//!
//! This implements a content-addressed binary trie where:
//! - A key's low-order bits, LSB first, choose left/right at each depth
//! - Each node's hash is derived from its content, so nodes are immutable
//! - Insertion only adds nodes; the root hash is the single commit point
//! - Every root ever committed stays provable

mod node;
mod path;
mod proof;
mod tree;
mod update;

pub use node::{Node, NodeKind};
pub use path::{bit, divergence, path_bits};
pub use proof::Proof;
pub use tree::{SparseMerkleTree, TreeSnapshot, MAX_LEVELS};
