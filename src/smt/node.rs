//! Tree node types

use crate::hasher::NodeHasher;
use crate::model::{Hash, Key, Value};
use serde::{Deserialize, Serialize};

/// A node in the sparse Merkle tree
///
/// Nodes are content-addressed: a node's identity is the hash of its
/// content, so a stored node never changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Nothing here. Never stored; always hashes to [`Hash::ZERO`].
    Empty,
    /// A leaf holding a key and its value
    Leaf { key: Key, value: Value },
    /// An internal node with the hashes of its two children
    Middle { left: Hash, right: Hash },
}

/// Node kind tag, used by stores that keep a type byte per record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Empty,
    Leaf,
    Middle,
}

impl NodeKind {
    pub fn as_byte(&self) -> u8 {
        match self {
            NodeKind::Empty => 0,
            NodeKind::Leaf => 1,
            NodeKind::Middle => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(NodeKind::Empty),
            1 => Some(NodeKind::Leaf),
            2 => Some(NodeKind::Middle),
            _ => None,
        }
    }
}

impl Node {
    /// Create a leaf node
    pub fn leaf(key: Key, value: Value) -> Self {
        Node::Leaf { key, value }
    }

    /// Create a middle node
    pub fn middle(left: Hash, right: Hash) -> Self {
        Node::Middle { left, right }
    }

    /// Compute the hash of this node
    pub fn hash<H: NodeHasher>(&self) -> Hash {
        match self {
            Node::Empty => Hash::ZERO,
            Node::Leaf { key, value } => H::hash_leaf(*key, value),
            Node::Middle { left, right } => H::hash_middle(left, right),
        }
    }

    /// The kind of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Empty => NodeKind::Empty,
            Node::Leaf { .. } => NodeKind::Leaf,
            Node::Middle { .. } => NodeKind::Middle,
        }
    }

    /// Check if this node is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Children of a middle node, selected by path bit (`false` = left)
    ///
    /// Returns `(next, sibling)`.
    pub fn descend(&self, bit: bool) -> Option<(Hash, Hash)> {
        match self {
            Node::Middle { left, right } if bit => Some((*right, *left)),
            Node::Middle { left, right } => Some((*left, *right)),
            _ => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Blake3Hasher;

    #[test]
    fn test_node_hash_deterministic() {
        let node = Node::leaf(2, Value::from(1u64));
        let h1 = node.hash::<Blake3Hasher>();
        let h2 = node.hash::<Blake3Hasher>();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_nodes_different_hashes() {
        let n1 = Node::leaf(1, Value::from(1u64));
        let n2 = Node::leaf(2, Value::from(1u64));
        assert_ne!(n1.hash::<Blake3Hasher>(), n2.hash::<Blake3Hasher>());
    }

    #[test]
    fn test_empty_hashes_to_zero() {
        assert_eq!(Node::Empty.hash::<Blake3Hasher>(), Hash::ZERO);
        assert!(Node::default().is_empty());
    }

    #[test]
    fn test_descend_picks_side_and_sibling() {
        let l = Node::leaf(0, Value::ZERO).hash::<Blake3Hasher>();
        let r = Node::leaf(1, Value::from(1u64)).hash::<Blake3Hasher>();
        let m = Node::middle(l, r);
        assert_eq!(m.descend(false), Some((l, r)));
        assert_eq!(m.descend(true), Some((r, l)));
        assert_eq!(Node::leaf(0, Value::ZERO).descend(true), None);
    }

    #[test]
    fn test_kind_byte_roundtrip() {
        for kind in [NodeKind::Empty, NodeKind::Leaf, NodeKind::Middle] {
            assert_eq!(NodeKind::from_byte(kind.as_byte()), Some(kind));
        }
        assert_eq!(NodeKind::from_byte(9), None);
    }
}
