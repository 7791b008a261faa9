//! Path rebuilding shared by insertion and proof replay
//!
//! Insertion and transition-proof verification perform the same computation:
//! build the subtree that replaces the terminal node of a walk, then hash it
//! back up to the root through the recorded siblings. Insertion keeps the
//! nodes it creates; verification only keeps the hashes.

use super::node::Node;
use super::path;
use crate::hasher::NodeHasher;
use crate::model::{Hash, Key, Value};
use crate::{Error, Result};

/// Nodes created while rebuilding, in creation order (bottom-up).
pub(crate) type Created = Vec<(Hash, Node)>;

fn record(created: &mut Option<&mut Created>, hash: Hash, node: Node) {
    if let Some(created) = created.as_deref_mut() {
        created.push((hash, node));
    }
}

/// Build the subtree placing leaf `(key, value)` where a walk for `key`
/// terminated at `depth`.
///
/// `existing` is the leaf the walk stopped at, if any. When present, that
/// leaf is pushed down: middle nodes are synthesized along the common bit
/// prefix of both keys until their paths diverge, and both leaves become
/// children of the middle at the diverging depth.
pub(crate) fn leaf_subtree<H: NodeHasher>(
    existing: Option<(Key, &Value)>,
    key: Key,
    value: Value,
    depth: usize,
    levels: usize,
    mut created: Option<&mut Created>,
) -> Result<Hash> {
    let leaf = Node::leaf(key, value);
    let leaf_hash = leaf.hash::<H>();
    record(&mut created, leaf_hash, leaf);

    let Some((old_key, old_value)) = existing else {
        return Ok(leaf_hash);
    };
    if old_key == key {
        return Err(Error::DuplicateKey(key));
    }

    let split = path::divergence(old_key, key, levels).ok_or(Error::Capacity {
        key,
        existing: old_key,
        levels,
    })?;
    if split < depth {
        return Err(Error::Corruption(format!(
            "leaf for key {} sits at depth {} but leaves the path of key {} at depth {}",
            old_key, depth, key, split
        )));
    }

    // The existing leaf is already stored under its own hash.
    let old_hash = H::hash_leaf(old_key, old_value);
    let (left, right) = if path::bit(key, split) {
        (old_hash, leaf_hash)
    } else {
        (leaf_hash, old_hash)
    };
    let node = Node::middle(left, right);
    let mut hash = node.hash::<H>();
    record(&mut created, hash, node);

    for d in (depth..split).rev() {
        let (left, right) = if path::bit(key, d) {
            (Hash::ZERO, hash)
        } else {
            (hash, Hash::ZERO)
        };
        let node = Node::middle(left, right);
        hash = node.hash::<H>();
        record(&mut created, hash, node);
    }

    Ok(hash)
}

/// Hash `child` up to the root through `siblings` (root-to-leaf order),
/// taking directions from the path of `key`.
pub(crate) fn fold_siblings<H: NodeHasher>(
    key: Key,
    siblings: &[Hash],
    mut child: Hash,
    mut created: Option<&mut Created>,
) -> Hash {
    for (depth, sibling) in siblings.iter().enumerate().rev() {
        let (left, right) = if path::bit(key, depth) {
            (*sibling, child)
        } else {
            (child, *sibling)
        };
        let node = Node::middle(left, right);
        child = node.hash::<H>();
        record(&mut created, child, node);
    }
    child
}
