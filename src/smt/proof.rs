//! Existence, non-existence, and insertion proofs

use super::path;
use super::update::{fold_siblings, leaf_subtree};
use crate::hasher::NodeHasher;
use crate::model::{Hash, Key, Value};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// The result of walking the tree along the path of `key`.
///
/// - existence proof: the walk ended at the leaf for `key`; `old_key` and
///   `old_value` are that leaf's key and value.
/// - non-existence proof ending at an empty node: `is_old0` is set and
///   `old_key`/`old_value` are zero.
/// - non-existence proof ending at another leaf: `old_key`/`old_value` name
///   the boundary leaf the circuit checks against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// The key the walk was for
    pub key: Key,
    /// Sibling hashes, root-to-leaf, one per level descended
    pub siblings: Vec<Hash>,
    pub old_key: Key,
    pub old_value: Value,
    /// Whether the walk terminated on an empty node.
    ///
    /// Set only for an Empty terminal. A walk that stops at a boundary leaf
    /// keeps this false even when that leaf's key is 0: inserting key 2 next
    /// to leaf `(0, 0)` reports `old_key = 0`, `old_value = 0` and
    /// `is_old0 = false`. A circuit consuming the proof must hash that leaf
    /// as the terminal rather than treat key 0 as the empty marker, since
    /// only the leaf hash recombines with `siblings` into the old root.
    pub is_old0: bool,
    pub existence: bool,
}

impl Proof {
    pub(crate) fn found(key: Key, value: Value, siblings: Vec<Hash>) -> Self {
        Proof {
            key,
            siblings,
            old_key: key,
            old_value: value,
            is_old0: false,
            existence: true,
        }
    }

    pub(crate) fn boundary(key: Key, old_key: Key, old_value: Value, siblings: Vec<Hash>) -> Self {
        Proof {
            key,
            siblings,
            old_key,
            old_value,
            is_old0: false,
            existence: false,
        }
    }

    pub(crate) fn empty(key: Key, siblings: Vec<Hash>) -> Self {
        Proof {
            key,
            siblings,
            old_key: 0,
            old_value: Value::ZERO,
            is_old0: true,
            existence: false,
        }
    }

    /// Depth at which the walk terminated
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// The proven value, for existence proofs
    pub fn value(&self) -> Option<&Value> {
        self.existence.then_some(&self.old_value)
    }

    /// Hash of the node the walk terminated on
    pub fn terminal_hash<H: NodeHasher>(&self) -> Hash {
        if self.is_old0 {
            Hash::ZERO
        } else {
            H::hash_leaf(self.old_key, &self.old_value)
        }
    }

    /// Replay the sibling hash chain from the terminal node to a root
    pub fn compute_root<H: NodeHasher>(&self) -> Hash {
        fold_siblings::<H>(self.key, &self.siblings, self.terminal_hash::<H>(), None)
    }

    /// Check this proof against `root`.
    ///
    /// Beyond the hash chain, this checks that the proof's fields are
    /// consistent with each other, so a non-existence proof cannot be built
    /// from the leaf of the very key it claims is absent.
    pub fn verify<H: NodeHasher>(&self, root: &Hash) -> Result<()> {
        if self.existence && (self.is_old0 || self.old_key != self.key) {
            return Err(Error::InvalidProof(format!(
                "existence proof for key {} does not end at its leaf",
                self.key
            )));
        }
        if !self.existence && !self.is_old0 {
            if self.old_key == self.key {
                return Err(Error::InvalidProof(format!(
                    "non-existence proof for key {} ends at its own leaf",
                    self.key
                )));
            }
            if path::divergence(self.old_key, self.key, self.depth()).is_some() {
                return Err(Error::InvalidProof(format!(
                    "boundary leaf {} is not on the path of key {}",
                    self.old_key, self.key
                )));
            }
        }

        let computed = self.compute_root::<H>();
        if &computed == root {
            Ok(())
        } else {
            Err(Error::InvalidProof(format!(
                "root mismatch for key {}: expected {}, computed {}",
                self.key,
                root.short(),
                computed.short()
            )))
        }
    }

    /// Check that this proof shows `key` present with `value` under `root`
    pub fn verify_existence<H: NodeHasher>(&self, root: &Hash, value: &Value) -> Result<()> {
        if !self.existence {
            return Err(Error::InvalidProof(format!(
                "key {} is absent under {}",
                self.key,
                root.short()
            )));
        }
        if &self.old_value != value {
            return Err(Error::InvalidProof(format!(
                "key {} holds {}, not {}",
                self.key, self.old_value, value
            )));
        }
        self.verify::<H>(root)
    }

    /// Root of the tree after inserting `(self.key, value)` into the tree
    /// this non-existence proof was taken from.
    ///
    /// This is the state transition a circuit checks: the same siblings that
    /// authenticate the old root produce the new one.
    pub fn root_after_insert<H: NodeHasher>(&self, value: Value, levels: usize) -> Result<Hash> {
        if self.existence {
            return Err(Error::DuplicateKey(self.key));
        }
        let existing = (!self.is_old0).then_some((self.old_key, &self.old_value));
        let subtree = leaf_subtree::<H>(existing, self.key, value, self.depth(), levels, None)?;
        Ok(fold_siblings::<H>(self.key, &self.siblings, subtree, None))
    }

    /// Check that inserting `(self.key, value)` moves `old_root` to `new_root`
    pub fn verify_transition<H: NodeHasher>(
        &self,
        old_root: &Hash,
        new_root: &Hash,
        value: Value,
        levels: usize,
    ) -> Result<()> {
        if self.existence {
            return Err(Error::InvalidProof(format!(
                "key {} already present before insertion",
                self.key
            )));
        }
        self.verify::<H>(old_root)?;
        let computed = self.root_after_insert::<H>(value, levels)?;
        if &computed == new_root {
            Ok(())
        } else {
            Err(Error::InvalidProof(format!(
                "transition for key {} reaches {}, not {}",
                self.key,
                computed.short(),
                new_root.short()
            )))
        }
    }
}
