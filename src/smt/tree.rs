//! Sparse Merkle tree engine

use super::path;
use super::update::{fold_siblings, leaf_subtree, Created};
use super::{Node, Proof};
use crate::hasher::{Blake3Hasher, NodeHasher};
use crate::model::{Hash, Key, Value};
use crate::store::NodeStore;
use crate::{Error, Result};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// Largest supported level count: one level per digest bit
pub const MAX_LEVELS: usize = Hash::BITS;

fn check_levels(levels: usize) -> Result<()> {
    if levels == 0 || levels > MAX_LEVELS {
        return Err(Error::Config(format!(
            "level count must be between 1 and {}, got {}",
            MAX_LEVELS, levels
        )));
    }
    Ok(())
}

/// A sparse Merkle tree
///
/// The tree owns its current root; nodes live in a shared [`NodeStore`].
/// Writers take `&mut self`, so a tree has at most one insertion in flight.
/// Readers that need a stable view take a [`TreeSnapshot`], which pins a
/// root and stays valid while the tree keeps growing.
pub struct SparseMerkleTree<S, H = Blake3Hasher> {
    store: Arc<S>,
    levels: usize,
    root: Hash,
    hasher: PhantomData<fn() -> H>,
}

impl<S: NodeStore> SparseMerkleTree<S, Blake3Hasher> {
    /// Create an empty tree hashing with BLAKE3
    pub fn new(levels: usize, store: Arc<S>) -> Result<Self> {
        Self::with_hasher(levels, store)
    }
}

impl<S: NodeStore, H: NodeHasher> SparseMerkleTree<S, H> {
    /// Create an empty tree with a custom node hasher
    pub fn with_hasher(levels: usize, store: Arc<S>) -> Result<Self> {
        check_levels(levels)?;
        Ok(SparseMerkleTree {
            store,
            levels,
            root: Hash::ZERO,
            hasher: PhantomData,
        })
    }

    /// Load a tree from a root hash already present in `store`
    pub fn from_root(levels: usize, store: Arc<S>, root: Hash) -> Result<Self> {
        check_levels(levels)?;
        if !root.is_zero() && !store.has(&root)? {
            return Err(Error::NodeNotFound(root));
        }
        Ok(SparseMerkleTree {
            store,
            levels,
            root,
            hasher: PhantomData,
        })
    }

    /// Get the root hash
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Number of levels
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// The backing node store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// A read-only view pinned to the current root
    pub fn snapshot(&self) -> TreeSnapshot<S, H> {
        TreeSnapshot {
            store: Arc::clone(&self.store),
            levels: self.levels,
            root: self.root,
            hasher: PhantomData,
        }
    }

    /// A read-only view pinned to a historical root
    pub fn snapshot_at(&self, root: Hash) -> Result<TreeSnapshot<S, H>> {
        if !root.is_zero() && !self.store.has(&root)? {
            return Err(Error::NodeNotFound(root));
        }
        Ok(TreeSnapshot {
            root,
            ..self.snapshot()
        })
    }

    /// Get the value stored at `key`
    pub fn get(&self, key: Key) -> Result<Option<Value>> {
        self.snapshot().get(key)
    }

    /// Prove presence or absence of `key` under the current root
    pub fn generate_proof(&self, key: Key) -> Result<Proof> {
        self.snapshot().generate_proof(key)
    }

    /// Insert a key-value pair
    pub fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.insert_and_prove(key, value).map(|_| ())
    }

    /// Insert a key-value pair and return the non-existence proof for `key`
    /// taken against the pre-insertion root.
    ///
    /// The returned siblings are exactly the path the insertion rebuilt, so
    /// the proof together with `(key, value)` derives the new root (see
    /// [`Proof::root_after_insert`]).
    ///
    /// New nodes are written to the store before the root moves. On error the
    /// root is unchanged; any nodes already written are unreachable from it.
    pub fn insert_and_prove(&mut self, key: Key, value: Value) -> Result<Proof> {
        let proof = self.generate_proof(key)?;
        if proof.existence {
            return Err(Error::DuplicateKey(key));
        }

        let mut created = Created::new();
        let existing = (!proof.is_old0).then_some((proof.old_key, &proof.old_value));
        let subtree = leaf_subtree::<H>(
            existing,
            key,
            value,
            proof.depth(),
            self.levels,
            Some(&mut created),
        )?;
        let new_root = fold_siblings::<H>(key, &proof.siblings, subtree, Some(&mut created));

        for (hash, node) in &created {
            self.store.put(*hash, node)?;
        }

        debug!(
            key,
            depth = proof.depth(),
            pushed_down = !proof.is_old0,
            nodes = created.len(),
            old_root = %self.root.short(),
            new_root = %new_root.short(),
            "inserted leaf"
        );
        self.root = new_root;
        Ok(proof)
    }
}

/// A read-only view of a tree at a fixed root
///
/// Snapshots share the tree's store and can be sent to other threads. Since
/// stores never mutate or remove nodes, a snapshot's answers never change.
pub struct TreeSnapshot<S, H = Blake3Hasher> {
    store: Arc<S>,
    levels: usize,
    root: Hash,
    hasher: PhantomData<fn() -> H>,
}

impl<S, H> Clone for TreeSnapshot<S, H> {
    fn clone(&self) -> Self {
        TreeSnapshot {
            store: Arc::clone(&self.store),
            levels: self.levels,
            root: self.root,
            hasher: PhantomData,
        }
    }
}

impl<S: NodeStore, H: NodeHasher> TreeSnapshot<S, H> {
    /// The pinned root
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Get the value stored at `key`
    pub fn get(&self, key: Key) -> Result<Option<Value>> {
        Ok(self.generate_proof(key)?.value().copied())
    }

    /// Walk from the root along the path of `key`, collecting siblings
    pub fn generate_proof(&self, key: Key) -> Result<Proof> {
        let mut siblings = Vec::new();
        let mut current = self.root;
        let mut depth = 0;

        loop {
            if current.is_zero() {
                trace!(key, depth, "walk ended at empty node");
                return Ok(Proof::empty(key, siblings));
            }

            let node = self.load(&current)?;
            if let Node::Leaf {
                key: leaf_key,
                value,
            } = node
            {
                trace!(key, leaf_key, depth, "walk ended at leaf");
                return Ok(if leaf_key == key {
                    Proof::found(key, value, siblings)
                } else {
                    Proof::boundary(key, leaf_key, value, siblings)
                });
            }

            if depth == self.levels {
                return Err(Error::Corruption(format!(
                    "middle node {} below the last level",
                    current.short()
                )));
            }

            let (next, sibling) = node.descend(path::bit(key, depth)).ok_or_else(|| {
                Error::Corruption(format!("empty node stored under {}", current.short()))
            })?;
            siblings.push(sibling);
            current = next;
            depth += 1;
        }
    }

    fn load(&self, hash: &Hash) -> Result<Node> {
        let node = self
            .store
            .get(hash)?
            .ok_or(Error::NodeNotFound(*hash))?;

        if node.hash::<H>() != *hash {
            return Err(Error::Corruption(format!(
                "node stored under {} hashes to {}",
                hash.short(),
                node.hash::<H>().short()
            )));
        }
        Ok(node)
    }
}
