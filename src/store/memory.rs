//! In-memory node store

use super::NodeStore;
use crate::model::Hash;
use crate::smt::Node;
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A node store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<HashMap<Hash, Node>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl NodeStore for MemoryStore {
    fn get(&self, hash: &Hash) -> Result<Option<Node>> {
        Ok(self.nodes.read().get(hash).cloned())
    }

    fn put(&self, hash: Hash, node: &Node) -> Result<()> {
        self.nodes
            .write()
            .entry(hash)
            .or_insert_with(|| node.clone());
        Ok(())
    }

    fn has(&self, hash: &Hash) -> Result<bool> {
        Ok(self.nodes.read().contains_key(hash))
    }
}
