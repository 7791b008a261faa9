//! # zkonacci
//!
//! A sparse Merkle accumulator for an append-only integer sequence, producing
//! the proofs a zero-knowledge circuit needs to check each new term.
//!
//! Every term of the sequence is a leaf `(n, F(n))`. Before appending `F(n)`
//! the accumulator proves that `F(n-1)` and `F(n-2)` exist under the current
//! root, then inserts `F(n)` and proves the resulting root transition. The
//! three proofs are packed into the exact input layout the circuit expects.
//!
//! ## Core Concepts
//!
//! - **Tree**: a sparse Merkle tree over a fixed number of levels, addressed
//!   by the low-order bits of each key
//! - **Node store**: content-addressed, append-only storage for tree nodes
//! - **Proofs**: sibling paths proving presence, absence, or an insertion
//! - **Circuit inputs**: the field layout consumed by the external prover
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zkonacci::{Accumulator, Address, MemoryStore, Seeds, SparseMerkleTree};
//!
//! let tree = SparseMerkleTree::new(6, Arc::new(MemoryStore::new()))?;
//! let mut acc = Accumulator::genesis(tree, Seeds::default())?;
//! let step = acc.step(Address::ZERO)?;
//! println!("{}", serde_json::to_string(&step.inputs)?);
//! ```

pub mod circuit;
pub mod config;
pub mod hasher;
pub mod logging;
pub mod model;
pub mod prover;
pub mod sequence;
pub mod smt;
pub mod store;

mod error;

pub use circuit::{pad_siblings, Address, CircuitInputs, Submission};
pub use config::{Config, ProverKind};
pub use error::{Error, Result};
pub use hasher::{Blake3Hasher, NodeHasher};
pub use model::{Hash, Key, Value, FIELD_MODULUS};
pub use prover::{MockProver, ProofBytes, Prover, SnarkjsProver};
pub use sequence::{Accumulator, Seeds, Step};
pub use smt::{Node, Proof, SparseMerkleTree, TreeSnapshot};
pub use store::{FileStore, MemoryStore, NodeStore};

/// Store file format version
pub const VERSION: u32 = 1;

/// Magic bytes for file identification
pub const MAGIC: &[u8; 8] = b"ZKFIBSMT";
