//! Fibonacci accumulator
//!
//! Keeps the terms `F(0), F(1), …` of a sequence as leaves `(n, F(n))` of a
//! sparse Merkle tree, where `F(n) = F(n-1) + F(n-2)` from two caller-chosen
//! seeds. Each [`Accumulator::step`] appends one term and returns the circuit
//! inputs proving that the append followed the recurrence.

use crate::circuit::{Address, CircuitInputs};
use crate::hasher::{Blake3Hasher, NodeHasher};
use crate::model::{Hash, Key, Value};
use crate::smt::{Proof, SparseMerkleTree};
use crate::store::NodeStore;
use crate::{Error, Result};
use tracing::{debug, info};

/// The first two terms of the sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seeds {
    /// `F(0)`
    pub f0: Value,
    /// `F(1)`
    pub f1: Value,
}

impl Seeds {
    pub fn new(f0: Value, f1: Value) -> Self {
        Seeds { f0, f1 }
    }
}

impl Default for Seeds {
    fn default() -> Self {
        Seeds {
            f0: Value::ZERO,
            f1: Value::from(1u64),
        }
    }
}

/// The outcome of appending one term
#[derive(Clone, Debug)]
pub struct Step {
    /// Everything the circuit needs to check this append
    pub inputs: CircuitInputs,
    /// Root after the append
    pub new_root: Hash,
    /// Non-existence proof for `n` against the pre-append root
    pub insertion: Proof,
}

impl Step {
    pub fn n(&self) -> Key {
        self.inputs.n
    }

    pub fn old_root(&self) -> Hash {
        self.inputs.state_root
    }
}

/// An append-only Fibonacci sequence committed to a sparse Merkle tree
pub struct Accumulator<S, H = Blake3Hasher> {
    tree: SparseMerkleTree<S, H>,
    seeds: Seeds,
    /// Next key to insert
    next: Key,
    f_min_one: Value,
    f_min_two: Value,
}

impl<S: NodeStore, H: NodeHasher> Accumulator<S, H> {
    /// Start a sequence in an empty tree by inserting both seeds
    pub fn genesis(mut tree: SparseMerkleTree<S, H>, seeds: Seeds) -> Result<Self> {
        if !tree.root().is_zero() {
            return Err(Error::Config(format!(
                "genesis needs an empty tree, found root {}",
                tree.root().short()
            )));
        }
        tree.insert(0, seeds.f0)?;
        tree.insert(1, seeds.f1)?;
        info!(root = %tree.root().short(), "seeded sequence");

        Ok(Accumulator {
            tree,
            seeds,
            next: 2,
            f_min_one: seeds.f1,
            f_min_two: seeds.f0,
        })
    }

    /// Continue a sequence already committed to `tree`.
    ///
    /// Walks the stored terms from key 0 upward, checking each one against
    /// the seeds and the recurrence, and stops at the first absent key. An
    /// empty tree is seeded instead.
    ///
    /// Only the contiguous run from key 0 is checked. A key stored past a
    /// gap is not looked for; appending into it later fails with
    /// [`Error::DuplicateKey`] (or [`Error::Capacity`] for an aliasing key)
    /// and leaves the tree unchanged.
    pub fn resume(tree: SparseMerkleTree<S, H>, seeds: Seeds) -> Result<Self> {
        if tree.root().is_zero() {
            return Self::genesis(tree, seeds);
        }

        for (key, seed) in [(0, seeds.f0), (1, seeds.f1)] {
            match tree.get(key)? {
                Some(value) if value == seed => {}
                Some(value) => {
                    return Err(Error::InvalidProof(format!(
                        "key {} holds {}, but the seed is {}",
                        key, value, seed
                    )))
                }
                None => {
                    return Err(Error::InvalidProof(format!(
                        "tree under {} has no seed at key {}",
                        tree.root().short(),
                        key
                    )))
                }
            }
        }

        let mut acc = Accumulator {
            tree,
            seeds,
            next: 2,
            f_min_one: seeds.f1,
            f_min_two: seeds.f0,
        };
        while let Some(stored) = acc.tree.get(acc.next)? {
            let expected = acc.next_value()?;
            if stored != expected {
                return Err(Error::InvalidProof(format!(
                    "key {} holds {}, expected {}",
                    acc.next, stored, expected
                )));
            }
            acc.advance(stored);
        }

        info!(next = acc.next, root = %acc.tree.root().short(), "resumed sequence");
        Ok(acc)
    }

    /// Next key to be appended
    pub fn next_index(&self) -> Key {
        self.next
    }

    /// Value the next append will insert
    pub fn next_value(&self) -> Result<Value> {
        self.f_min_one
            .checked_add(self.f_min_two)
            .ok_or(Error::ValueOverflow(self.next))
    }

    /// The last two terms, `(F(next-1), F(next-2))`
    pub fn last_terms(&self) -> (Value, Value) {
        (self.f_min_one, self.f_min_two)
    }

    pub fn seeds(&self) -> Seeds {
        self.seeds
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    pub fn tree(&self) -> &SparseMerkleTree<S, H> {
        &self.tree
    }

    pub fn into_tree(self) -> SparseMerkleTree<S, H> {
        self.tree
    }

    /// Append every missing term below `n`, without proofs
    pub fn catch_up(&mut self, n: Key) -> Result<()> {
        while self.next < n {
            let value = self.next_value()?;
            self.tree.insert(self.next, value)?;
            debug!(n = self.next, value = %value, "appended term");
            self.advance(value);
        }
        Ok(())
    }

    /// Append the next term and prove the append
    pub fn step(&mut self, sender: Address) -> Result<Step> {
        let n = self.next;
        let value = self.next_value()?;

        let state_root = self.tree.root();
        let n_min_one = self.tree.generate_proof(n - 1)?;
        let n_min_two = self.tree.generate_proof(n - 2)?;
        if !(n_min_one.existence && n_min_two.existence) {
            return Err(Error::Corruption(format!(
                "terms before {} are missing under {}",
                n,
                state_root.short()
            )));
        }

        // Encode against the pre-append root so a rejected step leaves the
        // tree untouched
        let absent = self.tree.generate_proof(n)?;
        let inputs = CircuitInputs::new(
            self.tree.levels(),
            sender,
            state_root,
            &absent,
            value,
            &n_min_one,
            &n_min_two,
        )?;

        let insertion = self.tree.insert_and_prove(n, value)?;
        debug_assert_eq!(insertion, absent);
        self.advance(value);
        let new_root = self.tree.root();
        info!(
            n,
            value = %value,
            old_root = %state_root.short(),
            new_root = %new_root.short(),
            "appended term"
        );

        Ok(Step {
            inputs,
            new_root,
            insertion,
        })
    }

    fn advance(&mut self, value: Value) {
        self.f_min_two = self.f_min_one;
        self.f_min_one = value;
        self.next += 1;
    }
}
