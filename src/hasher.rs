//! Node hashing
//!
//! Leaves hash as `H(key, value, 1)` and middle nodes as `H(left, right)`.
//! The trailing flag on leaves domain-separates the two node kinds, so a leaf
//! preimage can never be confused with a middle one. The empty node has no
//! preimage; it is always [`Hash::ZERO`].
//!
//! The circuit consuming proofs must agree bit-for-bit on this encoding, so
//! the hash is pluggable through [`NodeHasher`]. Every digest must be a
//! canonical element of [`FIELD_MODULUS`]'s field, or the circuit cannot
//! take it as input.

use crate::model::{Hash, Key, Value, FIELD_MODULUS};
use ruint::aliases::U256;

/// A hash function for tree nodes.
///
/// Implementations must never produce [`Hash::ZERO`] for a leaf or middle
/// node, as that value is reserved for the empty node, and every digest read
/// with [`Hash::to_field`] must be below [`FIELD_MODULUS`].
pub trait NodeHasher: Send + Sync + 'static {
    /// Hash a leaf holding `(key, value)`.
    fn hash_leaf(key: Key, value: &Value) -> Hash;

    /// Hash a middle node from its children's hashes.
    fn hash_middle(left: &Hash, right: &Hash) -> Hash;
}

/// Encode an integer as a 32-byte little-endian word.
pub fn word(value: &U256) -> [u8; 32] {
    value.to_le_bytes()
}

/// Leaf flag appended to every leaf preimage.
const LEAF_FLAG: u64 = 1;

/// A [`NodeHasher`] backed by BLAKE3.
///
/// Every input is encoded as a 32-byte little-endian word:
/// - leaf: `blake3(key ‖ value ‖ 1) mod p`
/// - middle: `blake3(left ‖ right) mod p`
///
/// where the output is read as a little-endian integer and `p` is
/// [`FIELD_MODULUS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl NodeHasher for Blake3Hasher {
    fn hash_leaf(key: Key, value: &Value) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&word(&U256::from(key)));
        hasher.update(&word(value));
        hasher.update(&word(&U256::from(LEAF_FLAG)));
        to_field_digest(&hasher)
    }

    fn hash_middle(left: &Hash, right: &Hash) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        to_field_digest(&hasher)
    }
}

fn to_field_digest(hasher: &blake3::Hasher) -> Hash {
    let raw = U256::from_le_bytes(*hasher.finalize().as_bytes());
    Hash::from_field(raw % FIELD_MODULUS)
}
