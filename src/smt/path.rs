//! Leaf paths
//!
//! A key's path is its low-order bits read from the least significant
//! upward; bit `i` selects the child at depth `i` (0 = left, 1 = right).

use crate::model::Key;

/// Direction taken at `depth` when looking up `key`.
///
/// Depths at or beyond the key's width read as zero bits, so trees with more
/// than 64 levels place every key along the left spine below depth 64.
pub fn bit(key: Key, depth: usize) -> bool {
    depth < Key::BITS as usize && (key >> depth) & 1 == 1
}

/// The first `levels` path bits of `key`.
pub fn path_bits(key: Key, levels: usize) -> Vec<bool> {
    (0..levels).map(|depth| bit(key, depth)).collect()
}

/// Depth at which the paths of `a` and `b` first diverge, if they diverge
/// within `levels` bits.
pub fn divergence(a: Key, b: Key, levels: usize) -> Option<usize> {
    let diff = a ^ b;
    if diff == 0 {
        return None;
    }
    let depth = diff.trailing_zeros() as usize;
    (depth < levels).then_some(depth)
}
