//! Circuit boundary
//!
//! Everything the proving circuit and the verifying contract see: the input
//! layout built from tree proofs, the sender address, and the submission
//! payload.

mod address;
pub(crate) mod decimal;
mod inputs;

pub use address::Address;
pub use inputs::{CircuitInputs, Submission};

use crate::model::Hash;
use crate::{Error, Result};

/// Pad a sibling list with zero digests to exactly `levels` entries.
///
/// Circuits take fixed-width arrays; a walk that ended early leaves the
/// deeper slots zero.
pub fn pad_siblings(siblings: &[Hash], levels: usize) -> Result<Vec<Hash>> {
    if siblings.len() > levels {
        return Err(Error::EncodingMismatch(format!(
            "{} siblings do not fit a {}-level circuit",
            siblings.len(),
            levels
        )));
    }
    let mut padded = siblings.to_vec();
    padded.resize(levels, Hash::ZERO);
    Ok(padded)
}

/// Strip the zero padding added by [`pad_siblings`].
///
/// The deepest sibling of a terminal node is never empty, so trailing zeros
/// are always padding.
pub fn unpad_siblings(siblings: &[Hash]) -> Vec<Hash> {
    let depth = siblings
        .iter()
        .rposition(|sibling| !sibling.is_zero())
        .map_or(0, |last| last + 1);
    siblings[..depth].to_vec()
}
