//! Circuit inputs for one sequence step

use super::{decimal, pad_siblings, unpad_siblings, Address};
use crate::hasher::NodeHasher;
use crate::model::{in_field, Hash, Key, Value};
use crate::prover::ProofBytes;
use crate::smt::Proof;
use crate::{Error, Result};
use serde::Serialize;

/// Inputs for the circuit that checks one append `F(n) = F(n-1) + F(n-2)`.
///
/// Serializes to the exact JSON layout the circuit reads. Sibling lists are
/// zero-padded to the tree's level count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CircuitInputs {
    #[serde(rename = "senderAddress")]
    pub sender: Address,
    /// Root before the insertion of `n`
    #[serde(rename = "stateRoot", serialize_with = "decimal::hash")]
    pub state_root: Hash,
    pub n: Key,
    #[serde(rename = "Fn", serialize_with = "decimal::value")]
    pub f_n: Value,
    #[serde(rename = "siblingsFn", serialize_with = "decimal::hashes")]
    pub siblings_fn: Vec<Hash>,
    #[serde(rename = "oldKeyFn", serialize_with = "decimal::key")]
    pub old_key_fn: Key,
    #[serde(rename = "oldValueFn", serialize_with = "decimal::value")]
    pub old_value_fn: Value,
    #[serde(rename = "isOld0Fn")]
    pub is_old0_fn: bool,
    #[serde(rename = "FnMinOne", serialize_with = "decimal::value")]
    pub f_n_min_one: Value,
    #[serde(rename = "siblingsFnMinOne", serialize_with = "decimal::hashes")]
    pub siblings_fn_min_one: Vec<Hash>,
    #[serde(rename = "FnMinTwo", serialize_with = "decimal::value")]
    pub f_n_min_two: Value,
    #[serde(rename = "siblingsFnMinTwo", serialize_with = "decimal::hashes")]
    pub siblings_fn_min_two: Vec<Hash>,
}

impl CircuitInputs {
    /// Pack the three proofs of one step.
    ///
    /// `insertion` is the non-existence proof for `n` against `state_root`,
    /// `value` the term being inserted there, and `n_min_one`/`n_min_two`
    /// existence proofs for the two previous terms against the same root.
    ///
    /// Every digest and value must be a canonical field element, otherwise
    /// the result is [`Error::EncodingMismatch`].
    pub fn new(
        levels: usize,
        sender: Address,
        state_root: Hash,
        insertion: &Proof,
        value: Value,
        n_min_one: &Proof,
        n_min_two: &Proof,
    ) -> Result<Self> {
        let n = insertion.key;
        if n < 2 {
            return Err(Error::KeyOutOfRange(format!(
                "key {} has no two predecessors",
                n
            )));
        }
        if insertion.existence {
            return Err(Error::DuplicateKey(n));
        }
        for (proof, expected) in [(n_min_one, n - 1), (n_min_two, n - 2)] {
            if proof.key != expected {
                return Err(Error::EncodingMismatch(format!(
                    "expected a proof for key {}, got key {}",
                    expected, proof.key
                )));
            }
            if !proof.existence {
                return Err(Error::KeyOutOfRange(format!(
                    "predecessor {} of key {} is not in the tree",
                    expected, n
                )));
            }
        }

        let inputs = CircuitInputs {
            sender,
            state_root,
            n,
            f_n: value,
            siblings_fn: pad_siblings(&insertion.siblings, levels)?,
            old_key_fn: insertion.old_key,
            old_value_fn: insertion.old_value,
            is_old0_fn: insertion.is_old0,
            f_n_min_one: n_min_one.old_value,
            siblings_fn_min_one: pad_siblings(&n_min_one.siblings, levels)?,
            f_n_min_two: n_min_two.old_value,
            siblings_fn_min_two: pad_siblings(&n_min_two.siblings, levels)?,
        };
        inputs.check_field()?;
        Ok(inputs)
    }

    fn check_field(&self) -> Result<()> {
        let values = [
            ("Fn", self.f_n),
            ("oldValueFn", self.old_value_fn),
            ("FnMinOne", self.f_n_min_one),
            ("FnMinTwo", self.f_n_min_two),
        ];
        if let Some((name, value)) = values.iter().find(|(_, value)| !in_field(value)) {
            return Err(Error::EncodingMismatch(format!(
                "{} = {} is not a field element",
                name, value
            )));
        }

        let digests = std::iter::once(&self.state_root)
            .chain(&self.siblings_fn)
            .chain(&self.siblings_fn_min_one)
            .chain(&self.siblings_fn_min_two);
        for digest in digests {
            if !in_field(&digest.to_field()) {
                return Err(Error::EncodingMismatch(format!(
                    "digest {} is not a field element",
                    digest.short()
                )));
            }
        }
        Ok(())
    }

    /// Check every constraint the circuit enforces, outside the circuit.
    ///
    /// Both predecessors must be present under `stateRoot`, `Fn` must be
    /// their sum, and inserting `(n, Fn)` must move `stateRoot` to
    /// `new_root`.
    pub fn verify<H: NodeHasher>(&self, new_root: &Hash, levels: usize) -> Result<()> {
        let n = self.n;
        if n < 2 {
            return Err(Error::KeyOutOfRange(format!(
                "key {} has no two predecessors",
                n
            )));
        }
        self.check_field()?;
        if !in_field(&new_root.to_field()) {
            return Err(Error::EncodingMismatch(format!(
                "new root {} is not a field element",
                new_root.short()
            )));
        }
        let widths = [
            self.siblings_fn.len(),
            self.siblings_fn_min_one.len(),
            self.siblings_fn_min_two.len(),
        ];
        if widths.iter().any(|width| *width != levels) {
            return Err(Error::EncodingMismatch(format!(
                "sibling lists {:?} do not match {} levels",
                widths, levels
            )));
        }

        let min_one = Proof::found(
            n - 1,
            self.f_n_min_one,
            unpad_siblings(&self.siblings_fn_min_one),
        );
        min_one.verify::<H>(&self.state_root)?;
        let min_two = Proof::found(
            n - 2,
            self.f_n_min_two,
            unpad_siblings(&self.siblings_fn_min_two),
        );
        min_two.verify::<H>(&self.state_root)?;

        if self.f_n_min_one.checked_add(self.f_n_min_two) != Some(self.f_n) {
            return Err(Error::InvalidProof(format!(
                "{} is not {} + {}",
                self.f_n, self.f_n_min_one, self.f_n_min_two
            )));
        }

        let siblings = unpad_siblings(&self.siblings_fn);
        let insertion = if self.is_old0_fn {
            Proof::empty(n, siblings)
        } else {
            Proof::boundary(n, self.old_key_fn, self.old_value_fn, siblings)
        };
        insertion.verify_transition::<H>(&self.state_root, new_root, self.f_n, levels)
    }
}

/// The payload a verifying contract accepts for one step
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Submission {
    #[serde(flatten)]
    pub proof: ProofBytes,
    #[serde(rename = "newRoot", serialize_with = "decimal::hash")]
    pub new_root: Hash,
}

impl Submission {
    pub fn new(proof: ProofBytes, new_root: Hash) -> Self {
        Submission { proof, new_root }
    }
}
