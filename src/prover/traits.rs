//! Prover trait definition

use crate::circuit::{decimal, CircuitInputs};
use crate::model::Value;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Trait for turning circuit inputs into a succinct proof
///
/// Implementations can use:
/// - An external proving toolchain (e.g., snarkjs)
/// - Mock implementations for testing and dry runs
pub trait Prover: Send + Sync {
    /// Prove one step
    fn prove(&self, inputs: &CircuitInputs) -> Result<ProofBytes>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// A Groth16 proof in the argument order a verifying contract takes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProofBytes {
    #[serde(rename = "proofA", serialize_with = "decimal::pair")]
    pub a: [Value; 2],
    #[serde(rename = "proofB", serialize_with = "decimal::pairs")]
    pub b: [[Value; 2]; 2],
    #[serde(rename = "proofC", serialize_with = "decimal::pair")]
    pub c: [Value; 2],
}

/// `proof.json` as written by `snarkjs groth16 prove`
#[derive(Deserialize)]
struct SnarkjsProof {
    pi_a: Vec<String>,
    pi_b: Vec<Vec<String>>,
    pi_c: Vec<String>,
}

impl ProofBytes {
    /// Parse a snarkjs proof, reordering it for contract verification.
    ///
    /// The projective coordinates are dropped and each `pi_b` pair is
    /// swapped, matching the order of the verifier's pairing check.
    pub fn from_snarkjs(json: &str) -> Result<Self> {
        let raw: SnarkjsProof = serde_json::from_str(json)?;
        let b0 = raw.pi_b.first().map(Vec::as_slice).unwrap_or_default();
        let b1 = raw.pi_b.get(1).map(Vec::as_slice).unwrap_or_default();
        Ok(ProofBytes {
            a: [field(&raw.pi_a, 0, "pi_a")?, field(&raw.pi_a, 1, "pi_a")?],
            b: [
                [field(b0, 1, "pi_b[0]")?, field(b0, 0, "pi_b[0]")?],
                [field(b1, 1, "pi_b[1]")?, field(b1, 0, "pi_b[1]")?],
            ],
            c: [field(&raw.pi_c, 0, "pi_c")?, field(&raw.pi_c, 1, "pi_c")?],
        })
    }
}

fn field(items: &[String], index: usize, name: &str) -> Result<Value> {
    let item = items
        .get(index)
        .ok_or_else(|| Error::Prove(format!("{} has no element {}", name, index)))?;
    Value::from_str_radix(item, 10)
        .map_err(|e| Error::Prove(format!("{}[{}] = {:?}: {}", name, index, item, e)))
}
