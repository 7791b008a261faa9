//! Mock prover for testing

use super::{ProofBytes, Prover};
use crate::circuit::CircuitInputs;
use crate::model::Value;
use crate::Result;

/// A prover that derives a deterministic pseudo-proof from the inputs
///
/// Useful for testing and dry runs without a circuit build. Same inputs give
/// the same proof; the proof verifies nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProver;

impl MockProver {
    pub fn new() -> Self {
        MockProver
    }
}

impl Prover for MockProver {
    fn prove(&self, inputs: &CircuitInputs) -> Result<ProofBytes> {
        let encoded = serde_json::to_vec(inputs)?;

        // Eight 32-byte words from the BLAKE3 output stream
        let mut stream = [0u8; 8 * 32];
        blake3::Hasher::new()
            .update(&encoded)
            .finalize_xof()
            .fill(&mut stream);

        let mut words = stream.chunks_exact(32).map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            Value::from_le_bytes(word)
        });
        let mut next = || words.next().unwrap_or_default();

        Ok(ProofBytes {
            a: [next(), next()],
            b: [[next(), next()], [next(), next()]],
            c: [next(), next()],
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
