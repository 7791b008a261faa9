//! Pluggable proving backends

mod mock;
mod snarkjs;
mod traits;

pub use mock::MockProver;
pub use snarkjs::SnarkjsProver;
pub use traits::{ProofBytes, Prover};
