//! Prover backed by the snarkjs command line tool

use super::{ProofBytes, Prover};
use crate::circuit::CircuitInputs;
use crate::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs `snarkjs` against a compiled circuit directory
///
/// The directory must hold `<name>.wasm` and `<name>_final.zkey`. Each call
/// writes `input.json`, `witness.wtns`, `proof.json` and `public.json` next
/// to them, so one directory serves one prover at a time.
#[derive(Debug, Clone)]
pub struct SnarkjsProver {
    circuit_dir: PathBuf,
    circuit_name: String,
    binary: PathBuf,
}

impl SnarkjsProver {
    pub fn new(circuit_dir: impl Into<PathBuf>, circuit_name: impl Into<String>) -> Self {
        SnarkjsProver {
            circuit_dir: circuit_dir.into(),
            circuit_name: circuit_name.into(),
            binary: PathBuf::from("snarkjs"),
        }
    }

    /// Use a specific `snarkjs` executable instead of the one on `PATH`
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn circuit_dir(&self) -> &Path {
        &self.circuit_dir
    }

    fn artifact(&self, suffix: &str) -> PathBuf {
        self.circuit_dir
            .join(format!("{}{}", self.circuit_name, suffix))
    }

    fn run<I, A>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.binary);
        command.args(args);
        debug!(command = ?command, "running prover");

        let output = command.output().map_err(|e| {
            Error::Prove(format!("cannot run {}: {}", self.binary.display(), e))
        })?;
        if !output.status.success() {
            let mut message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if message.is_empty() {
                message = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(Error::Prove(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                message
            )));
        }
        Ok(())
    }
}

impl Prover for SnarkjsProver {
    fn prove(&self, inputs: &CircuitInputs) -> Result<ProofBytes> {
        let input = self.circuit_dir.join("input.json");
        let witness = self.circuit_dir.join("witness.wtns");
        let proof = self.circuit_dir.join("proof.json");
        let public = self.circuit_dir.join("public.json");

        fs::write(&input, serde_json::to_vec(inputs)?)?;

        self.run([
            OsStr::new("wtns"),
            OsStr::new("calculate"),
            self.artifact(".wasm").as_os_str(),
            input.as_os_str(),
            witness.as_os_str(),
        ])?;
        self.run([
            OsStr::new("groth16"),
            OsStr::new("prove"),
            self.artifact("_final.zkey").as_os_str(),
            witness.as_os_str(),
            proof.as_os_str(),
            public.as_os_str(),
        ])?;

        ProofBytes::from_snarkjs(&fs::read_to_string(&proof)?)
    }

    fn name(&self) -> &str {
        "snarkjs"
    }
}
