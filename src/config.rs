//! Configuration
//!
//! Read from ~/.config/zkonacci/config.json when present. Every field has a
//! default, so a partial file only overrides what it names. A file named
//! explicitly must exist.

use crate::circuit::Address;
use crate::model::Value;
use crate::prover::{MockProver, Prover, SnarkjsProver};
use crate::sequence::Seeds;
use crate::smt::MAX_LEVELS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which proving backend to run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProverKind {
    #[default]
    Mock,
    Snarkjs,
}

impl FromStr for ProverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(ProverKind::Mock),
            "snarkjs" => Ok(ProverKind::Snarkjs),
            _ => Err(format!("unknown prover: {} (expected mock or snarkjs)", s)),
        }
    }
}

impl fmt::Display for ProverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProverKind::Mock => write!(f, "mock"),
            ProverKind::Snarkjs => write!(f, "snarkjs"),
        }
    }
}

/// Accumulator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tree depth; the circuit is compiled for exactly this many levels
    pub levels: usize,
    /// `[F(0), F(1)]`
    pub seeds: [u64; 2],
    /// Node store file
    pub store: PathBuf,
    /// Directory holding the compiled circuit and proving key
    pub circuit_dir: PathBuf,
    /// Artifact base name inside `circuit_dir`
    pub circuit_name: String,
    pub prover: ProverKind,
    /// Address bound into every proof
    pub sender: Option<Address>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            levels: 6,
            seeds: [0, 1],
            store: PathBuf::from("zkonacci.smt"),
            circuit_dir: PathBuf::from("circuits"),
            circuit_name: "zkOnacci".to_string(),
            prover: ProverKind::Mock,
            sender: None,
        }
    }
}

impl Config {
    /// Default config file location (~/.config/zkonacci/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("zkonacci").join("config.json"))
    }

    /// Load from `path`, falling back to defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a path the user named, which must exist
    pub fn load_explicit(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Self::load(path)
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.levels == 0 || self.levels > MAX_LEVELS {
            return Err(Error::Config(format!(
                "levels must be between 1 and {}, got {}",
                MAX_LEVELS, self.levels
            )));
        }
        if self.circuit_name.is_empty() {
            return Err(Error::Config("circuit_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn seeds(&self) -> Seeds {
        Seeds::new(Value::from(self.seeds[0]), Value::from(self.seeds[1]))
    }

    /// Sender address, or the zero address when none is configured
    pub fn sender(&self) -> Address {
        self.sender.unwrap_or(Address::ZERO)
    }

    /// Build the configured prover
    pub fn prover(&self) -> Box<dyn Prover> {
        match self.prover {
            ProverKind::Mock => Box::new(MockProver::new()),
            ProverKind::Snarkjs => Box::new(SnarkjsProver::new(
                self.circuit_dir.clone(),
                self.circuit_name.clone(),
            )),
        }
    }
}
