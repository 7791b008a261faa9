//! Error types for zkonacci

use crate::model::{Hash, Key};
use thiserror::Error;

/// Result type alias for zkonacci operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in zkonacci operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Key {0} already exists in the tree")]
    DuplicateKey(Key),

    #[error("Capacity exceeded: key {key} shares all {levels} path bits with key {existing}")]
    Capacity { key: Key, existing: Key, levels: usize },

    #[error("Value overflow computing the term at index {0}")]
    ValueOverflow(Key),

    #[error("Key out of range: {0}")]
    KeyOutOfRange(String),

    #[error("Node store error: {0}")]
    NodeStore(String),

    #[error("Node not found: {0}")]
    NodeNotFound(Hash),

    #[error("Encoding mismatch: {0}")]
    EncodingMismatch(String),

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Prover error: {0}")]
    Prove(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid store file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl Error {
    /// Whether this error originates in the node store rather than in tree logic
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Error::NodeStore(_)
                | Error::NodeNotFound(_)
                | Error::Io(_)
                | Error::Serialization(_)
                | Error::Corruption(_)
        )
    }
}
