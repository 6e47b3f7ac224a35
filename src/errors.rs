//! Error taxonomy shared by the model, the sampler and the binaries
//!
//! Everything here is pure in-memory computation, so there are no transient
//! errors to retry: each variant is fatal for the operation that raised it.
//! Running out of attempts is not an error, see `sampler::Termination`.

use thiserror::Error;

/// Failures surfaced before (or instead of) sampling
#[derive(Debug, Error)]
pub enum DecipherError {
    /// Reference corpus too degenerate to build a distribution, or a loaded
    /// table that breaks the model invariants
    #[error("invalid language model: {0}")]
    InvalidModel(String),

    /// Ciphertext that cannot be scored (empty, or without any letter)
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Key text that is not a permutation of `a..z`
    #[error("invalid cipher key: {0}")]
    InvalidKey(String),

    /// Sampler configuration that can never terminate meaningfully
    #[error("invalid sampler config: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Model or config (de)serialization failure
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for DecipherError {
    fn from(err: bincode::Error) -> Self {
        DecipherError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for DecipherError {
    fn from(err: serde_json::Error) -> Self {
        DecipherError::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DecipherError>;
