//! Language model: alphabet, bigram statistics and scoring
//!
//! # Components
//! - `alphabet.rs`: 27-symbol alphabet and document normalization
//! - `model.rs`: Two-phase bigram builder and the immutable model
//! - `scoring.rs`: Log-likelihood of a document under the model

pub mod alphabet;
pub mod model;
pub mod scoring;

pub use alphabet::{normalize, Symbol, LETTERS, SYMBOLS};
pub use model::{BigramCounts, BigramModel};
pub use scoring::{log_likelihood, log_likelihood_symbols};
