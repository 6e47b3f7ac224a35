//! Substitution-cipher breaking with a bigram model and Metropolis-Hastings
//!
//! ```no_run
//! use decipher_core::{decipher, BigramModel, SamplerConfig};
//!
//! let model = BigramModel::build(&std::fs::read_to_string("reference.txt")?)?;
//! let outcome = decipher("ymj vznhp gwtbs ktc", &model, SamplerConfig::default())?;
//! println!("{}", outcome.text());
//! # Ok::<(), decipher_core::DecipherError>(())
//! ```

pub mod cipher;
pub mod errors;
pub mod lm;
pub mod sampler;

pub use cipher::CipherKey;
pub use errors::{DecipherError, Result};
pub use lm::{log_likelihood, normalize, BigramModel};
pub use sampler::{decipher, MetropolisSampler, SamplerConfig, SamplerOutcome, Termination};
