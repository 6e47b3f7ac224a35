//! Cipher keys and the proposal moves the sampler makes between them
//!
//! # Components
//! - `key.rs`: Permutation keys, encryption and decryption
//! - `proposal.rs`: Random single-transposition neighbours

pub mod key;
pub mod proposal;

pub use key::CipherKey;
pub use proposal::{propose, Swap};
