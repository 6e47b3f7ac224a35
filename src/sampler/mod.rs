//! Sampler: Metropolis-Hastings chain over cipher keys
//!
//! # Components
//! - `config.rs`: Budgets, progress cadence and seeding
//! - `state.rs`: Chain state, best-candidate holder and acceptance rule
//! - `metropolis.rs`: The sampling loop and its outcome

pub mod config;
pub mod metropolis;
pub mod state;

pub use config::SamplerConfig;
pub use metropolis::{decipher, MetropolisSampler, ProgressObserver, SamplerOutcome, Silent};
pub use state::{
    acceptance_probability, CancelToken, Candidate, ChainPhase, ChainState, Progress, Termination,
};
