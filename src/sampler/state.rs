//! Chain state tracking
//!
//! Maintains:
//! - The current key of the chain and its score
//! - Accepted and attempted move counters
//! - The best decryption seen, kept apart from the current state
//! - Phase (running or done, with the reason)

use crate::cipher::CipherKey;
use crate::lm::alphabet::{self, Symbol};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why a chain stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Accepted-move budget reached
    Converged,
    /// Attempt cap hit first; the best result is partial
    AttemptCapReached,
    /// Stopped through a `CancelToken`
    Cancelled,
}

/// Sampler state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainPhase {
    Running,
    Done(Termination),
}

/// A scored decryption
#[derive(Clone, Debug)]
pub struct Candidate {
    pub text: String,
    pub score: f64,
    pub key: CipherKey,
}

/// Snapshot handed to progress observers and stored in the trace
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Progress {
    pub accepted: u64,
    pub attempts: u64,
    pub current_score: f64,
    pub best_score: f64,
}

impl Progress {
    pub fn acceptance_rate(&self) -> f64 {
        acceptance_rate(self.accepted, self.attempts)
    }
}

/// Share of proposals accepted, 0 before the first proposal
pub fn acceptance_rate(accepted: u64, attempts: u64) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        accepted as f64 / attempts as f64
    }
}

/// Probability of moving from a chain scored `current` to a proposal scored
/// `proposal`: `min(1, exp(proposal - current))`
pub fn acceptance_probability(proposal: f64, current: f64) -> f64 {
    if proposal >= current {
        1.0
    } else {
        (proposal - current).exp()
    }
}

/// Accept when a uniform draw `u` in `[0, 1)` falls below `probability`
pub fn accepts(u: f64, probability: f64) -> bool {
    u < probability
}

/// Shared flag for aborting a running chain from outside
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Complete chain state
#[derive(Clone, Debug)]
pub struct ChainState {
    /// Key the chain currently sits on
    pub current_key: CipherKey,
    /// Log-likelihood of the decryption under `current_key`
    pub current_score: f64,
    /// Proposals accepted so far
    pub accepted: u64,
    /// Proposals made so far
    pub attempts: u64,
    /// Best proposal seen, whether or not it was accepted
    best: Option<Candidate>,
    phase: ChainPhase,
}

impl ChainState {
    /// Start a chain on `key`, whose decryption scores `score`
    pub fn new(key: CipherKey, score: f64) -> Self {
        ChainState {
            current_key: key,
            current_score: score,
            accepted: 0,
            attempts: 0,
            best: None,
            phase: ChainPhase::Running,
        }
    }

    pub fn phase(&self) -> ChainPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == ChainPhase::Running
    }

    /// Best score so far, `-inf` before any proposal
    pub fn best_score(&self) -> f64 {
        self.best
            .as_ref()
            .map(|b| b.score)
            .unwrap_or(f64::NEG_INFINITY)
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    /// Count a proposal and keep it if it beats the best score.
    ///
    /// `decrypted` is only rendered to text when it becomes the new best.
    pub fn record_proposal(&mut self, key: &CipherKey, score: f64, decrypted: &[Symbol]) -> bool {
        self.attempts += 1;
        if score > self.best_score() {
            self.best = Some(Candidate {
                text: alphabet::decode(decrypted),
                score,
                key: key.clone(),
            });
            true
        } else {
            false
        }
    }

    /// Move the chain onto an accepted proposal
    pub fn accept(&mut self, key: CipherKey, score: f64) {
        self.current_key = key;
        self.current_score = score;
        self.accepted += 1;
    }

    /// True on attempts that are a multiple of `interval` (never for 0)
    pub fn should_report(&self, interval: u64) -> bool {
        interval > 0 && self.attempts > 0 && self.attempts % interval == 0
    }

    pub fn progress(&self) -> Progress {
        Progress {
            accepted: self.accepted,
            attempts: self.attempts,
            current_score: self.current_score,
            best_score: self.best_score(),
        }
    }

    /// Move to `Done` if a budget is exhausted or the run was cancelled
    pub fn check_termination(
        &mut self,
        max_accepted: u64,
        max_attempts: Option<u64>,
        cancel: Option<&CancelToken>,
    ) -> ChainPhase {
        if self.is_running() {
            if self.accepted >= max_accepted {
                self.phase = ChainPhase::Done(Termination::Converged);
            } else if max_attempts.is_some_and(|cap| self.attempts >= cap) {
                self.phase = ChainPhase::Done(Termination::AttemptCapReached);
            } else if cancel.is_some_and(|token| token.is_cancelled()) {
                self.phase = ChainPhase::Done(Termination::Cancelled);
            }
        }
        self.phase
    }

    /// Hand over the best candidate, falling back to the current chain
    /// position when no proposal was ever scored
    pub fn into_best(self, ciphertext: &[Symbol]) -> Candidate {
        match self.best {
            Some(best) => best,
            None => {
                let mut decrypted = Vec::with_capacity(ciphertext.len());
                self.current_key.apply_symbols(ciphertext, &mut decrypted);
                Candidate {
                    text: alphabet::decode(&decrypted),
                    score: self.current_score,
                    key: self.current_key,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_better_or_equal_always_accepted() {
        assert_eq!(acceptance_probability(-10.0, -12.0), 1.0);
        assert_eq!(acceptance_probability(-10.0, -10.0), 1.0);
        // even the largest possible uniform draw is accepted
        let u_max = 1.0 - f64::EPSILON;
        assert!(accepts(u_max, acceptance_probability(-3.0, -3.0)));
        assert!(accepts(u_max, acceptance_probability(5.0, -300.0)));
    }

    #[test]
    fn test_worse_accepted_with_exp_ratio() {
        let p = acceptance_probability(-12.0, -10.0);
        assert!((p - (-2.0f64).exp()).abs() < 1e-12);
        assert!(accepts(p / 2.0, p));
        assert!(!accepts(p, p));
    }

    #[test]
    fn test_best_tracked_independently_of_chain() {
        let key = CipherKey::identity();
        let mut state = ChainState::new(key.clone(), -50.0);
        let text = alphabet::encode("abc");

        assert!(state.record_proposal(&key, -20.0, &text));
        state.accept(key.clone(), -20.0);
        assert!(!state.record_proposal(&key, -40.0, &text));
        state.accept(key.clone(), -40.0);

        assert_eq!(state.current_score, -40.0);
        assert_eq!(state.best_score(), -20.0);
        assert_eq!(state.best().map(|b| b.text.as_str()), Some("abc"));
        assert_eq!(state.attempts, 2);
        assert_eq!(state.accepted, 2);
        assert_eq!(state.progress().acceptance_rate(), 1.0);
    }

    #[test]
    fn test_acceptance_rate_from_progress() {
        let mut state = ChainState::new(CipherKey::identity(), 0.0);
        assert_eq!(state.progress().acceptance_rate(), 0.0);

        state.attempts = 8;
        state.accepted = 2;
        let progress = state.progress();
        assert_eq!(progress.acceptance_rate(), 0.25);
        assert_eq!(progress.best_score, f64::NEG_INFINITY);
    }

    #[test]
    fn test_termination_reasons() {
        let mut state = ChainState::new(CipherKey::identity(), 0.0);
        assert_eq!(state.check_termination(1, Some(3), None), ChainPhase::Running);

        state.attempts = 3;
        assert_eq!(
            state.check_termination(1, Some(3), None),
            ChainPhase::Done(Termination::AttemptCapReached)
        );

        let mut state = ChainState::new(CipherKey::identity(), 0.0);
        let token = CancelToken::new();
        token.clone().cancel();
        assert_eq!(
            state.check_termination(1, None, Some(&token)),
            ChainPhase::Done(Termination::Cancelled)
        );

        let mut state = ChainState::new(CipherKey::identity(), 0.0);
        state.accept(CipherKey::identity(), 0.0);
        assert_eq!(
            state.check_termination(1, Some(1), Some(&token)),
            ChainPhase::Done(Termination::Converged)
        );
    }

    #[test]
    fn test_report_cadence() {
        let mut state = ChainState::new(CipherKey::identity(), 0.0);
        assert!(!state.should_report(100));
        state.attempts = 100;
        assert!(state.should_report(100));
        assert!(!state.should_report(0));
        state.attempts = 150;
        assert!(!state.should_report(100));
    }

    #[test]
    fn test_into_best_falls_back_to_current() {
        let state = ChainState::new(CipherKey::identity(), -1.5);
        let best = state.into_best(&alphabet::encode("hi there"));
        assert_eq!(best.text, "hi there");
        assert_eq!(best.score, -1.5);
    }
}
