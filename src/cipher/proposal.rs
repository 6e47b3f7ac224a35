//! Proposal generator: neighbouring keys one transposition away
//!
//! The move set is symmetric: a swap of positions `(i, j)` is undone by the
//! same swap, and every unordered pair is equally likely, so the acceptance
//! ratio needs no Hastings correction.

use super::key::CipherKey;
use crate::errors::{DecipherError, Result};
use crate::lm::alphabet::LETTERS;
use rand::Rng;

/// A transposition of two distinct plaintext positions, both below `LETTERS`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swap {
    first: usize,
    second: usize,
}

impl Swap {
    /// Swap of positions `first` and `second`, which must differ and lie in `0..26`
    pub fn new(first: usize, second: usize) -> Result<Self> {
        if first >= LETTERS || second >= LETTERS {
            return Err(DecipherError::InvalidKey(format!(
                "swap positions ({}, {}) outside 0..{}",
                first, second, LETTERS
            )));
        }
        if first == second {
            return Err(DecipherError::InvalidKey(format!(
                "swap needs two distinct positions, got {} twice",
                first
            )));
        }
        Ok(Swap { first, second })
    }

    /// Draw two distinct positions uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = rng.gen_range(0..LETTERS);
        // pick among the remaining 25 and skip over `first`
        let mut second = rng.gen_range(0..LETTERS - 1);
        if second >= first {
            second += 1;
        }
        Swap { first, second }
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn second(&self) -> usize {
        self.second
    }

    pub fn apply(self, key: &CipherKey) -> CipherKey {
        key.swapped(self.first, self.second)
    }
}

/// Candidate key differing from `current` by exactly one random transposition
pub fn propose<R: Rng + ?Sized>(current: &CipherKey, rng: &mut R) -> CipherKey {
    Swap::random(rng).apply(current)
}
