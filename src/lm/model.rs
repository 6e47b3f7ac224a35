//! Bigram language model over the 27-symbol alphabet
//!
//! Two phases:
//! - `BigramCounts` accumulates add-one smoothed transition counts
//! - `BigramModel` is the immutable row-normalized distribution built from them
//!
//! The model also persists to disk with bincode so a large corpus only has
//! to be scanned once.

use super::alphabet::{Symbol, SYMBOLS};
use crate::errors::{DecipherError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Tolerance for the "every row sums to 1" invariant
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Raw transition counts, every cell starting at 1 (Laplace smoothing)
#[derive(Clone, Debug)]
pub struct BigramCounts {
    counts: [[u64; SYMBOLS]; SYMBOLS],
    /// Transitions observed in text, excluding the smoothing floor
    observed: u64,
    /// Last symbol of the previous chunk, so `feed` can be called repeatedly
    last: Option<Symbol>,
}

impl BigramCounts {
    pub fn new() -> Self {
        BigramCounts {
            counts: [[1; SYMBOLS]; SYMBOLS],
            observed: 0,
            last: None,
        }
    }

    /// Count every consecutive pair of normalized symbols in `text`.
    ///
    /// Successive calls behave as if the chunks were concatenated.
    pub fn feed(&mut self, text: &str) {
        for symbol in text.chars().map(Symbol::from_char) {
            if let Some(prev) = self.last {
                self.counts[prev.index()][symbol.index()] += 1;
                self.observed += 1;
            }
            self.last = Some(symbol);
        }
    }

    /// Number of transitions taken from text (smoothing excluded)
    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn count(&self, first: Symbol, second: Symbol) -> u64 {
        self.counts[first.index()][second.index()]
    }

    /// Normalize every row into a probability distribution
    pub fn finish(self) -> Result<BigramModel> {
        if self.observed == 0 {
            return Err(DecipherError::InvalidModel(
                "reference text has no symbol transitions".into(),
            ));
        }

        let mut probs = [[0.0; SYMBOLS]; SYMBOLS];
        for (row_idx, row) in self.counts.iter().enumerate() {
            let total: u64 = row.iter().sum();
            if total == 0 {
                return Err(DecipherError::InvalidModel(format!(
                    "row '{}' has non-positive total count",
                    symbol_at(row_idx)
                )));
            }
            for (col_idx, &count) in row.iter().enumerate() {
                probs[row_idx][col_idx] = count as f64 / total as f64;
            }
        }

        debug!(observed = self.observed, "normalized bigram counts");
        BigramModel::from_probabilities(probs)
    }
}

impl Default for BigramCounts {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable bigram distribution: `P(second follows first)`
#[derive(Clone, Debug)]
pub struct BigramModel {
    probs: [[f64; SYMBOLS]; SYMBOLS],
    /// Natural logs of `probs`, cached for the scorer's hot loop
    log_probs: [[f64; SYMBOLS]; SYMBOLS],
}

/// On-disk form; only the probabilities are stored
#[derive(Serialize, Deserialize)]
struct StoredModel {
    version: u32,
    probs: [[f64; SYMBOLS]; SYMBOLS],
}

const STORED_VERSION: u32 = 1;

fn empty_table() -> [[f64; SYMBOLS]; SYMBOLS] {
    [[0.0; SYMBOLS]; SYMBOLS]
}

fn symbol_at(idx: usize) -> char {
    Symbol::all()
        .nth(idx)
        .map(|s| s.to_char())
        .unwrap_or('?')
}

impl BigramModel {
    /// Build a model from a reference corpus in one pass
    pub fn build(reference_text: &str) -> Result<Self> {
        let mut counts = BigramCounts::new();
        counts.feed(reference_text);
        let model = counts.finish()?;
        info!(
            chars = reference_text.chars().count(),
            "built bigram model from reference text"
        );
        Ok(model)
    }

    /// Wrap an already-normalized table, checking the model invariants
    pub fn from_probabilities(probs: [[f64; SYMBOLS]; SYMBOLS]) -> Result<Self> {
        for (row_idx, row) in probs.iter().enumerate() {
            if let Some(p) = row.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
                return Err(DecipherError::InvalidModel(format!(
                    "row '{}' contains non-positive probability {}",
                    symbol_at(row_idx),
                    p
                )));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(DecipherError::InvalidModel(format!(
                    "row '{}' sums to {} instead of 1",
                    symbol_at(row_idx),
                    sum
                )));
            }
        }

        let mut log_probs = empty_table();
        for (logs, row) in log_probs.iter_mut().zip(probs.iter()) {
            for (log_p, p) in logs.iter_mut().zip(row.iter()) {
                *log_p = p.ln();
            }
        }

        Ok(BigramModel { probs, log_probs })
    }

    /// `P(second follows first)` for raw characters.
    ///
    /// Characters outside `a..z` and space (including uppercase) get 0.0.
    pub fn probability(&self, first: char, second: char) -> f64 {
        match (Symbol::parse(first), Symbol::parse(second)) {
            (Some(a), Some(b)) => self.transition(a, b),
            _ => 0.0,
        }
    }

    /// `P(second follows first)` for alphabet symbols
    pub fn transition(&self, first: Symbol, second: Symbol) -> f64 {
        self.probs[first.index()][second.index()]
    }

    /// `ln P(second follows first)`, always finite
    pub fn log_transition(&self, first: Symbol, second: Symbol) -> f64 {
        self.log_probs[first.index()][second.index()]
    }

    /// Distribution over the next symbol after `first`
    pub fn row(&self, first: Symbol) -> &[f64; SYMBOLS] {
        &self.probs[first.index()]
    }

    /// Most likely successors of `first`, highest first
    pub fn top_successors(&self, first: Symbol, k: usize) -> Vec<(Symbol, f64)> {
        let mut ranked: Vec<(Symbol, f64)> = Symbol::all()
            .map(|s| (s, self.transition(first, s)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        ranked
    }

    /// Save the model table with bincode
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let stored = StoredModel {
            version: STORED_VERSION,
            probs: self.probs,
        };
        let bytes = bincode::serialize(&stored)?;
        fs::write(path.as_ref(), bytes)?;
        info!(path = %path.as_ref().display(), "saved bigram model");
        Ok(())
    }

    /// Load a model saved by `save`, re-validating its invariants
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let stored: StoredModel = bincode::deserialize(&bytes)?;
        if stored.version != STORED_VERSION {
            return Err(DecipherError::InvalidModel(format!(
                "unsupported model version {}",
                stored.version
            )));
        }
        let model = BigramModel::from_probabilities(stored.probs)?;
        info!(path = %path.as_ref().display(), "loaded bigram model");
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "It was the best of times, it was the worst of times, \
        it was the age of wisdom, it was the age of foolishness.";

    #[test]
    fn test_rows_sum_to_one_and_are_positive() {
        let model = BigramModel::build(REFERENCE).unwrap();
        for first in Symbol::all() {
            let row = model.row(first);
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < ROW_SUM_TOLERANCE);
            assert!(row.iter().all(|&p| p > 0.0));
        }
    }

    #[test]
    fn test_observed_pairs_outweigh_unseen() {
        let model = BigramModel::build(REFERENCE).unwrap();
        assert!(model.probability('t', 'h') > model.probability('t', 'q'));
        assert!(model.probability('q', 'x') > 0.0);
    }

    #[test]
    fn test_out_of_alphabet_queries_are_zero() {
        let model = BigramModel::build(REFERENCE).unwrap();
        assert_eq!(model.probability('T', 'h'), 0.0);
        assert_eq!(model.probability('t', '!'), 0.0);
        assert_eq!(model.probability('é', ' '), 0.0);
    }

    #[test]
    fn test_counts_include_smoothing_floor() {
        let mut counts = BigramCounts::new();
        counts.feed("ab");
        counts.feed("a");
        let a = Symbol::parse('a').unwrap();
        let b = Symbol::parse('b').unwrap();
        assert_eq!(counts.observed(), 2);
        assert_eq!(counts.count(a, b), 2);
        assert_eq!(counts.count(b, a), 2);
        assert_eq!(counts.count(a, a), 1);
    }

    #[test]
    fn test_degenerate_reference_rejected() {
        assert!(matches!(
            BigramModel::build(""),
            Err(DecipherError::InvalidModel(_))
        ));
        assert!(matches!(
            BigramModel::build("x"),
            Err(DecipherError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_invalid_table_rejected() {
        let mut probs = [[1.0 / SYMBOLS as f64; SYMBOLS]; SYMBOLS];
        assert!(BigramModel::from_probabilities(probs).is_ok());

        probs[3][0] = 0.0;
        assert!(matches!(
            BigramModel::from_probabilities(probs),
            Err(DecipherError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        fs::write(&path, b"not a model").unwrap();
        assert!(BigramModel::load(&path).is_err());
    }

    #[test]
    fn test_save_load() {
        let model = BigramModel::build(REFERENCE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        model.save(&path).unwrap();
        let loaded = BigramModel::load(&path).unwrap();

        let t = Symbol::parse('t').unwrap();
        let h = Symbol::parse('h').unwrap();
        assert_eq!(loaded.transition(t, h), model.transition(t, h));
        assert_eq!(loaded.log_transition(t, h), model.log_transition(t, h));
    }

    #[test]
    fn test_top_successors() {
        let model = BigramModel::build(REFERENCE).unwrap();
        let q = Symbol::parse('q').unwrap();
        let h = Symbol::parse('h').unwrap();
        let e = Symbol::parse('e').unwrap();
        assert_eq!(model.top_successors(h, 1)[0].0, e);
        assert_eq!(model.top_successors(q, 5).len(), 5);
    }
}
