//! Log-likelihood scoring of candidate decryptions
//!
//! Higher scores read more like the reference language. Both entry points
//! are pure: identical inputs always give identical scores.

use super::alphabet::Symbol;
use super::model::BigramModel;

/// Sum of `ln P(next | prev)` over consecutive normalized characters.
///
/// Raw text is normalized on the fly with the same rule the model builder
/// uses, so `"Hello, World"` and `"hello  world"` score the same.
pub fn log_likelihood(document: &str, model: &BigramModel) -> f64 {
    let mut symbols = document.chars().map(Symbol::from_char);
    let Some(mut prev) = symbols.next() else {
        return 0.0;
    };

    let mut score = 0.0;
    for next in symbols {
        score += model.log_transition(prev, next);
        prev = next;
    }
    score
}

/// Same as `log_likelihood` for an already-encoded document
pub fn log_likelihood_symbols(symbols: &[Symbol], model: &BigramModel) -> f64 {
    symbols
        .windows(2)
        .map(|pair| model.log_transition(pair[0], pair[1]))
        .sum()
}

/// Average log-likelihood per transition, comparable across document lengths
pub fn per_transition(score: f64, document_len: usize) -> f64 {
    if document_len < 2 {
        0.0
    } else {
        score / (document_len - 1) as f64
    }
}
