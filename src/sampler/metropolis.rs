//! Metropolis-Hastings search over substitution keys
//!
//! Each iteration proposes a single transposition of the current key,
//! scores the resulting decryption under the bigram model and accepts it
//! with probability `min(1, exp(proposal - current))`. The run ends once
//! `max_accepted` moves were accepted, the attempt cap is hit, or the
//! cancel token fires. The best proposal ever scored is returned, not the
//! final chain position.

use super::config::SamplerConfig;
use super::state::{
    acceptance_probability, acceptance_rate, accepts, CancelToken, Candidate, ChainPhase,
    ChainState, Progress, Termination,
};
use crate::cipher::{propose, CipherKey};
use crate::errors::{DecipherError, Result};
use crate::lm::alphabet::{self, Symbol};
use crate::lm::model::BigramModel;
use crate::lm::scoring::log_likelihood_symbols;
use rand::Rng;
use tracing::{debug, info, warn};

/// Receives a progress snapshot every `progress_interval` attempts
pub trait ProgressObserver {
    fn observe(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressObserver for F {
    fn observe(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Observer that ignores every report
pub struct Silent;

impl ProgressObserver for Silent {
    fn observe(&mut self, _progress: &Progress) {}
}

/// Result of one chain
#[derive(Clone, Debug)]
pub struct SamplerOutcome {
    /// Highest-scoring decryption seen over the run
    pub best: Candidate,
    pub termination: Termination,
    pub accepted: u64,
    pub attempts: u64,
    /// Progress snapshots, one per report
    pub trace: Vec<Progress>,
}

impl SamplerOutcome {
    pub fn text(&self) -> &str {
        &self.best.text
    }

    /// False when the attempt cap or a cancellation ended the run early
    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    pub fn acceptance_rate(&self) -> f64 {
        acceptance_rate(self.accepted, self.attempts)
    }
}

/// Metropolis-Hastings sampler bound to one language model
pub struct MetropolisSampler<'m> {
    model: &'m BigramModel,
    config: SamplerConfig,
    cancel: Option<CancelToken>,
}

impl<'m> MetropolisSampler<'m> {
    pub fn new(model: &'m BigramModel, config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(MetropolisSampler {
            model,
            config,
            cancel: None,
        })
    }

    /// Let `token` abort the run between iterations
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run with the random source described by the config
    pub fn run<O: ProgressObserver>(
        &self,
        ciphertext: &str,
        observer: &mut O,
    ) -> Result<SamplerOutcome> {
        let mut rng = self.config.rng();
        self.run_with_rng(ciphertext, &mut rng, observer)
    }

    /// Run with a caller-supplied random source
    pub fn run_with_rng<R: Rng + ?Sized, O: ProgressObserver>(
        &self,
        ciphertext: &str,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<SamplerOutcome> {
        let symbols = encode_ciphertext(ciphertext)?;
        let mut decrypted = Vec::with_capacity(symbols.len());

        let initial = CipherKey::random(rng);
        initial.apply_symbols(&symbols, &mut decrypted);
        let initial_score = log_likelihood_symbols(&decrypted, self.model);
        let mut state = ChainState::new(initial, initial_score);
        let mut trace = Vec::new();

        info!(
            chars = symbols.len(),
            max_accepted = self.config.max_accepted,
            max_attempts = ?self.config.max_attempts,
            "starting metropolis-hastings chain"
        );

        loop {
            let phase = state.check_termination(
                self.config.max_accepted,
                self.config.max_attempts,
                self.cancel.as_ref(),
            );
            if phase != ChainPhase::Running {
                break;
            }

            let candidate = propose(&state.current_key, rng);
            candidate.apply_symbols(&symbols, &mut decrypted);
            let score = log_likelihood_symbols(&decrypted, self.model);
            state.record_proposal(&candidate, score, &decrypted);

            let u: f64 = rng.gen();
            if accepts(u, acceptance_probability(score, state.current_score)) {
                state.accept(candidate, score);
            }

            if state.should_report(self.config.progress_interval) {
                let progress = state.progress();
                debug!(
                    accepted = progress.accepted,
                    attempts = progress.attempts,
                    current = progress.current_score,
                    best = progress.best_score,
                    "chain progress"
                );
                trace.push(progress);
                observer.observe(&progress);
            }
        }

        let termination = match state.phase() {
            ChainPhase::Done(reason) => reason,
            ChainPhase::Running => Termination::Converged,
        };
        match termination {
            Termination::Converged => info!(
                accepted = state.accepted,
                attempts = state.attempts,
                best = state.best_score(),
                "chain reached its acceptance budget"
            ),
            Termination::AttemptCapReached => warn!(
                accepted = state.accepted,
                attempts = state.attempts,
                "attempt cap reached before the acceptance budget; returning partial best"
            ),
            Termination::Cancelled => warn!(
                accepted = state.accepted,
                attempts = state.attempts,
                "chain cancelled; returning best so far"
            ),
        }

        let (accepted, attempts) = (state.accepted, state.attempts);
        Ok(SamplerOutcome {
            best: state.into_best(&symbols),
            termination,
            accepted,
            attempts,
            trace,
        })
    }
}

/// Reject ciphertext that gives the chain nothing to score
fn encode_ciphertext(ciphertext: &str) -> Result<Vec<Symbol>> {
    if ciphertext.is_empty() {
        return Err(DecipherError::InvalidCiphertext("ciphertext is empty".into()));
    }
    let symbols = alphabet::encode(ciphertext);
    if symbols.iter().all(|s| s.is_space()) {
        return Err(DecipherError::InvalidCiphertext(
            "ciphertext contains no letters".into(),
        ));
    }
    Ok(symbols)
}

/// Build a sampler for `config` and run it without progress reporting
pub fn decipher(
    ciphertext: &str,
    model: &BigramModel,
    config: SamplerConfig,
) -> Result<SamplerOutcome> {
    MetropolisSampler::new(model, config)?.run(ciphertext, &mut Silent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::scoring::log_likelihood;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const REFERENCE: &str = "the sun was setting over the hills as the old man walked \
        home along the river with his dog and the children ran ahead of them \
        laughing and shouting at the birds that rose from the water";

    fn model() -> BigramModel {
        BigramModel::build(REFERENCE).unwrap()
    }

    #[test]
    fn test_empty_ciphertext_rejected() {
        let model = model();
        let result = decipher("", &model, SamplerConfig::default().with_seed(1));
        assert!(matches!(result, Err(DecipherError::InvalidCiphertext(_))));

        let result = decipher("123 !?", &model, SamplerConfig::default().with_seed(1));
        assert!(matches!(result, Err(DecipherError::InvalidCiphertext(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let model = model();
        let config = SamplerConfig::default().with_max_accepted(0);
        assert!(matches!(
            MetropolisSampler::new(&model, config),
            Err(DecipherError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stops_at_acceptance_budget() {
        let model = model();
        let config = SamplerConfig::default().with_seed(4).with_max_accepted(50);
        let outcome = decipher("wkh vxq zdv vhwwlqj", &model, config).unwrap();
        assert_eq!(outcome.termination, Termination::Converged);
        assert_eq!(outcome.accepted, 50);
        assert!(outcome.attempts >= 50);
        assert_eq!(outcome.acceptance_rate(), 50.0 / outcome.attempts as f64);
        assert_eq!(outcome.text().len(), "wkh vxq zdv vhwwlqj".len());
    }

    #[test]
    fn test_best_is_highest_scoring_proposal() {
        let model = model();
        let ciphertext = "wkh vxq zdv vhwwlqj ryhu wkh kloov";
        let config = SamplerConfig::default().with_seed(17).with_max_accepted(300);
        let outcome = decipher(ciphertext, &model, config).unwrap();
        let rescored = log_likelihood(outcome.text(), &model);
        assert!((rescored - outcome.best.score).abs() < 1e-9);
        assert_eq!(outcome.best.key.apply(ciphertext), outcome.best.text);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let model = model();
        let ciphertext = "wkh rog pdq zdonhg krph";
        let config = SamplerConfig::default().with_seed(99).with_max_accepted(200);
        let a = decipher(ciphertext, &model, config.clone()).unwrap();
        let b = decipher(ciphertext, &model, config).unwrap();
        assert_eq!(a.text(), b.text());
        assert_eq!(a.attempts, b.attempts);
        assert_eq!(a.best.key, b.best.key);
    }

    #[test]
    fn test_attempt_cap_returns_partial_best() {
        let model = model();
        let config = SamplerConfig::default()
            .with_seed(2)
            .with_max_accepted(u64::MAX)
            .with_max_attempts(250);
        let outcome = decipher("wkh grj", &model, config).unwrap();
        assert_eq!(outcome.termination, Termination::AttemptCapReached);
        assert!(!outcome.is_converged());
        assert_eq!(outcome.attempts, 250);
        assert!(outcome.best.score.is_finite());
    }

    #[test]
    fn test_cancelled_before_start_returns_initial_decryption() {
        let model = model();
        let token = CancelToken::new();
        token.cancel();
        let sampler = MetropolisSampler::new(&model, SamplerConfig::default().with_seed(3))
            .unwrap()
            .with_cancel(token);
        let outcome = sampler.run("wkh grj", &mut Silent).unwrap();
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(outcome.text().len(), 7);
    }

    #[test]
    fn test_cancel_from_observer() {
        let model = model();
        let token = CancelToken::new();
        let sampler = MetropolisSampler::new(
            &model,
            SamplerConfig::default()
                .with_seed(8)
                .with_max_accepted(u64::MAX)
                .with_progress_interval(10),
        )
        .unwrap()
        .with_cancel(token.clone());

        let mut reports = 0;
        let mut observer = |_: &Progress| {
            reports += 1;
            if reports == 3 {
                token.cancel();
            }
        };
        let outcome = sampler.run("wkh vxq vhwv", &mut observer).unwrap();
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.attempts, 30);
        assert_eq!(outcome.trace.len(), 3);
    }

    #[test]
    fn test_progress_cadence() {
        let model = model();
        let sampler = MetropolisSampler::new(
            &model,
            SamplerConfig::default()
                .with_max_accepted(u64::MAX)
                .with_max_attempts(1000)
                .with_progress_interval(100),
        )
        .unwrap();

        let mut seen = Vec::new();
        let mut observer = |p: &Progress| seen.push((p.accepted, p.attempts));
        let mut rng = StdRng::seed_from_u64(12);
        let outcome = sampler
            .run_with_rng("zkhq wkh ulyhu ur vh", &mut rng, &mut observer)
            .unwrap();

        let attempts: Vec<u64> = seen.iter().map(|&(_, attempts)| attempts).collect();
        assert_eq!(attempts, (1..=10).map(|i| i * 100).collect::<Vec<_>>());
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(outcome.trace.len(), 10);
    }
}
