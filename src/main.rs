//! Substitution cipher breaker - bigram model + Metropolis-Hastings
//!
//! Single-run, self-contained CLI: builds (or loads) a language model,
//! reads the ciphertext, runs one chain and prints the best decryption.

mod cli;

use clap::Parser;
use cli::display::Display;
use cli::input::read_text;
use decipher_core::lm::model::BigramModel;
use decipher_core::sampler::{MetropolisSampler, Progress, SamplerConfig};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "decipher")]
#[command(about = "Break a monoalphabetic substitution cipher with MCMC")]
struct Args {
    /// Reference corpus of plain text in the target language
    #[arg(short, long, conflicts_with = "model")]
    reference: Option<PathBuf>,

    /// Prebuilt model from `build_model`
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Ciphertext file (prompts on stdin when omitted)
    #[arg(short, long)]
    ciphertext: Option<PathBuf>,

    /// JSON sampler config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accepted moves before stopping
    #[arg(long)]
    max_accepted: Option<u64>,

    /// Give up after this many proposals
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Proposals between progress updates (0 hides progress)
    #[arg(long)]
    progress_interval: Option<u64>,

    /// RNG seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the progress trace as JSON
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// File config (or defaults) with CLI overrides applied
    fn sampler_config(&self) -> Result<SamplerConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => SamplerConfig::load(path)?,
            None => SamplerConfig::default(),
        };

        if let Some(max_accepted) = self.max_accepted {
            config.max_accepted = max_accepted;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = Some(max_attempts);
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a subscriber set by an embedding process wins; keep using it
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn load_model(args: &Args, display: &Display) -> Result<BigramModel, Box<dyn Error>> {
    if let Some(path) = &args.model {
        display.show_status(&format!("Loading model from {}...", path.display()))?;
        return Ok(BigramModel::load(path)?);
    }

    let reference = read_text(
        args.reference.as_deref(),
        "Paste your reference text (e.g., a paragraph of normal English text):",
    )?;
    display.show_status("Building letter transition distribution...")?;
    Ok(BigramModel::build(&reference)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = args.sampler_config()?;
    let mut display = Display::new(config.max_accepted);

    let model = load_model(&args, &display)?;
    let ciphertext = read_text(args.ciphertext.as_deref(), "Paste your encrypted text:")?;

    display.show_status("Decrypting (this may take a few minutes)...")?;
    let sampler = MetropolisSampler::new(&model, config)?;

    // Rendering errors must not abort the chain; keep the first one for later
    let mut render_error = None;
    let mut observer = |progress: &Progress| {
        if let Err(err) = display.show_progress(progress) {
            render_error.get_or_insert(err);
        }
    };
    let outcome = sampler.run(&ciphertext, &mut observer)?;
    if let Some(err) = render_error {
        tracing::warn!("progress rendering failed: {err}");
    }

    display.show_result(&outcome)?;

    if let Some(path) = &args.trace {
        fs::write(path, serde_json::to_string_pretty(&outcome.trace)?)?;
        display.show_status(&format!("Trace written to {}", path.display()))?;
    }

    Ok(())
}
