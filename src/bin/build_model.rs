//! Model building binary for the substitution cipher breaker
//!
//! Counts letter transitions over one or more corpus files and saves the
//! bigram model for `decipher --model`. Can also encipher a sample text under
//! a random key to produce test input.
//! Usage: cargo run --bin build_model -- --corpus <path> --output models/english.bin

use clap::Parser;
use decipher_core::cipher::CipherKey;
use decipher_core::lm::model::BigramCounts;
use decipher_core::lm::Symbol;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "build_model")]
#[command(about = "Build a bigram letter model from a plain-text corpus")]
struct Args {
    /// Corpus file(s); repeat the flag to combine several
    #[arg(short, long, required = true)]
    corpus: Vec<PathBuf>,

    /// Where to write the model
    #[arg(short, long, default_value = "models/english.bin")]
    output: PathBuf,

    /// Also print this file enciphered under a random key
    #[arg(long)]
    encrypt: Option<PathBuf>,

    /// Seed for the `--encrypt` key
    #[arg(short, long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let default_level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let mut counts = BigramCounts::new();
    for path in &args.corpus {
        let text = fs::read_to_string(path)?;
        println!("Loaded {} characters from {}", text.chars().count(), path.display());
        counts.feed(&text);
    }
    println!("Counted {} letter transitions", counts.observed());

    let model = counts.finish()?;

    if args.verbose {
        println!("\nMost likely successors:");
        for first in Symbol::all() {
            let successors: Vec<String> = model
                .top_successors(first, 5)
                .into_iter()
                .map(|(s, p)| format!("{:?} {:.3}", s.to_char(), p))
                .collect();
            println!("  {:?} -> {}", first.to_char(), successors.join(", "));
        }
        println!();
    }

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    model.save(&args.output)?;
    println!("Model saved to {}", args.output.display());

    if let Some(path) = &args.encrypt {
        encrypt_sample(path, args.seed)?;
    }

    Ok(())
}

/// Print `path` enciphered under a random (optionally seeded) key
fn encrypt_sample(path: &Path, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let key = CipherKey::random(&mut rng);
    let plaintext = fs::read_to_string(path)?;

    println!("\nKey (plaintext over ciphertext):\n{}\n", key);
    println!("{}", key.encrypt(&plaintext));
    Ok(())
}
