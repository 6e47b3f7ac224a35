//! Terminal rendering of chain progress and results
//!
//! Features:
//! - In-place progress line (accepted / attempts, scores)
//! - Colour-coded termination status
//! - Recovered key table and decrypted text

use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use decipher_core::lm::scoring;
use decipher_core::sampler::{Progress, SamplerOutcome, Termination};
use std::io::{stdout, Write};

/// Terminal display manager
pub struct Display {
    /// Acceptance budget, shown as the progress denominator
    max_accepted: u64,
    /// Whether a progress line is currently drawn and must be finished
    progress_open: bool,
}

impl Display {
    pub fn new(max_accepted: u64) -> Self {
        Display {
            max_accepted,
            progress_open: false,
        }
    }

    /// Print a coloured status line
    pub fn show_status(&self, message: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print(message),
            ResetColor,
            Print("\n")
        )?;
        Ok(())
    }

    /// Redraw the progress line in place
    pub fn show_progress(
        &mut self,
        progress: &Progress,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();
        let rate = progress.acceptance_rate();

        execute!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Magenta),
            Print("Progress: "),
            ResetColor,
            Print(format!(
                "{}/{} accepted moves ({} total attempts)",
                progress.accepted, self.max_accepted, progress.attempts
            )),
            Print("  |  "),
            SetForegroundColor(rate_color(rate)),
            Print(format!("{:.1}% accepted", rate * 100.0)),
            ResetColor,
            Print(format!("  |  best {:.1}", progress.best_score)),
        )?;
        stdout.flush()?;
        self.progress_open = true;
        Ok(())
    }

    /// Terminate the progress line so later output starts on a fresh row
    pub fn finish_progress(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.progress_open {
            execute!(stdout(), Print("\n"))?;
            self.progress_open = false;
        }
        Ok(())
    }

    /// Show the best decryption, its key and how the run ended
    pub fn show_result(
        &mut self,
        outcome: &SamplerOutcome,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.finish_progress()?;
        let mut stdout = stdout();

        let (color, status) = match outcome.termination {
            Termination::Converged => (Color::Green, "converged"),
            Termination::AttemptCapReached => {
                (Color::Yellow, "attempt cap reached (partial result)")
            }
            Termination::Cancelled => (Color::Red, "cancelled (partial result)"),
        };
        let per_char =
            scoring::per_transition(outcome.best.score, outcome.best.text.chars().count());

        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(color),
            Print(format!("Status: {}\n", status)),
            ResetColor,
            Print(format!(
                "Accepted {} of {} proposals ({:.1}%)  |  Log-likelihood {:.2} ({:.3}/transition)\n",
                outcome.accepted,
                outcome.attempts,
                outcome.acceptance_rate() * 100.0,
                outcome.best.score,
                per_char
            )),
            SetForegroundColor(Color::Blue),
            Print("Key (plaintext over ciphertext):\n"),
            ResetColor,
            Print(format!("{}\n", outcome.best.key)),
            SetForegroundColor(Color::Blue),
            Print("\nDecrypted text:\n"),
            Print("-".repeat(50)),
            Print("\n"),
            ResetColor,
            Print(&outcome.best.text),
            Print("\n"),
            SetForegroundColor(Color::Blue),
            Print("-".repeat(50)),
            Print("\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn rate_color(rate: f64) -> Color {
    if rate > 0.2 {
        Color::Green
    } else if rate > 0.02 {
        Color::Yellow
    } else {
        Color::Red
    }
}
