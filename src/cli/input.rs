//! Text input for the reference corpus and the ciphertext
//!
//! Reads from a file when a path is given, otherwise from stdin: one pasted
//! line on an interactive terminal, the whole stream when piped.

use crossterm::tty::IsTty;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

/// Read `path`, or prompt for text on stdin
pub fn read_text(path: Option<&Path>, prompt: &str) -> io::Result<String> {
    if let Some(path) = path {
        return fs::read_to_string(path);
    }

    let stdin = io::stdin();
    let mut text = String::new();
    if stdin.is_tty() {
        println!("{}", prompt);
        io::stdout().flush()?;
        stdin.lock().read_line(&mut text)?;
    } else {
        stdin.lock().read_to_string(&mut text)?;
    }

    Ok(strip_line_ending(text))
}

/// Drop a single trailing newline left by line-based input
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending("abc\r\n".into()), "abc");
        assert_eq!(strip_line_ending("abc\n\n".into()), "abc\n");
        assert_eq!(strip_line_ending("abc".into()), "abc");
    }

    #[test]
    fn test_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cipher.txt");
        fs::write(&path, "wkh grj\n").unwrap();
        assert_eq!(read_text(Some(&path), "unused").unwrap(), "wkh grj\n");
    }
}
