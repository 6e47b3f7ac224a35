//! Alphabet: the 27-symbol character set shared by the model and the cipher
//!
//! Handles:
//! - Character to symbol mapping (letters lowercased, everything else is space)
//! - Symbol to character reverse mapping
//! - Whole-document normalization

use std::fmt;

/// Number of letters a substitution key permutes
pub const LETTERS: usize = 26;

/// Letters plus the space symbol
pub const SYMBOLS: usize = LETTERS + 1;

/// One of the 27 alphabet symbols: `0..26` are `a..z`, `26` is space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
    pub const SPACE: Symbol = Symbol(LETTERS as u8);

    /// Normalize any character into the alphabet.
    ///
    /// ASCII letters are lowercased; digits, punctuation, whitespace and
    /// non-ASCII characters all collapse to space.
    pub fn from_char(c: char) -> Self {
        if c.is_ascii_alphabetic() {
            Symbol(c.to_ascii_lowercase() as u8 - b'a')
        } else {
            Self::SPACE
        }
    }

    /// Strict lookup: only `a..z` and `' '` are symbols.
    pub fn parse(c: char) -> Option<Self> {
        match c {
            'a'..='z' => Some(Symbol(c as u8 - b'a')),
            ' ' => Some(Self::SPACE),
            _ => None,
        }
    }

    /// Symbol for the letter at position `idx` (`0 => 'a'`).
    pub fn letter(idx: usize) -> Option<Self> {
        (idx < LETTERS).then(|| Symbol(idx as u8))
    }

    /// Table index in `0..SYMBOLS`
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Letter position in `0..LETTERS`, `None` for space
    pub fn letter_index(self) -> Option<usize> {
        (!self.is_space()).then(|| self.0 as usize)
    }

    pub fn is_space(self) -> bool {
        self == Self::SPACE
    }

    pub fn to_char(self) -> char {
        if self.is_space() {
            ' '
        } else {
            (b'a' + self.0) as char
        }
    }

    /// All symbols in table order
    pub fn all() -> impl Iterator<Item = Symbol> {
        (0..SYMBOLS as u8).map(Symbol)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Map every character of `text` to its symbol
pub fn encode(text: &str) -> Vec<Symbol> {
    text.chars().map(Symbol::from_char).collect()
}

/// Render symbols back to a string of `a..z` and spaces
pub fn decode(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.to_char()).collect()
}

/// Normalize a document into the alphabet, one symbol per input character
pub fn normalize(text: &str) -> String {
    text.chars().map(|c| Symbol::from_char(c).to_char()).collect()
}
