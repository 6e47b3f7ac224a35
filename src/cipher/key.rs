//! Substitution keys and their application to text
//!
//! A key is a full permutation of `a..z` indexed by plaintext letter:
//! `key[p] = c` means plaintext letter `p` enciphers to ciphertext letter `c`.
//! The inverse table is kept alongside so decryption is a single lookup.

use crate::errors::{DecipherError, Result};
use crate::lm::alphabet::{Symbol, LETTERS};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::{self, Debug, Display, Formatter};

/// Bijection from plaintext letters to ciphertext letters
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CipherKey {
    /// plaintext letter index -> ciphertext letter index
    forward: [u8; LETTERS],
    /// ciphertext letter index -> plaintext letter index
    inverse: [u8; LETTERS],
}

impl CipherKey {
    /// The key mapping every letter to itself
    pub fn identity() -> Self {
        let mut forward = [0u8; LETTERS];
        for (i, slot) in forward.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self::from_forward(forward)
    }

    /// Uniformly random permutation
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut forward = Self::identity().forward;
        forward.shuffle(rng);
        Self::from_forward(forward)
    }

    /// Parse a key written as the 26 ciphertext letters for `a..z` in order
    pub fn from_letters(letters: &str) -> Result<Self> {
        let letters = letters.trim();
        if letters.chars().count() != LETTERS {
            return Err(DecipherError::InvalidKey(format!(
                "expected {} letters, got {}",
                LETTERS,
                letters.chars().count()
            )));
        }

        let mut forward = [0u8; LETTERS];
        let mut seen = 0u32; // bitset of ciphertext letters already used
        for (slot, c) in forward.iter_mut().zip(letters.chars()) {
            let idx = Symbol::from_char(c)
                .letter_index()
                .ok_or_else(|| DecipherError::InvalidKey(format!("'{}' is not a letter", c)))?;
            if seen & (1 << idx) != 0 {
                return Err(DecipherError::InvalidKey(format!(
                    "letter '{}' appears twice",
                    c.to_ascii_lowercase()
                )));
            }
            seen |= 1 << idx;
            *slot = idx as u8;
        }

        Ok(Self::from_forward(forward))
    }

    fn from_forward(forward: [u8; LETTERS]) -> Self {
        let mut inverse = [0u8; LETTERS];
        for (plain, &cipher) in forward.iter().enumerate() {
            inverse[cipher as usize] = plain as u8;
        }
        CipherKey { forward, inverse }
    }

    /// Ciphertext letter for a plaintext letter
    pub fn encrypt_symbol(&self, plain: Symbol) -> Symbol {
        match plain.letter_index() {
            Some(idx) => Symbol::letter(self.forward[idx] as usize).unwrap_or(Symbol::SPACE),
            None => Symbol::SPACE,
        }
    }

    /// Plaintext letter for a ciphertext letter
    pub fn decrypt_symbol(&self, cipher: Symbol) -> Symbol {
        match cipher.letter_index() {
            Some(idx) => Symbol::letter(self.inverse[idx] as usize).unwrap_or(Symbol::SPACE),
            None => Symbol::SPACE,
        }
    }

    /// Decrypt `ciphertext`: letters are looked up case-insensitively through
    /// the inverse mapping, every other character becomes a space
    pub fn apply(&self, ciphertext: &str) -> String {
        ciphertext
            .chars()
            .map(|c| self.decrypt_symbol(Symbol::from_char(c)).to_char())
            .collect()
    }

    /// Decrypt an encoded document into `out`, reusing its allocation
    pub fn apply_symbols(&self, ciphertext: &[Symbol], out: &mut Vec<Symbol>) {
        out.clear();
        out.extend(ciphertext.iter().map(|&s| self.decrypt_symbol(s)));
    }

    /// Encrypt `plaintext`; non-letters become spaces
    pub fn encrypt(&self, plaintext: &str) -> String {
        plaintext
            .chars()
            .map(|c| self.encrypt_symbol(Symbol::from_char(c)).to_char())
            .collect()
    }

    /// The key that undoes this one
    pub fn invert(&self) -> CipherKey {
        CipherKey {
            forward: self.inverse,
            inverse: self.forward,
        }
    }

    /// Copy of this key with the images of plaintext letters `i` and `j` exchanged.
    ///
    /// Callers go through `Swap`, which guarantees both positions are in range.
    pub(crate) fn swapped(&self, i: usize, j: usize) -> CipherKey {
        let mut forward = self.forward;
        forward.swap(i, j);
        Self::from_forward(forward)
    }

    /// True when every ciphertext letter is used exactly once
    pub fn is_permutation(&self) -> bool {
        let mut seen = [false; LETTERS];
        for &c in &self.forward {
            if c as usize >= LETTERS || seen[c as usize] {
                return false;
            }
            seen[c as usize] = true;
        }
        true
    }

    /// The 26 ciphertext letters for `a..z`
    pub fn to_letters(&self) -> String {
        self.forward.iter().map(|&c| (b'a' + c) as char).collect()
    }
}

impl Default for CipherKey {
    fn default() -> Self {
        Self::identity()
    }
}

/// Two-row table: plaintext alphabet above, ciphertext letters below
impl Display for CipherKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for i in 0..LETTERS as u8 {
            write!(f, "{}", (b'a' + i) as char)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.to_letters())
    }
}

impl Debug for CipherKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey({})", self.to_letters())
    }
}
