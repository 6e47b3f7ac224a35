//! CLI Interface: text input and terminal rendering
//!
//! # Components
//! - `input.rs`: Reference/ciphertext loading from files or stdin
//! - `display.rs`: Progress and result rendering

pub mod display;
pub mod input;
