// fieldguard-heuristics/src/lib.rs
//! Cheap, allocation-light text statistics shared by the fieldguard engine.
//!
//! * `entropy`: Shannon entropy of byte slices.
//! * `charset`: distinct-symbol counts and character-class profiles.
//! * `keywords`: Aho-Corasick keyword sets with word-boundary awareness.
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod charset;
pub mod entropy;
pub mod keywords;

/// Entropy in bits per symbol.
pub type EntropyScore = f64;
