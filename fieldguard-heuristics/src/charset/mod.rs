//! Character-level statistics used by the scan gate and the secret validators.

use alloc::collections::BTreeSet;

/// Counts the distinct Unicode scalar values in `text`, stopping early once
/// `cap` distinct values have been seen.
///
/// Callers that only need "at least N distinct characters" pass `N` as the
/// cap so long inputs are not walked to the end.
pub fn distinct_chars(text: &str, cap: usize) -> usize {
    let mut seen = BTreeSet::new();
    for c in text.chars() {
        seen.insert(c);
        if seen.len() >= cap {
            break;
        }
    }
    seen.len()
}

/// Per-class character counts for a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharClassProfile {
    pub lower: usize,
    pub upper: usize,
    pub digit: usize,
    pub symbol: usize,
    pub whitespace: usize,
}

impl CharClassProfile {
    pub fn of(text: &str) -> Self {
        let mut profile = Self::default();
        for c in text.chars() {
            if c.is_lowercase() {
                profile.lower += 1;
            } else if c.is_uppercase() {
                profile.upper += 1;
            } else if c.is_ascii_digit() {
                profile.digit += 1;
            } else if c.is_whitespace() {
                profile.whitespace += 1;
            } else {
                profile.symbol += 1;
            }
        }
        profile
    }

    /// Number of non-whitespace classes present (0..=4).
    pub fn classes_present(&self) -> usize {
        [self.lower, self.upper, self.digit, self.symbol]
            .iter()
            .filter(|&&n| n > 0)
            .count()
    }
}
