//! Keyword sets backed by a double-array Aho-Corasick automaton.
//!
//! Each keyword belongs to a caller-defined group. Matching is byte-wise, so
//! callers lowercase the haystack first. Short keywords (three bytes or fewer)
//! only count when no ASCII letter touches them, so `pan` matches `pan-number`
//! and `ssn_2` but not `company`.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

use daachorse::errors::DaachorseError;
use daachorse::DoubleArrayAhoCorasick;

/// Keywords at or below this length must not touch a letter on either side.
pub const WHOLE_WORD_MAX_LEN: usize = 3;

pub struct KeywordSet {
    automaton: DoubleArrayAhoCorasick<u32>,
    groups: Vec<u32>,
    whole_word: Vec<bool>,
}

impl fmt::Debug for KeywordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordSet")
            .field("automaton", &"<DoubleArrayAhoCorasick>")
            .field("keywords", &self.groups.len())
            .finish()
    }
}

impl KeywordSet {
    /// Builds a set from `(keyword, group)` pairs. Keywords must be unique and
    /// lowercase.
    pub fn new(entries: &[(&str, u32)]) -> Result<Self, DaachorseError> {
        let automaton = DoubleArrayAhoCorasick::with_values(
            entries
                .iter()
                .enumerate()
                .map(|(idx, (keyword, _))| (keyword.as_bytes(), idx as u32)),
        )?;
        let groups = entries.iter().map(|(_, group)| *group).collect();
        let whole_word = entries
            .iter()
            .map(|(keyword, _)| keyword.len() <= WHOLE_WORD_MAX_LEN)
            .collect();

        Ok(Self {
            automaton,
            groups,
            whole_word,
        })
    }

    /// Returns every group with at least one keyword present in `haystack`.
    pub fn matched_groups(&self, haystack: &[u8]) -> BTreeSet<u32> {
        let mut found = BTreeSet::new();
        for m in self.automaton.find_overlapping_iter(haystack) {
            let idx = m.value() as usize;
            if self.whole_word[idx] && !is_whole_word(haystack, m.start(), m.end()) {
                continue;
            }
            found.insert(self.groups[idx]);
        }
        found
    }
}

// Digits, underscores and punctuation all separate words.
fn is_whole_word(haystack: &[u8], start: usize, end: usize) -> bool {
    let prefix_ok = start == 0 || !haystack[start - 1].is_ascii_alphabetic();
    let suffix_ok = end == haystack.len() || !haystack[end].is_ascii_alphabetic();
    prefix_ok && suffix_ok
}
