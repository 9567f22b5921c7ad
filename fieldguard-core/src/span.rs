// fieldguard-core/src/span.rs
//! Core data structures for detected spans, plus the PII-safe logging helpers
//! every module uses when it needs to mention a matched value.

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::category::Category;

/// Confidence assigned to built-in matches.
pub const BUILTIN_CONFIDENCE: u8 = 100;

/// Determines once whether raw values may appear in debug logs.
static PII_DEBUG_ALLOWED: Lazy<bool> = Lazy::new(|| {
    std::env::var("FIELDGUARD_ALLOW_DEBUG_PII")
        .map(|s| s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

/// Where a span came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanOrigin {
    BuiltIn,
    Custom,
    Remote,
}

/// Byte offsets of a span inside the scanned text. `end >= start` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Offsets {
    pub start: usize,
    pub end: usize,
}

/// A single detected occurrence of a sensitive-data category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub category: Category,
    pub value: String,
    #[serde(default)]
    pub offsets: Option<Offsets>,
    pub confidence: u8,
    #[serde(default)]
    pub source: Option<String>,
    pub origin: SpanOrigin,
}

impl Span {
    /// Builds a span found at `start` in the scanned text.
    ///
    /// Returns `None` for empty values, which are never reported.
    pub fn located(
        category: Category,
        value: &str,
        start: usize,
        confidence: u8,
        source: Option<String>,
        origin: SpanOrigin,
    ) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        Some(Self {
            category,
            value: value.to_string(),
            offsets: Some(Offsets {
                start,
                end: start + value.len(),
            }),
            confidence: confidence.min(100),
            source,
            origin,
        })
    }

    /// Builds a span whose position is unknown (e.g. reported by a remote
    /// classifier that only returns values).
    pub fn unlocated(
        category: Category,
        value: &str,
        confidence: u8,
        source: Option<String>,
        origin: SpanOrigin,
    ) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        Some(Self {
            category,
            value: value.to_string(),
            offsets: None,
            confidence: confidence.min(100),
            source,
            origin,
        })
    }

    pub fn start(&self) -> Option<usize> {
        self.offsets.map(|o| o.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.offsets.map(|o| o.end)
    }

    /// True when the span's offsets still address its value inside `text`.
    pub fn matches_text_at_offsets(&self, text: &str) -> bool {
        match self.offsets {
            Some(Offsets { start, end }) => text.get(start..end) == Some(self.value.as_str()),
            None => false,
        }
    }

    /// Fills in offsets from the first verbatim occurrence of the value.
    pub fn locate_in(mut self, text: &str) -> Self {
        if self.offsets.is_none() {
            if let Some(start) = text.find(&self.value) {
                self.offsets = Some(Offsets {
                    start,
                    end: start + self.value.len(),
                });
            }
        }
        self
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        match (self.offsets, other.offsets) {
            (Some(a), Some(b)) => a.start < b.end && b.start < a.end,
            _ => false,
        }
    }
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

/// Returns either the raw value or its redacted stand-in, depending on
/// `FIELDGUARD_ALLOW_DEBUG_PII`.
pub fn loggable(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_span_debug(module_path: &str, span: &Span) {
    debug!(
        "{} Found span: category='{}', source='{}', value='{}', offsets={:?}",
        module_path,
        span.category,
        span.source.as_deref().unwrap_or("-"),
        loggable(&span.value),
        span.offsets
    );
}

/// Stable hash of a category/value pair, used as an event fingerprint so
/// telemetry never carries the raw value.
pub fn canonical_value_hash(category: &Category, value: &str) -> String {
    let normalized = value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
