// fieldguard-core/src/engine.rs
//! Defines the `DetectionEngine` trait and the raw detection result.
//!
//! An engine runs a registry snapshot over a piece of text and reports what
//! each matcher family found, before conflict resolution. Engines are pure:
//! the same text and registry always produce the same detections.
//!
//! License: MIT OR APACHE 2.0

use serde::Serialize;

use crate::registry::PatternRegistry;
use crate::span::Span;

/// Unresolved output of a scan, split by matcher family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawDetections {
    /// Built-in spans in catalog order, with overlaps already removed.
    pub built_in: Vec<Span>,
    /// Custom spans in registration order, carrying their declared labels.
    pub custom: Vec<Span>,
}

impl RawDetections {
    pub fn is_empty(&self) -> bool {
        self.built_in.is_empty() && self.custom.is_empty()
    }

    pub fn len(&self) -> usize {
        self.built_in.len() + self.custom.len()
    }
}

/// A pluggable detection method.
///
/// The trait decouples the façade from how matching is done, so a host or a
/// test can substitute its own engine.
pub trait DetectionEngine: Send + Sync {
    /// Runs every active matcher in `registry` over `text`.
    ///
    /// Never fails: a matcher that errors contributes nothing.
    fn scan(&self, text: &str, registry: &PatternRegistry) -> RawDetections;

    /// Short engine name for logs.
    fn name(&self) -> &'static str;
}
