//! compiler.rs - Compiles host-supplied custom patterns.
//!
//! Compilation is partial: a pattern that is empty, too long or fails to
//! compile is reported and skipped, and the rest still register.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::config::{CustomPattern, MAX_PATTERN_LENGTH};
use crate::errors::FieldGuardError;
use crate::registry::builtins::REGEX_SIZE_LIMIT;

/// A custom pattern ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub id: String,
    pub name: String,
    /// The declared category label, untouched. Normalization happens during
    /// conflict resolution.
    pub declared_category: Option<String>,
    pub regex: Regex,
    pub confidence: u8,
}

/// A pattern that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationError {
    pub id: String,
    pub name: String,
    pub reason: String,
}

/// Outcome of a registration call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    /// Ids of the patterns now active, in registration order.
    pub registered: Vec<String>,
    /// Ids of inactive patterns that were not compiled.
    pub skipped: Vec<String>,
    pub errors: Vec<RegistrationError>,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compiles one pattern, enforcing the emptiness and length limits first.
pub fn compile_pattern(pattern: &CustomPattern) -> Result<Regex, FieldGuardError> {
    let label = pattern.label().to_string();
    if pattern.pattern.trim().is_empty() {
        return Err(FieldGuardError::EmptyPattern(label));
    }
    if pattern.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(FieldGuardError::PatternLengthExceeded(
            label,
            pattern.pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }

    RegexBuilder::new(&pattern.pattern)
        .case_insensitive(pattern.case_insensitive)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| FieldGuardError::PatternCompilation(label, e))
}

/// Compiles every active pattern, collecting per-pattern failures.
pub fn compile_custom_patterns(
    patterns: &[CustomPattern],
    default_confidence: u8,
) -> (Vec<CompiledPattern>, RegistrationReport) {
    debug!("Starting compilation of {} custom patterns.", patterns.len());

    let mut compiled = Vec::with_capacity(patterns.len());
    let mut report = RegistrationReport::default();

    for pattern in patterns {
        if !pattern.active {
            debug!("Skipping inactive pattern '{}'.", pattern.label());
            report.skipped.push(pattern.id.clone());
            continue;
        }

        match compile_pattern(pattern) {
            Ok(regex) => {
                debug!("Pattern '{}' compiled successfully.", pattern.label());
                compiled.push(CompiledPattern {
                    id: pattern.id.clone(),
                    name: pattern.label().to_string(),
                    declared_category: pattern.category.clone(),
                    regex,
                    confidence: pattern.confidence.unwrap_or(default_confidence).min(100),
                });
                report.registered.push(pattern.id.clone());
            }
            Err(e) => {
                warn!("Rejected custom pattern '{}': {}", pattern.label(), e);
                report.errors.push(RegistrationError {
                    id: pattern.id.clone(),
                    name: pattern.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    debug!(
        "Finished compiling custom patterns. Registered: {}, skipped: {}, errors: {}.",
        report.registered.len(),
        report.skipped.len(),
        report.errors.len()
    );
    (compiled, report)
}
