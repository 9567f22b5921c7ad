// fieldguard-core/src/engines/regex_engine.rs
//! A `DetectionEngine` implementation that runs the registry's regular
//! expressions and validators over the input.
//! License: MIT OR APACHE 2.0

use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};

use crate::category::Category;
use crate::engine::{DetectionEngine, RawDetections};
use crate::registry::{BuiltInMatcher, CompiledPattern, PatternRegistry};
use crate::span::{log_span_debug, Span, SpanOrigin, BUILTIN_CONFIDENCE};

/// Default per-scan budget in bytes.
pub const DEFAULT_MAX_SCAN_LENGTH: usize = 100_000;

#[derive(Debug, Clone)]
pub struct RegexEngine {
    max_scan_length: usize,
}

impl Default for RegexEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SCAN_LENGTH)
    }
}

impl RegexEngine {
    pub fn new(max_scan_length: usize) -> Self {
        Self { max_scan_length }
    }

    pub fn max_scan_length(&self) -> usize {
        self.max_scan_length
    }

    fn run_builtin(matcher: &BuiltInMatcher, text: &str) -> Vec<Span> {
        let group = matcher.value_group.unwrap_or(0);
        let mut spans = Vec::new();
        for m in matcher.regex.captures_iter(text).filter_map(|caps| caps.get(group)) {
            for range in matcher.accepted_ranges(m.as_str()) {
                let span = Span::located(
                    matcher.category.into(),
                    &m.as_str()[range.clone()],
                    m.start() + range.start,
                    BUILTIN_CONFIDENCE,
                    Some(matcher.name.to_string()),
                    SpanOrigin::BuiltIn,
                );
                spans.extend(span);
            }
        }
        spans
    }

    fn run_custom(pattern: &CompiledPattern, text: &str) -> Vec<Span> {
        let category = Category::Custom(pattern.declared_category.clone().unwrap_or_default());
        pattern
            .regex
            .find_iter(text)
            .filter_map(|m| {
                Span::located(
                    category.clone(),
                    m.as_str(),
                    m.start(),
                    pattern.confidence,
                    Some(pattern.name.clone()),
                    SpanOrigin::Custom,
                )
            })
            .collect()
    }
}

// Matcher isolation is built on unwinding.
#[cfg(not(panic = "unwind"))]
compile_error!("fieldguard-core must be built with panic = \"unwind\"");

/// Runs one matcher with panic isolation. A panicking matcher yields nothing.
fn isolated<F>(matcher_name: &str, run: F) -> Vec<Span>
where
    F: FnOnce() -> Vec<Span>,
{
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(spans) => spans,
        Err(_) => {
            warn!("Matcher '{}' failed during scan; its results were discarded.", matcher_name);
            Vec::new()
        }
    }
}

impl DetectionEngine for RegexEngine {
    fn scan(&self, text: &str, registry: &PatternRegistry) -> RawDetections {
        if text.is_empty() {
            return RawDetections::default();
        }
        if text.len() > self.max_scan_length {
            warn!(
                "Input of {} bytes exceeds the scan budget of {} bytes; skipping matchers.",
                text.len(),
                self.max_scan_length
            );
            return RawDetections::default();
        }

        let mut built_in: Vec<Span> = Vec::new();
        for matcher in registry.active_builtins() {
            for span in isolated(matcher.name, || Self::run_builtin(matcher, text)) {
                // Earlier matchers claim their region.
                if built_in.iter().any(|kept| kept.overlaps(&span)) {
                    continue;
                }
                log_span_debug(module_path!(), &span);
                built_in.push(span);
            }
        }

        let mut custom: Vec<Span> = Vec::new();
        for pattern in registry.custom_patterns() {
            let spans = isolated(&pattern.name, || Self::run_custom(pattern, text));
            for span in &spans {
                log_span_debug(module_path!(), span);
            }
            custom.extend(spans);
        }

        debug!(
            "Scan finished: {} built-in and {} custom spans.",
            built_in.len(),
            custom.len()
        );
        RawDetections { built_in, custom }
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
