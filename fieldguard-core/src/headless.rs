// fieldguard-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot, non-interactive use: build a guard,
//! register patterns, scan or mask a single string.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::{CustomPattern, GuardConfig};
use crate::field_context::{coarse_kind, CoarseKind, FieldDescriptor};
use crate::guard::FieldGuard;
use crate::masking::mask_all_in_text;
use crate::registry::RegistrationReport;
use crate::span::Span;

/// Everything a one-shot scan produced.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessScan {
    pub spans: Vec<Span>,
    pub coarse_kind: CoarseKind,
    pub registration: RegistrationReport,
}

fn build_guard(config: GuardConfig, patterns: &[CustomPattern]) -> Result<(FieldGuard, RegistrationReport)> {
    let guard = FieldGuard::new(config)?;
    let report = guard.register_custom_patterns(patterns);
    Ok((guard, report))
}

/// Scans `text` as if typed into `field`, with expected categories removed.
pub fn headless_scan(
    config: GuardConfig,
    patterns: &[CustomPattern],
    text: &str,
    field: &FieldDescriptor,
) -> Result<HeadlessScan> {
    let (guard, registration) = build_guard(config, patterns)?;
    Ok(HeadlessScan {
        spans: guard.scan(text, field),
        coarse_kind: coarse_kind(field),
        registration,
    })
}

/// Returns `text` with every finding masked. Field context is ignored:
/// everything detected is masked.
///
/// Fails when any custom pattern was rejected and `strict` is set.
pub fn headless_mask(
    config: GuardConfig,
    patterns: &[CustomPattern],
    text: &str,
    strict: bool,
) -> Result<String> {
    let (guard, registration) = build_guard(config, patterns)?;
    if strict && !registration.is_clean() {
        bail!(
            "{} custom pattern(s) failed to register; refusing to mask with a partial set.",
            registration.errors.len()
        );
    }
    Ok(mask_all_in_text(text, &guard.detect(text)))
}
