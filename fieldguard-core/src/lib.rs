// fieldguard-core/src/lib.rs
//! # FieldGuard Core Library
//!
//! `fieldguard-core` detects sensitive data in short, form-field-sized text.
//! It classifies spans as payment cards, national IDs, emails, phone numbers,
//! credentials, cloud keys, private-key blocks and organization-defined
//! categories, and can mask them while keeping their visible format.
//!
//! A host application supplies raw text and optional field metadata. The
//! library decides what is sensitive, what the field is expected to contain,
//! and whether a slower remote classifier is worth calling. Presentation,
//! preference storage and transport stay with the host, behind traits.
//!
//! ## Modules
//!
//! * `category`: Built-in and custom sensitive-data categories.
//! * `span`: The `Span` type and PII-safe logging helpers.
//! * `validators`: Checksums and rules run after a pattern matches.
//! * `registry`: The built-in matcher catalog and custom pattern compilation.
//! * `engine` / `engines`: The `DetectionEngine` trait and the regex engine.
//! * `resolution`: Merging built-in and custom findings.
//! * `field_context`: Expected categories and coarse kind from field metadata.
//! * `masking`: Format-preserving masks.
//! * `gate`: Scan gate, result cache and the remote classifier contract.
//! * `telemetry`: Bounded detection-event queue and its sink.
//! * `guard`: The `FieldGuard` façade owning all long-lived state.
//! * `config` / `policy`: YAML configuration and signed organization policies.
//! * `headless`: One-shot helpers.
//!
//! ## Usage Example
//!
//! ```rust
//! use fieldguard_core::{FieldDescriptor, FieldGuard, GuardConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let guard = FieldGuard::new(GuardConfig::default())?;
//!     let text = "card 4242 4242 4242 4242";
//!
//!     let spans = guard.scan(text, &FieldDescriptor::default());
//!     assert_eq!(spans.len(), 1);
//!     assert_eq!(guard.mask_in_text(text, &spans[0]), "card •••• •••• •••• 4242");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library errors are `FieldGuardError`; file loading returns `anyhow::Result`
//! with context. Scanning itself never fails: a matcher that misbehaves
//! contributes no spans.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod category;
pub mod config;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod field_context;
pub mod gate;
pub mod guard;
pub mod headless;
pub mod masking;
pub mod policy;
pub mod registry;
pub mod resolution;
pub mod span;
pub mod telemetry;
pub mod validators;

/// Re-exports the category model.
pub use category::{BuiltInCategory, Category, GENERIC_CUSTOM_LABEL};

/// Re-exports configuration types.
pub use config::{
    load_custom_patterns, CacheConfig, CustomPattern, GuardConfig, QueueConfig, RemoteConfig,
    ScanGateConfig, TelemetryConfig, MAX_PATTERN_LENGTH,
};

/// Re-exports the custom error type.
pub use errors::FieldGuardError;

/// Re-exports the detection engine trait and its regex implementation.
pub use engine::{DetectionEngine, RawDetections};
pub use engines::regex_engine::RegexEngine;

pub use field_context::{
    coarse_kind, expected_categories, filter_expected, CoarseKind, DeclaredKind, FieldDescriptor,
};

pub use gate::{
    ClassificationRequest, ClassificationResponse, HttpClassifier, RemoteClassifier,
    RemoteDetection, RemoteError, ResultCache, RiskLevel, ScanGate, ScanTicket,
};

pub use guard::{FieldGuard, FieldSession, RemoteOutcome, ResultSource};

pub use headless::{headless_mask, headless_scan, HeadlessScan};

pub use masking::{is_redaction_marker, mask, mask_all_in_text, mask_in_text, REDACTION_GLYPH};

pub use policy::{load_policy, sign_policy, OrgPolicy};

pub use registry::{PatternRegistry, RegistrationError, RegistrationReport};

pub use resolution::merge;

pub use span::{redact_sensitive, Offsets, Span, SpanOrigin};

pub use telemetry::{
    DetectionEventQueue, EventAction, FlushReport, HttpTelemetrySink, QueueItem, TelemetrySink,
};
