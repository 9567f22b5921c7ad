//! Configuration management for `fieldguard-core`.
//!
//! This module defines the tunables for the scan gate, result cache, event
//! queue and remote classifier, plus the host-supplied custom pattern
//! definitions. Everything deserializes from YAML and every field has a
//! default, so a partial file only overrides what it names.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::category::BuiltInCategory;
use crate::errors::FieldGuardError;

/// Maximum allowed length for a custom regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A host-supplied, organization-defined pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomPattern {
    /// Stable identifier assigned by the host.
    pub id: String,
    /// Display name shown alongside findings.
    pub name: String,
    /// Declared category label. `None`, `"custom"` and `"regex"` are generic.
    pub category: Option<String>,
    /// The regex pattern string.
    pub pattern: String,
    /// Human-readable description of what the pattern targets.
    pub description: Option<String>,
    /// Inactive patterns are listed in the registration report but not compiled.
    pub active: bool,
    /// Confidence reported for matches; falls back to `GuardConfig::custom_confidence`.
    pub confidence: Option<u8>,
    /// Compile the pattern case-insensitively.
    pub case_insensitive: bool,
}

impl Default for CustomPattern {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            category: None,
            pattern: String::new(),
            description: None,
            active: true,
            confidence: None,
            case_insensitive: false,
        }
    }
}

impl CustomPattern {
    /// The name used in reports and logs: display name, else id.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Thresholds deciding whether text is worth a remote classification call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanGateConfig {
    /// Texts shorter than this many characters are not sent.
    pub min_length: usize,
    /// Texts longer than this many characters are not sent.
    pub max_length: usize,
    /// Long texts need at least this many distinct characters.
    pub min_distinct_chars: usize,
    /// The distinct-character check applies above this many characters.
    pub distinct_check_after: usize,
    /// An edit touching at least this many characters is significant.
    pub min_changed_chars: usize,
    /// An edit touching at least this fraction of the longer text is significant.
    pub min_changed_ratio: f64,
}

impl Default for ScanGateConfig {
    fn default() -> Self {
        Self {
            min_length: 5,
            max_length: 5_000,
            min_distinct_chars: 5,
            distinct_check_after: 20,
            min_changed_chars: 5,
            min_changed_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            batch_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub timeout_ms: u64,
    /// Endpoint for the bundled HTTP classifier adapter.
    pub endpoint: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Endpoint for the bundled HTTP telemetry sink.
    pub endpoint: Option<String>,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    pub scan_gate: ScanGateConfig,
    pub cache: CacheConfig,
    pub queue: QueueConfig,
    pub remote: RemoteConfig,
    pub telemetry: TelemetryConfig,
    /// Interval of the background cache sweep and queue flush.
    pub sweep_interval_secs: u64,
    /// Texts longer than this many bytes are not run through matchers at all.
    pub max_scan_length: usize,
    /// Default confidence for custom-pattern matches.
    pub custom_confidence: u8,
    /// Built-in categories whose matchers are skipped.
    pub disabled_builtins: Vec<BuiltInCategory>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            scan_gate: ScanGateConfig::default(),
            cache: CacheConfig::default(),
            queue: QueueConfig::default(),
            remote: RemoteConfig::default(),
            telemetry: TelemetryConfig::default(),
            sweep_interval_secs: 60,
            max_scan_length: 100_000,
            custom_confidence: 80,
            disabled_builtins: Vec::new(),
        }
    }
}

impl GuardConfig {
    /// Loads configuration from a YAML file and validates it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading engine configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: GuardConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Rejects settings that would make the gate, cache or queue unusable.
    pub fn validate(&self) -> Result<(), FieldGuardError> {
        let mut errors = Vec::new();

        if self.scan_gate.min_length > self.scan_gate.max_length {
            errors.push(format!(
                "scan_gate.min_length ({}) exceeds scan_gate.max_length ({})",
                self.scan_gate.min_length, self.scan_gate.max_length
            ));
        }
        if !(0.0..=1.0).contains(&self.scan_gate.min_changed_ratio) {
            errors.push("scan_gate.min_changed_ratio must be within 0.0..=1.0".to_string());
        }
        if self.cache.max_entries == 0 {
            errors.push("cache.max_entries must be greater than 0".to_string());
        }
        if self.queue.capacity == 0 {
            errors.push("queue.capacity must be greater than 0".to_string());
        }
        if self.queue.batch_size == 0 {
            errors.push("queue.batch_size must be greater than 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            errors.push("sweep_interval_secs must be greater than 0".to_string());
        }
        if self.custom_confidence > 100 {
            errors.push("custom_confidence must be within 0..=100".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldGuardError::InvalidConfig(errors.join("; ")))
        }
    }
}

/// Loads a YAML list of custom patterns, as a host would persist them.
pub fn load_custom_patterns<P: AsRef<Path>>(path: P) -> Result<Vec<CustomPattern>> {
    let path = path.as_ref();
    info!("Loading custom patterns from: {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pattern file {}", path.display()))?;
    let patterns: Vec<CustomPattern> = serde_yml::from_str(&text)
        .with_context(|| format!("Failed to parse pattern file {}", path.display()))?;
    debug!("Loaded {} custom patterns.", patterns.len());
    Ok(patterns)
}
