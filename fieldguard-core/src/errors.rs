//! errors.rs - Custom error types for the fieldguard-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All library-level error types in `fieldguard-core`.
///
/// `#[non_exhaustive]` lets new variants land without breaking downstream
/// matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FieldGuardError {
    #[error("Failed to compile pattern '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("Pattern '{0}': length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Pattern '{0}' is empty")]
    EmptyPattern(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Policy error: {0}")]
    Policy(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}
