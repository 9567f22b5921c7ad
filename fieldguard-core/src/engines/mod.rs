// fieldguard-core/src/engines/mod.rs
//! Concrete `DetectionEngine` implementations.
//!
//! Each engine lives in its own file and is declared here.

pub mod regex_engine;
