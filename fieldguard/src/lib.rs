// fieldguard/src/lib.rs
//! # FieldGuard CLI
//!
//! This crate provides the command-line harness for the FieldGuard engine. It
//! plays the host's role: it reads text, builds field metadata from flags,
//! registers custom patterns and policies, and prints what the engine reports.

pub mod cli;
pub mod commands;
pub mod logger;
