// fieldguard/src/commands/patterns.rs
//! The `patterns check` command.

use anyhow::{bail, Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use log::info;
use std::io::Write;
use std::path::Path;

use fieldguard_core::config::load_custom_patterns;
use fieldguard_core::{GuardConfig, PatternRegistry, RegistrationReport};

/// Compiles every pattern in `path` and writes the registration report.
/// Fails when any pattern was rejected.
pub fn run_check<W: Write>(path: &Path, json: bool, out: &mut W) -> Result<()> {
    let patterns = load_custom_patterns(path)?;
    info!("Checking {} pattern(s) from {}", patterns.len(), path.display());
    let confidence = GuardConfig::default().custom_confidence;
    let (_, report) = PatternRegistry::new().with_custom_patterns(&patterns, confidence);

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("Failed to serialize registration report")?;
        writeln!(out, "{}", rendered)?;
    } else {
        write_report(&report, out)?;
    }

    if !report.is_clean() {
        bail!("{} pattern(s) failed to compile.", report.errors.len());
    }
    Ok(())
}

fn write_report<W: Write>(report: &RegistrationReport, out: &mut W) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Pattern", "Status", "Detail"]);
    for id in &report.registered {
        table.add_row(vec![id.as_str(), "registered", ""]);
    }
    for id in &report.skipped {
        table.add_row(vec![id.as_str(), "inactive", ""]);
    }
    for error in &report.errors {
        table.add_row(vec![error.id.as_str(), "error", error.reason.as_str()]);
    }
    writeln!(out, "{}", table)?;
    writeln!(
        out,
        "Registered: {}, inactive: {}, errors: {}",
        report.registered.len(),
        report.skipped.len(),
        report.errors.len()
    )?;
    Ok(())
}
