// fieldguard/src/commands/mod.rs
//! Command implementations and the input/engine setup they share.

pub mod mask;
pub mod patterns;
pub mod policy;
pub mod scan;

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Read};

use fieldguard_core::config::load_custom_patterns;
use fieldguard_core::policy::load_policy;
use fieldguard_core::{DeclaredKind, FieldDescriptor, FieldGuard, GuardConfig, RegistrationReport};

use crate::cli::{FieldArgs, InputArgs};

/// Reads the text to process from `--text`, `--input-file` or stdin, with one
/// trailing line break removed.
pub fn read_input(args: &InputArgs) -> Result<String> {
    let mut text = if let Some(text) = &args.text {
        text.clone()
    } else if let Some(path) = &args.input_file {
        info!("Reading input from file: {}", path.display());
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail!("No input given. Pass --text, --input-file, or pipe text on stdin.");
        }
        info!("Reading input from stdin...");
        let mut buffer = String::new();
        stdin
            .lock()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    };

    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

pub fn field_descriptor(args: &FieldArgs) -> FieldDescriptor {
    FieldDescriptor {
        kind: args
            .kind
            .as_deref()
            .map(DeclaredKind::from_input_type)
            .unwrap_or_default(),
        name: args.name.clone(),
        placeholder: args.placeholder.clone(),
        label: args.label.clone(),
        title: args.title.clone(),
    }
}

/// Builds a guard from the config, pattern and policy files named on the
/// command line. Policy patterns come first, then the pattern file's.
pub fn build_guard(args: &InputArgs, with_adapters: bool) -> Result<(FieldGuard, RegistrationReport)> {
    let config = match &args.config {
        Some(path) => GuardConfig::load_from_file(path)?,
        None => GuardConfig::default(),
    };

    let mut guard = FieldGuard::new(config)?;
    if with_adapters {
        guard = guard.with_http_adapters()?;
    }

    let mut patterns = match &args.patterns {
        Some(path) => load_custom_patterns(path)?,
        None => Vec::new(),
    };

    let report = match &args.policy {
        Some(path) => {
            let mut policy = load_policy(path)
                .with_context(|| format!("Failed to load policy: {}", path.display()))?;
            policy.custom_patterns.append(&mut patterns);
            guard.apply_policy(&policy)
        }
        None => guard.register_custom_patterns(&patterns),
    };
    debug!(
        "Engine ready: {} custom patterns registered, {} rejected.",
        report.registered.len(),
        report.errors.len()
    );
    Ok((guard, report))
}
