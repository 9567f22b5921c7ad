// fieldguard/src/commands/mask.rs
//! The `mask` command: print the input with every finding masked.

use anyhow::{bail, Result};
use log::{info, warn};

use fieldguard_core::mask_all_in_text;

use crate::cli::MaskCommand;
use crate::commands::{build_guard, read_input};

pub fn run_mask(cmd: &MaskCommand) -> Result<String> {
    info!("Starting mask operation.");
    let text = read_input(&cmd.input)?;
    let (guard, registration) = build_guard(&cmd.input, false)?;

    if !registration.is_clean() {
        for error in &registration.errors {
            warn!("Pattern '{}' was not registered: {}", error.id, error.reason);
        }
        if cmd.strict {
            bail!(
                "{} custom pattern(s) failed to register; refusing to mask with a partial set.",
                registration.errors.len()
            );
        }
    }

    let spans = guard.detect(&text);
    info!("Masking {} finding(s).", spans.len());
    Ok(mask_all_in_text(&text, &spans))
}
