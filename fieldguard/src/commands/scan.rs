// fieldguard/src/commands/scan.rs
//! The `scan` command: list findings for one piece of text.

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use log::{debug, info};
use serde::Serialize;
use std::io::{self, Write};

use fieldguard_core::{
    coarse_kind, CoarseKind, FieldGuard, RegistrationReport, RemoteOutcome, Span,
};

use crate::cli::ScanCommand;
use crate::commands::{build_guard, field_descriptor, read_input};

/// Field id the harness uses for its single simulated field.
const CLI_FIELD_ID: &str = "cli";

#[derive(Debug, Serialize)]
struct ScanOutput<'a> {
    coarse_kind: CoarseKind,
    spans: &'a [Span],
    registration: &'a RegistrationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    masked: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<&'a RemoteOutcome>,
}

pub async fn run_scan(cmd: &ScanCommand) -> Result<()> {
    info!("Starting scan operation.");
    let text = read_input(&cmd.input)?;
    let (guard, registration) = build_guard(&cmd.input, cmd.remote)?;
    let field = field_descriptor(&cmd.field);

    let spans = guard.scan(&text, &field);
    debug!("Local scan reported {} spans.", spans.len());

    let masked = cmd.mask.then(|| guard.apply_mask_all(&text, &spans, &field));

    let remote = if cmd.remote {
        let ticket = guard.begin_scan(CLI_FIELD_ID);
        Some(
            guard
                .classify_remote(CLI_FIELD_ID, &text, &field, &spans, ticket)
                .await,
        )
    } else {
        None
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cmd.json {
        let output = ScanOutput {
            coarse_kind: coarse_kind(&field),
            spans: &spans,
            registration: &registration,
            masked: masked.as_deref(),
            remote: remote.as_ref(),
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize scan output")?;
        writeln!(out, "{}", json)?;
    } else {
        print_findings(&mut out, &guard, &spans)?;
        if let Some(masked) = &masked {
            writeln!(out, "\n{}", masked)?;
        }
        if let Some(remote) = &remote {
            print_remote(&mut out, &guard, remote)?;
        }
    }

    let flushed = guard.flush_events().await;
    debug!(
        "Event flush: {} delivered, {} dropped.",
        flushed.delivered, flushed.dropped
    );
    info!("Scan operation completed.");
    Ok(())
}

fn findings_table(guard: &FieldGuard, spans: &[Span]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Category", "Preview", "Offsets", "Confidence", "Origin", "Source"]);
    for span in spans {
        let offsets = match span.offsets {
            Some(o) => format!("{}..{}", o.start, o.end),
            None => "-".to_string(),
        };
        table.add_row(vec![
            span.category.to_string(),
            guard.mask(span),
            offsets,
            span.confidence.to_string(),
            format!("{:?}", span.origin).to_lowercase(),
            span.source.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}

fn print_findings<W: Write>(out: &mut W, guard: &FieldGuard, spans: &[Span]) -> Result<()> {
    if spans.is_empty() {
        writeln!(out, "No sensitive data found.")?;
        return Ok(());
    }
    writeln!(out, "{}", findings_table(guard, spans))?;
    writeln!(out, "{} finding(s).", spans.len())?;
    Ok(())
}

fn print_remote<W: Write>(out: &mut W, guard: &FieldGuard, outcome: &RemoteOutcome) -> Result<()> {
    match outcome {
        RemoteOutcome::Detected { spans, source } => {
            writeln!(out, "\nRemote classifier ({:?}):", source)?;
            print_findings(out, guard, spans)
        }
        RemoteOutcome::Skipped => Ok(writeln!(out, "\nRemote classifier: skipped.")?),
        RemoteOutcome::Unavailable => Ok(writeln!(out, "\nRemote classifier: unavailable.")?),
        RemoteOutcome::Notice { message } => Ok(writeln!(out, "\nRemote classifier: {}", message)?),
        RemoteOutcome::Cancelled | RemoteOutcome::Superseded => Ok(()),
    }
}
