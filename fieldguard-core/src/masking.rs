//! Format-preserving masking of detected spans.
//!
//! License: MIT OR APACHE 2.0

use std::ops::Range;

use log::debug;

use crate::category::{BuiltInCategory, Category};
use crate::span::{loggable, Span};

/// The glyph substituted for hidden characters.
pub const REDACTION_GLYPH: char = '•';

/// Replacement for categories without a format-preserving mask.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// Number of glyphs that stand in for an email local part after its first
/// character. Fixed, so the local part's length is not revealed.
pub const EMAIL_MASK_RUN: usize = 7;

/// Trailing digits left visible on cards, national IDs and phone numbers.
pub const VISIBLE_SUFFIX_DIGITS: usize = 4;

/// True when a value already shows signs of having been masked.
pub fn is_redaction_marker(value: &str) -> bool {
    value.contains(REDACTION_GLYPH) || value.contains("[REDACTED") || value.contains("***")
}

/// Returns the masked form of a span's value.
pub fn mask(span: &Span) -> String {
    match span.category {
        Category::BuiltIn(BuiltInCategory::PaymentCard) => mask_card(&span.value),
        Category::BuiltIn(BuiltInCategory::Email) => mask_email(&span.value),
        Category::BuiltIn(BuiltInCategory::NationalId | BuiltInCategory::Phone) => {
            mask_digits_keep_suffix(&span.value)
        }
        _ => REDACTED_PLACEHOLDER.to_string(),
    }
}

fn glyphs(count: usize) -> String {
    std::iter::repeat(REDACTION_GLYPH).take(count).collect()
}

fn mask_card(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).collect();
    let hidden = digits.len().saturating_sub(VISIBLE_SUFFIX_DIGITS);
    let masked: Vec<char> = digits
        .iter()
        .enumerate()
        .map(|(idx, digit)| if idx < hidden { REDACTION_GLYPH } else { *digit })
        .collect();

    let separator = if value.contains(' ') {
        Some(' ')
    } else if value.contains('-') {
        Some('-')
    } else {
        None
    };

    match separator {
        Some(separator) => masked
            .chunks(4)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(&separator.to_string()),
        None => masked.into_iter().collect(),
    }
}

fn mask_email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}{}@{}", first, glyphs(EMAIL_MASK_RUN), domain)
        }
        None => REDACTED_PLACEHOLDER.to_string(),
    }
}

fn mask_digits_keep_suffix(value: &str) -> String {
    let total = value.chars().filter(char::is_ascii_digit).count();
    let hidden = total.saturating_sub(VISIBLE_SUFFIX_DIGITS);
    let mut seen = 0;
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen <= hidden {
                    return REDACTION_GLYPH;
                }
            }
            c
        })
        .collect()
}

/// Replaces the span's value inside `text` with its mask.
///
/// The span's offsets are used when they still address the value; otherwise
/// the first verbatim occurrence is replaced. When the value is gone (the user
/// edited it away) the text comes back unchanged.
pub fn mask_in_text(text: &str, span: &Span) -> String {
    match locate(text, span) {
        Some(range) => {
            let mut masked = String::with_capacity(text.len());
            masked.push_str(&text[..range.start]);
            masked.push_str(&mask(span));
            masked.push_str(&text[range.end..]);
            masked
        }
        None => {
            debug!(
                "Value {} no longer present; leaving text unchanged.",
                loggable(&span.value)
            );
            text.to_string()
        }
    }
}

/// Where `span` sits in `text`: its offsets when they still hold, otherwise
/// the first occurrence of its value.
pub fn locate(text: &str, span: &Span) -> Option<Range<usize>> {
    match span.offsets {
        Some(offsets) if span.matches_text_at_offsets(text) => Some(offsets.start..offsets.end),
        _ => text
            .find(&span.value)
            .map(|start| start..start + span.value.len()),
    }
}

/// Masks every span in `text` in one pass over the original text.
///
/// Overlapping spans form one region. A region covered end to end by a single
/// span gets that span's mask; any other region becomes the placeholder.
pub fn mask_all_in_text(text: &str, spans: &[Span]) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in masked_regions(text, spans) {
        masked.push_str(&text[cursor..range.start]);
        masked.push_str(&replacement);
        cursor = range.end;
    }
    masked.push_str(&text[cursor..]);
    masked
}

fn masked_regions(text: &str, spans: &[Span]) -> Vec<(Range<usize>, String)> {
    let mut located: Vec<(Range<usize>, &Span)> = spans
        .iter()
        .filter_map(|span| locate(text, span).map(|range| (range, span)))
        .collect();
    located.sort_by(|(a, _), (b, _)| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut regions = Vec::new();
    let mut members: Vec<(Range<usize>, &Span)> = Vec::new();
    let mut region = 0..0;
    for (range, span) in located {
        if !members.is_empty() && range.start >= region.end {
            regions.push(render_region(region.clone(), &members));
            members.clear();
        }
        if members.is_empty() {
            region = range.clone();
        } else {
            region.end = region.end.max(range.end);
        }
        members.push((range, span));
    }
    if !members.is_empty() {
        regions.push(render_region(region, &members));
    }
    regions
}

fn render_region(region: Range<usize>, members: &[(Range<usize>, &Span)]) -> (Range<usize>, String) {
    let replacement = match members.iter().find(|(range, _)| *range == region) {
        Some((_, span)) => mask(span),
        None => REDACTED_PLACEHOLDER.to_string(),
    };
    (region, replacement)
}
