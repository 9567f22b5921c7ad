//! Conflict resolution between built-in and custom findings, and category
//! normalization for custom labels.
//!
//! `merge` is deterministic and idempotent: feeding its output back in as the
//! built-in list with no custom spans returns the same list.
//!
//! License: MIT OR APACHE 2.0

pub mod shapes;

use std::collections::HashSet;

use log::debug;

use crate::category::{Category, GENERIC_CUSTOM_LABEL};
use crate::span::{Offsets, Span};

/// Declared labels that carry no meaning of their own.
const GENERIC_LABELS: [&str; 3] = ["", GENERIC_CUSTOM_LABEL, "regex"];

pub fn is_generic_label(label: &str) -> bool {
    let label = label.trim();
    GENERIC_LABELS.iter().any(|generic| generic.eq_ignore_ascii_case(label))
}

/// Resolves the category a custom span should report.
///
/// A value with an unmistakable built-in shape takes that category. Otherwise
/// generic labels collapse onto `custom` and any other label is kept verbatim,
/// even when it reads like a built-in name.
pub fn normalize_custom_category(span: &Span) -> Category {
    if let Some(builtin) = shapes::recognize(&span.value) {
        return builtin.into();
    }
    match &span.category {
        Category::Custom(label) if is_generic_label(label) => Category::generic_custom(),
        Category::Custom(label) => Category::Custom(label.clone()),
        builtin @ Category::BuiltIn(_) => builtin.clone(),
    }
}

/// Merges built-in and custom spans into one deduplicated list ordered by
/// position.
pub fn merge(built_in: Vec<Span>, custom: Vec<Span>) -> Vec<Span> {
    let built_in_count = built_in.len();
    let custom_count = custom.len();

    let custom: Vec<Span> = custom
        .into_iter()
        .filter(|c| {
            !built_in
                .iter()
                .any(|b| b.value == c.value && b.offsets == c.offsets)
        })
        .map(|mut c| {
            c.category = normalize_custom_category(&c);
            c
        })
        .collect();

    let built_in_keys: HashSet<(Category, String)> = built_in
        .iter()
        .map(|b| (b.category.clone(), b.value.clone()))
        .collect();

    let mut seen: HashSet<(String, Option<Offsets>)> = HashSet::new();
    let mut merged: Vec<Span> = Vec::with_capacity(built_in.len() + custom.len());

    for span in built_in {
        if seen.insert((span.value.clone(), span.offsets)) {
            merged.push(span);
        }
    }
    for span in custom {
        if built_in_keys.contains(&(span.category.clone(), span.value.clone())) {
            continue;
        }
        if seen.insert((span.value.clone(), span.offsets)) {
            merged.push(span);
        }
    }

    sort_by_position(&mut merged);
    debug!(
        "Merged {} built-in and {} custom spans into {}.",
        built_in_count,
        custom_count,
        merged.len()
    );
    merged
}

/// Drops remote spans whose value a local span already reports.
pub fn drop_local_duplicates(local: &[Span], remote: Vec<Span>) -> Vec<Span> {
    let local_values: HashSet<&str> = local.iter().map(|s| s.value.as_str()).collect();
    remote
        .into_iter()
        .filter(|span| !local_values.contains(span.value.as_str()))
        .collect()
}

/// Stable sort by `(start, end)`; unlocated spans go last.
pub fn sort_by_position(spans: &mut [Span]) {
    spans.sort_by_key(|span| match span.offsets {
        Some(offsets) => (0u8, offsets.start, offsets.end),
        None => (1u8, 0, 0),
    });
}
