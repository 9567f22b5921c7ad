//! Field-context classification.
//!
//! Uses the host's field metadata (declared input kind plus the visible name,
//! placeholder, label and title text) to decide which categories a field is
//! *expected* to contain. Findings of an expected category are not warnings:
//! an email typed into an email field is the field doing its job.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeSet;

use fieldguard_heuristics::keywords::KeywordSet;
use log::{debug, error};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::category::{BuiltInCategory, Category};
use crate::span::Span;

/// The input kind a host declares for a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    #[default]
    FreeText,
    Email,
    Tel,
    Password,
    Numeric,
    Other(String),
}

impl DeclaredKind {
    /// Maps an HTML-style input type string onto a declared kind.
    pub fn from_input_type(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "textarea" | "search" | "free_text" => DeclaredKind::FreeText,
            "email" => DeclaredKind::Email,
            "tel" | "phone" => DeclaredKind::Tel,
            "password" => DeclaredKind::Password,
            "number" | "numeric" => DeclaredKind::Numeric,
            other => DeclaredKind::Other(other.to_string()),
        }
    }
}

/// A read-only snapshot of a field's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    pub kind: DeclaredKind,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub label: Option<String>,
    /// Title or accessibility text.
    pub title: Option<String>,
}

impl FieldDescriptor {
    /// Lowercased concatenation of every text attribute, space separated.
    /// camelCase boundaries become spaces, so `customerSsn` reads `customer ssn`.
    fn haystack(&self) -> String {
        [&self.name, &self.placeholder, &self.label, &self.title]
            .into_iter()
            .flatten()
            .map(|s| split_camel_case(s).to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn split_camel_case(text: &str) -> String {
    let mut split = String::with_capacity(text.len() + 4);
    let mut previous_lower = false;
    for c in text.chars() {
        if previous_lower && c.is_uppercase() {
            split.push(' ');
        }
        previous_lower = c.is_lowercase();
        split.push(c);
    }
    split
}

/// Advisory coarse classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseKind {
    Name,
    Email,
    Address,
    Phone,
    Freeform,
    Unknown,
}

// Keyword groups. Values index `GROUP_CATEGORIES` and `COARSE_PRECEDENCE`.
const EMAIL: u32 = 0;
const PHONE: u32 = 1;
const PASSWORD: u32 = 2;
const API_KEY: u32 = 3;
const NATIONAL_ID: u32 = 4;
const CARD: u32 = 5;
const EXPIRY: u32 = 6;
const BIRTH_DATE: u32 = 7;
const BANK: u32 = 8;
const PASSPORT: u32 = 9;
const ADDRESS: u32 = 10;
const NAME: u32 = 11;
const FREEFORM: u32 = 12;

const KEYWORDS: &[(&str, u32)] = &[
    ("email", EMAIL),
    ("e-mail", EMAIL),
    ("mail", EMAIL),
    ("phone", PHONE),
    ("mobile", PHONE),
    ("tel", PHONE),
    ("telno", PHONE),
    ("cell", PHONE),
    ("password", PASSWORD),
    ("passwd", PASSWORD),
    ("pwd", PASSWORD),
    ("passcode", PASSWORD),
    ("api key", API_KEY),
    ("api_key", API_KEY),
    ("apikey", API_KEY),
    ("token", API_KEY),
    ("secret", API_KEY),
    ("access key", API_KEY),
    ("ssn", NATIONAL_ID),
    ("customerssn", NATIONAL_ID),
    ("userssn", NATIONAL_ID),
    ("social security", NATIONAL_ID),
    ("national id", NATIONAL_ID),
    ("national_id", NATIONAL_ID),
    ("tax id", NATIONAL_ID),
    ("nino", NATIONAL_ID),
    ("card", CARD),
    ("cc-number", CARD),
    ("pan", CARD),
    ("expiry", EXPIRY),
    ("expiration", EXPIRY),
    ("exp", EXPIRY),
    ("mm/yy", EXPIRY),
    ("birth", BIRTH_DATE),
    ("dob", BIRTH_DATE),
    ("bank", BANK),
    ("iban", BANK),
    ("routing", BANK),
    ("account number", BANK),
    ("passport", PASSPORT),
    ("address", ADDRESS),
    ("street", ADDRESS),
    ("city", ADDRESS),
    ("zip", ADDRESS),
    ("zipcode", ADDRESS),
    ("postcode", ADDRESS),
    ("postal", ADDRESS),
    ("name", NAME),
    ("first", NAME),
    ("last", NAME),
    ("surname", NAME),
    ("comment", FREEFORM),
    ("message", FREEFORM),
    ("note", FREEFORM),
    ("description", FREEFORM),
    ("feedback", FREEFORM),
    ("bio", FREEFORM),
];

const GROUP_CATEGORIES: &[(u32, &[BuiltInCategory])] = &[
    (EMAIL, &[BuiltInCategory::Email]),
    (PHONE, &[BuiltInCategory::Phone]),
    (PASSWORD, &[BuiltInCategory::GenericApiKey]),
    (API_KEY, &[BuiltInCategory::GenericApiKey, BuiltInCategory::CloudAccessKey]),
    (NATIONAL_ID, &[BuiltInCategory::NationalId]),
    (CARD, &[BuiltInCategory::PaymentCard, BuiltInCategory::CardExpiry]),
    (EXPIRY, &[BuiltInCategory::CardExpiry]),
    (BIRTH_DATE, &[BuiltInCategory::DateOfBirth]),
    (BANK, &[BuiltInCategory::Iban, BuiltInCategory::AccountNumber]),
    (PASSPORT, &[BuiltInCategory::Passport]),
];

const COARSE_PRECEDENCE: &[(u32, CoarseKind)] = &[
    (EMAIL, CoarseKind::Email),
    (PHONE, CoarseKind::Phone),
    (ADDRESS, CoarseKind::Address),
    (NAME, CoarseKind::Name),
    (FREEFORM, CoarseKind::Freeform),
];

static FIELD_KEYWORDS: Lazy<Option<KeywordSet>> = Lazy::new(|| match KeywordSet::new(KEYWORDS) {
    Ok(set) => Some(set),
    Err(e) => {
        error!("Field keyword automaton failed to build: {}", e);
        None
    }
});

fn matched_groups(field: &FieldDescriptor) -> BTreeSet<u32> {
    let haystack = field.haystack();
    if haystack.is_empty() {
        return BTreeSet::new();
    }
    match &*FIELD_KEYWORDS {
        Some(set) => set.matched_groups(haystack.as_bytes()),
        None => BTreeSet::new(),
    }
}

/// Categories a field is expected to contain.
pub fn expected_categories(field: &FieldDescriptor) -> BTreeSet<Category> {
    let mut expected: BTreeSet<Category> = BTreeSet::new();

    match field.kind {
        DeclaredKind::Email => {
            expected.insert(BuiltInCategory::Email.into());
        }
        DeclaredKind::Tel => {
            expected.insert(BuiltInCategory::Phone.into());
        }
        DeclaredKind::Password => {
            expected.insert(BuiltInCategory::GenericApiKey.into());
        }
        _ => {}
    }

    let groups = matched_groups(field);
    for (group, categories) in GROUP_CATEGORIES {
        if groups.contains(group) {
            expected.extend(categories.iter().map(|c| Category::from(*c)));
        }
    }

    debug!(
        "Expected categories for field {:?}: {:?}",
        field.name.as_deref().unwrap_or("-"),
        expected.iter().map(Category::as_str).collect::<Vec<_>>()
    );
    expected
}

/// Coarse kind of a field: declared kind first, then keyword precedence.
pub fn coarse_kind(field: &FieldDescriptor) -> CoarseKind {
    match field.kind {
        DeclaredKind::Email => return CoarseKind::Email,
        DeclaredKind::Tel => return CoarseKind::Phone,
        _ => {}
    }
    let groups = matched_groups(field);
    COARSE_PRECEDENCE
        .iter()
        .find(|(group, _)| groups.contains(group))
        .map(|(_, kind)| *kind)
        .unwrap_or(CoarseKind::Unknown)
}

/// Removes exactly the spans whose category is expected.
pub fn filter_expected(spans: Vec<Span>, expected: &BTreeSet<Category>) -> Vec<Span> {
    if expected.is_empty() {
        return spans;
    }
    spans
        .into_iter()
        .filter(|span| !expected.contains(&span.category))
        .collect()
}
