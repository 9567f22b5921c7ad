// File: fieldguard-core/src/validators.rs
//! Programmatic validation functions for specific sensitive data types.
//!
//! These checks run after a pattern has matched and reject values that have the
//! right shape but cannot be real (bad checksums, impossible dates, reserved
//! number ranges). They are plain `fn(&str) -> bool` so a matcher can carry one
//! as a function pointer.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::ops::Range;

use chrono::{Datelike, NaiveDate, Utc};
use fieldguard_heuristics::charset::CharClassProfile;
use fieldguard_heuristics::entropy::looks_random;
use once_cell::sync::Lazy;

/// Payment-card digit counts accepted by the card validator.
pub const CARD_DIGITS_MIN: usize = 13;
pub const CARD_DIGITS_MAX: usize = 19;

/// Minimum length and entropy for a keyword-anchored secret value.
pub const SECRET_MIN_LEN: usize = 8;
pub const SECRET_MIN_BITS: f64 = 2.5;

/// Validates a US-style national ID triplet against SSA allocation rules.
///
/// Accepts `XXX-XX-XXXX` or `XXX XX XXXX`. Rejects area 000, 666 and 900-999,
/// group 00 and serial 0000.
pub fn is_valid_national_id(value: &str) -> bool {
    let mut parts = value.split(['-', ' ']);

    let (Some(area), Some(group), Some(serial), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if area.len() != 3 || group.len() != 2 || serial.len() != 4 {
        return false;
    }

    let Ok(area_num) = area.parse::<u16>() else { return false; };
    let Ok(group_num) = group.parse::<u8>() else { return false; };
    let Ok(serial_num) = serial.parse::<u16>() else { return false; };

    let invalid_area = area_num == 0 || area_num == 666 || area_num >= 900;
    !(invalid_area || group_num == 0 || serial_num == 0)
}

static INVALID_NINO_PREFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["BG", "GB", "KN", "NK", "NT", "TN", "ZZ"].into_iter().collect()
});

static INVALID_NINO_PREFIX_CHARS: Lazy<HashSet<char>> =
    Lazy::new(|| ['D', 'F', 'I', 'Q', 'U', 'V'].into_iter().collect());

/// Validates a UK National Insurance Number (`AA 12 34 56 C`, spaces optional).
pub fn is_valid_uk_nino(value: &str) -> bool {
    let normalized: Cow<str> = if value.chars().any(|c| c.is_ascii_lowercase()) {
        Cow::Owned(value.to_ascii_uppercase())
    } else {
        Cow::Borrowed(value)
    };
    let compact: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.len() != 9 || !compact.is_ascii() {
        return false;
    }

    let bytes = compact.as_bytes();
    let (first, second) = (bytes[0] as char, bytes[1] as char);
    if !first.is_ascii_alphabetic() || !second.is_ascii_alphabetic() {
        return false;
    }
    if INVALID_NINO_PREFIXES.contains(&compact[0..2])
        || INVALID_NINO_PREFIX_CHARS.contains(&first)
        || INVALID_NINO_PREFIX_CHARS.contains(&second)
        || second == 'O'
    {
        return false;
    }
    if !compact[2..8].bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(bytes[8], b'A'..=b'D')
}

/// Validates a digit string with the Luhn (mod 10) checksum.
///
/// Digits are summed right to left; every second digit is doubled and 9 is
/// subtracted when the doubled value exceeds 9. Any non-digit fails.
pub fn is_valid_luhn(digits: &str) -> bool {
    let mut sum = 0;
    let mut double = false;

    for c in digits.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }

    sum % 10 == 0
}

/// Validates a payment-card number: spaces and hyphens are stripped, the rest
/// must be 13 to 19 digits passing the Luhn checksum.
pub fn is_valid_payment_card(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !(CARD_DIGITS_MIN..=CARD_DIGITS_MAX).contains(&digits.len()) {
        return false;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    is_valid_luhn(&digits)
}

/// Card-length windows inside a run of digit groups, aligned to group
/// boundaries. Longest first, then leftmost.
pub fn card_windows(value: &str) -> Vec<Range<usize>> {
    let mut groups: Vec<Range<usize>> = Vec::new();
    let mut current: Option<usize> = None;
    for (idx, byte) in value.bytes().enumerate() {
        match (byte.is_ascii_digit(), current) {
            (true, None) => current = Some(idx),
            (false, Some(start)) => {
                groups.push(start..idx);
                current = None;
            }
            _ => {}
        }
    }
    if let Some(start) = current {
        groups.push(start..value.len());
    }

    let mut windows: Vec<(usize, Range<usize>)> = Vec::new();
    for (first, head) in groups.iter().enumerate() {
        let mut digits = 0;
        for tail in &groups[first..] {
            digits += tail.len();
            if digits > CARD_DIGITS_MAX {
                break;
            }
            if digits >= CARD_DIGITS_MIN {
                windows.push((digits, head.start..tail.end));
            }
        }
    }
    windows.sort_by(|(a_digits, a), (b_digits, b)| {
        b_digits.cmp(a_digits).then(a.start.cmp(&b.start))
    });
    windows.into_iter().map(|(_, range)| range).collect()
}

/// Validates an IBAN with the ISO 13616 mod-97 check.
pub fn is_valid_iban(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !(15..=34).contains(&compact.len()) || !compact.is_ascii() {
        return false;
    }
    let bytes = compact.as_bytes();
    if !bytes[0].is_ascii_alphabetic()
        || !bytes[1].is_ascii_alphabetic()
        || !bytes[2].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
    {
        return false;
    }

    let rearranged = compact[4..].bytes().chain(compact[..4].bytes());
    let mut remainder: u32 = 0;
    for b in rearranged {
        let value = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'A'..=b'Z' => u32::from(b - b'A') + 10,
            _ => return false,
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }
    remainder == 1
}

pub fn is_valid_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// Phone numbers carry 10 to 15 digits once punctuation is ignored.
pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=15).contains(&digits)
}

const BIRTH_DATE_FORMATS: [&str; 6] = ["%m/%d/%Y", "%d/%m/%Y", "%Y-%m-%d", "%m-%d-%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Accepts a real calendar date between 1900-01-01 and today.
pub fn is_valid_birth_date(value: &str) -> bool {
    let today = Utc::now().date_naive();
    BIRTH_DATE_FORMATS.iter().any(|fmt| {
        NaiveDate::parse_from_str(value.trim(), fmt)
            .map(|date| date.year() >= 1900 && date <= today)
            .unwrap_or(false)
    })
}

/// Validates `MM/YY` (spaces around the slash allowed).
pub fn is_valid_card_expiry(value: &str) -> bool {
    let Some((month, year)) = value.split_once('/') else { return false; };
    let (month, year) = (month.trim(), year.trim());
    if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12)) && month.len() == 2
}

/// Labelled identifiers (passport, record numbers) must carry at least one
/// digit, so a label followed by an ordinary word is not reported.
pub fn contains_digit(value: &str) -> bool {
    value.bytes().any(|b| b.is_ascii_digit())
}

/// A keyword-anchored value is treated as a secret when it is long enough,
/// mixes at least two character classes and is not low-entropy filler.
pub fn is_plausible_secret(value: &str) -> bool {
    CharClassProfile::of(value).classes_present() >= 2
        && looks_random(value.as_bytes(), SECRET_MIN_LEN, SECRET_MIN_BITS)
}
