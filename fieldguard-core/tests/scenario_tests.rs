// fieldguard-core/tests/scenario_tests.rs
//! End-to-end behaviour of the local pipeline: detection, resolution,
//! field-context filtering and masking.

use std::collections::BTreeSet;

use proptest::prelude::*;

use fieldguard_core::validators::is_valid_payment_card;
use fieldguard_core::{
    filter_expected, mask, mask_in_text, merge, BuiltInCategory, Category, CustomPattern,
    DeclaredKind, FieldDescriptor, FieldGuard, GuardConfig, REDACTION_GLYPH,
};

fn guard() -> FieldGuard {
    FieldGuard::new(GuardConfig::default()).unwrap()
}

fn luhn_check_digit(payload: &[u32]) -> u32 {
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, &digit)| {
            if idx % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    (10 - sum % 10) % 10
}

fn grouped(digits: &[u32]) -> String {
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().map(|d| d.to_string()).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

#[test_log::test]
fn test_card_scenario() {
    let guard = guard();
    let spans = guard.scan("4242 4242 4242 4242", &FieldDescriptor::default());
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, BuiltInCategory::PaymentCard.into());
    assert_eq!(guard.mask(&spans[0]), "•••• •••• •••• 4242");
}

#[test_log::test]
fn test_email_scenario() {
    let guard = guard();
    let text = "reach me at j.doe@example.com";
    let spans = guard.scan(text, &FieldDescriptor::default());
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].value, "j.doe@example.com");
    assert_eq!(guard.mask_in_text(text, &spans[0]), "reach me at j•••••••@example.com");
}

#[test_log::test]
fn test_custom_category_keeps_its_label() {
    let guard = guard();
    guard.register_custom_patterns(&[CustomPattern {
        id: "emp".into(),
        name: "Employee ID".into(),
        category: Some("EMPLOYEE_ID".into()),
        pattern: r"EMP-\d{6}".into(),
        ..CustomPattern::default()
    }]);
    let spans = guard.scan("EMP-123456", &FieldDescriptor::default());
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, Category::Custom("EMPLOYEE_ID".into()));
    assert_eq!(spans[0].source.as_deref(), Some("Employee ID"));
}

#[test_log::test]
fn test_generic_custom_pattern_over_card_collapses_to_one_span() {
    let guard = guard();
    guard.register_custom_patterns(&[CustomPattern {
        id: "digits".into(),
        category: Some("regex".into()),
        pattern: r"\d{4} \d{4} \d{4} \d{4}".into(),
        ..CustomPattern::default()
    }]);
    let spans = guard.detect("pay 4242 4242 4242 4242");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, BuiltInCategory::PaymentCard.into());
}

#[test_log::test]
fn test_builtin_sounding_custom_label_is_kept() {
    let guard = guard();
    guard.register_custom_patterns(&[CustomPattern {
        id: "loyalty".into(),
        category: Some("card".into()),
        pattern: r"LOY-\d{6}".into(),
        ..CustomPattern::default()
    }]);
    let spans = guard.detect("member LOY-123456");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, Category::Custom("card".into()));

    let field = FieldDescriptor {
        label: Some("Loyalty card".into()),
        ..FieldDescriptor::default()
    };
    let spans = guard.scan("member LOY-123456", &field);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].value, "LOY-123456");
}

#[test_log::test]
fn test_email_field_filters_email() {
    let guard = guard();
    let field = FieldDescriptor {
        name: Some("email".into()),
        ..FieldDescriptor::default()
    };
    assert!(guard.scan("a@b.com", &field).is_empty());

    let typed = FieldDescriptor {
        kind: DeclaredKind::Email,
        ..FieldDescriptor::default()
    };
    assert!(guard.scan("a@b.com", &typed).is_empty());
}

#[test_log::test]
fn test_phone_field_still_flags_card() {
    let guard = guard();
    let field = FieldDescriptor {
        kind: DeclaredKind::Tel,
        label: Some("Mobile phone".into()),
        ..FieldDescriptor::default()
    };
    let spans = guard.scan("+14155550123 or 4242424242424242", &field);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, BuiltInCategory::PaymentCard.into());
}

#[test_log::test]
fn test_spans_are_ordered_by_position() {
    let spans = guard().detect("ssn 123-45-6789, mail a@b.com, card 4242424242424242");
    let starts: Vec<usize> = spans.iter().filter_map(|s| s.start()).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
    assert_eq!(spans.len(), 3);
}

const MIXED_TEXT: &str = "mail a@b.com, ssn 123-45-6789, call (415) 555-0123, card 4242 4242 4242 4242";

const MIXED_CATEGORIES: [BuiltInCategory; 4] = [
    BuiltInCategory::Email,
    BuiltInCategory::NationalId,
    BuiltInCategory::Phone,
    BuiltInCategory::PaymentCard,
];

proptest! {
    #[test]
    fn luhn_valid_cards_are_detected(payload in prop::collection::vec(0u32..10, 15)) {
        let mut digits = payload.clone();
        digits.push(luhn_check_digit(&payload));
        let number = grouped(&digits);
        let text = format!("card {}", number);

        let spans = guard().detect(&text);
        let card = spans
            .iter()
            .find(|s| s.category == BuiltInCategory::PaymentCard.into());
        prop_assert!(card.is_some());
        let card = card.unwrap();
        prop_assert_eq!(&card.value, &number);
        prop_assert_eq!(card.start(), Some(5));
        prop_assert_eq!(card.end(), Some(text.len()));
    }

    #[test]
    fn cards_after_short_digit_groups_are_found(
        payload in prop::collection::vec(0u32..10, 15),
        prefix in prop::collection::vec(prop::collection::vec(0u32..10, 1..=3), 1..=2),
    ) {
        let mut digits = payload.clone();
        digits.push(luhn_check_digit(&payload));
        let number = grouped(&digits);

        let mut groups: Vec<String> = prefix
            .iter()
            .map(|group| group.iter().map(|d| d.to_string()).collect())
            .collect();
        groups.extend(number.split(' ').map(str::to_string));
        // Any other card-length run that starts in the prefix must not pass Luhn.
        for first in 0..prefix.len() {
            for last in first..groups.len() {
                let run = groups[first..=last].join(" ");
                let count = run.chars().filter(char::is_ascii_digit).count();
                prop_assume!(!(13..=19).contains(&count) || !is_valid_payment_card(&run));
            }
        }

        let text = format!("ref {}", groups.join(" "));
        let spans = guard().detect(&text);
        let card = spans
            .iter()
            .find(|s| s.category == BuiltInCategory::PaymentCard.into());
        prop_assert!(card.is_some());
        let card = card.unwrap();
        prop_assert_eq!(&card.value, &number);
        prop_assert_eq!(card.start(), Some(text.len() - number.len()));
    }

    #[test]
    fn luhn_invalid_cards_are_not_detected(payload in prop::collection::vec(0u32..10, 15)) {
        let mut digits = payload.clone();
        digits.push((luhn_check_digit(&payload) + 1) % 10);
        let text = format!("card {}", grouped(&digits));

        let spans = guard().detect(&text);
        prop_assert!(spans
            .iter()
            .all(|s| s.category != BuiltInCategory::PaymentCard.into()));
    }

    #[test]
    fn card_mask_keeps_only_the_last_four_digits(payload in prop::collection::vec(0u32..10, 15)) {
        let mut digits = payload.clone();
        digits.push(luhn_check_digit(&payload));
        let number = grouped(&digits);

        let spans = guard().detect(&number);
        prop_assert_eq!(spans.len(), 1);
        let masked = mask(&spans[0]);
        let visible: String = masked.chars().filter(char::is_ascii_digit).collect();
        prop_assert_eq!(visible, number[number.len() - 4..].to_string());
        prop_assert_eq!(masked.chars().filter(|c| *c == REDACTION_GLYPH).count(), 12);
        prop_assert_eq!(masked.chars().count(), number.chars().count());
    }

    #[test]
    fn email_mask_hides_the_local_part(local in "[q-w]{2,12}") {
        let text = format!("write to {}@example.com", local);
        let spans = guard().detect(&text);
        prop_assert_eq!(spans.len(), 1);

        let masked_value = mask(&spans[0]);
        prop_assert!(!masked_value.contains(&local[1..]));
        prop_assert_eq!(masked_value.chars().filter(|c| *c == REDACTION_GLYPH).count(), 7);

        let masked = mask_in_text(&text, &spans[0]);
        prop_assert_eq!(masked, format!("write to {}@example.com", masked_value.split('@').next().unwrap_or_default()));
    }

    #[test]
    fn merge_is_idempotent(extra in "[a-z ]{0,20}") {
        let text = format!("{} {} EMP-123456", MIXED_TEXT, extra);
        let guard = guard();
        guard.register_custom_patterns(&[CustomPattern {
            id: "emp".into(),
            category: Some("EMPLOYEE_ID".into()),
            pattern: r"EMP-\d{6}".into(),
            ..CustomPattern::default()
        }]);
        let once = guard.detect(&text);
        let twice = merge(once.clone(), Vec::new());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filter_removes_exactly_expected_categories(
        expected in prop::sample::subsequence(MIXED_CATEGORIES.to_vec(), 0..=4)
    ) {
        let spans = guard().detect(MIXED_TEXT);
        prop_assert_eq!(spans.len(), 4);

        let expected: BTreeSet<Category> = expected.into_iter().map(Category::from).collect();
        let kept = filter_expected(spans.clone(), &expected);
        let want: Vec<_> = spans
            .into_iter()
            .filter(|s| !expected.contains(&s.category))
            .collect();
        prop_assert_eq!(kept, want);
    }
}
