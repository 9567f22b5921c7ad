//! Pattern registry: the built-in catalog plus the current set of
//! organization-defined patterns.
//!
//! A registry value is immutable once built. Registering new custom patterns
//! produces a fresh registry that the owner swaps in wholesale, so a scan in
//! flight always sees one consistent snapshot.

pub mod builtins;
pub mod compiler;

use std::collections::BTreeSet;

use log::info;

use crate::category::BuiltInCategory;
use crate::config::CustomPattern;

pub use builtins::{builtin_matchers, BuiltInMatcher, REGEX_SIZE_LIMIT};
pub use compiler::{
    compile_custom_patterns, compile_pattern, CompiledPattern, RegistrationError,
    RegistrationReport,
};

#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    custom: Vec<CompiledPattern>,
    disabled: BTreeSet<BuiltInCategory>,
}

impl PatternRegistry {
    /// A registry with every built-in enabled and no custom patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `patterns` into a new registry that keeps this one's disabled
    /// built-ins. The returned report lists what registered and what failed.
    pub fn with_custom_patterns(
        &self,
        patterns: &[CustomPattern],
        default_confidence: u8,
    ) -> (Self, RegistrationReport) {
        let (custom, report) = compile_custom_patterns(patterns, default_confidence);
        info!(
            "Custom pattern set replaced: {} registered, {} skipped, {} rejected.",
            report.registered.len(),
            report.skipped.len(),
            report.errors.len()
        );
        (
            Self {
                custom,
                disabled: self.disabled.clone(),
            },
            report,
        )
    }

    /// A copy of this registry with a different set of disabled built-ins.
    pub fn with_disabled_builtins<I>(&self, disabled: I) -> Self
    where
        I: IntoIterator<Item = BuiltInCategory>,
    {
        Self {
            custom: self.custom.clone(),
            disabled: disabled.into_iter().collect(),
        }
    }

    /// Built-in matchers that are not disabled, in scan order.
    pub fn active_builtins(&self) -> impl Iterator<Item = &'static BuiltInMatcher> + '_ {
        builtin_matchers()
            .iter()
            .filter(move |m| !self.disabled.contains(&m.category))
    }

    /// Custom matchers in registration order.
    pub fn custom_patterns(&self) -> &[CompiledPattern] {
        &self.custom
    }

    pub fn disabled_builtins(&self) -> &BTreeSet<BuiltInCategory> {
        &self.disabled
    }

    pub fn is_disabled(&self, category: BuiltInCategory) -> bool {
        self.disabled.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_builtins_are_filtered() {
        let registry = PatternRegistry::new().with_disabled_builtins([BuiltInCategory::Phone]);
        assert!(registry.is_disabled(BuiltInCategory::Phone));
        assert!(registry
            .active_builtins()
            .all(|m| m.category != BuiltInCategory::Phone));
        assert!(registry
            .active_builtins()
            .any(|m| m.category == BuiltInCategory::Email));
    }

    #[test]
    fn test_registration_replaces_custom_set() {
        let first = CustomPattern {
            id: "a".into(),
            pattern: "AAA".into(),
            ..CustomPattern::default()
        };
        let second = CustomPattern {
            id: "b".into(),
            pattern: "BBB".into(),
            ..CustomPattern::default()
        };
        let (registry, _) = PatternRegistry::new().with_custom_patterns(&[first], 80);
        let (registry, report) = registry.with_custom_patterns(&[second], 80);
        assert_eq!(report.registered, vec!["b".to_string()]);
        let ids: Vec<&str> = registry.custom_patterns().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_registration_keeps_disabled_builtins() {
        let registry = PatternRegistry::new().with_disabled_builtins([BuiltInCategory::Iban]);
        let (registry, _) = registry.with_custom_patterns(&[], 80);
        assert!(registry.is_disabled(BuiltInCategory::Iban));
    }
}
