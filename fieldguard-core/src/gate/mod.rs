// fieldguard-core/src/gate/mod.rs
//! Scan gate: decides when a text is worth sending to the remote classifier.
//!
//! The gate has three layers. A cheap static check (`should_scan`) rejects
//! texts that are too short, too long or too repetitive. A per-field memory of
//! the last decision lets an insignificant edit reuse the previous result. A
//! fingerprint-keyed cache (`cache`) absorbs identical texts across fields.
//!
//! License: MIT OR APACHE 2.0

pub mod cache;
pub mod fingerprint;
pub mod remote;

use std::collections::HashMap;

use fieldguard_heuristics::charset::distinct_chars;
use serde::Serialize;

use crate::config::ScanGateConfig;
use crate::span::Span;

pub use cache::{CacheEntry, ResultCache};
pub use fingerprint::text_fingerprint;
pub use remote::{
    ClassificationRequest, ClassificationResponse, HttpClassifier, RemoteClassifier,
    RemoteDetection, RemoteError, RiskLevel,
};

/// Monotonic per-field scan ticket. Only the newest ticket for a field may
/// render its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScanTicket(pub u64);

/// The last remote decision made for a field.
#[derive(Debug, Clone)]
pub struct LastDecision {
    pub text: String,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone)]
pub struct ScanGate {
    config: ScanGateConfig,
}

impl ScanGate {
    pub fn new(config: ScanGateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanGateConfig {
        &self.config
    }

    /// False for texts too short, too long, or long but made of very few
    /// distinct characters.
    pub fn should_scan(&self, text: &str) -> bool {
        let length = text.chars().count();
        if length < self.config.min_length || length > self.config.max_length {
            return false;
        }
        if length > self.config.distinct_check_after
            && distinct_chars(text, self.config.min_distinct_chars) < self.config.min_distinct_chars
        {
            return false;
        }
        true
    }

    /// Whether `current` differs enough from `previous` to warrant a new
    /// remote call. The edited region is the text left after removing the
    /// common prefix and suffix.
    pub fn has_significant_change(&self, previous: Option<&str>, current: &str) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        if previous == current {
            return false;
        }

        let prev: Vec<char> = previous.chars().collect();
        let cur: Vec<char> = current.chars().collect();
        let prefix = prev.iter().zip(&cur).take_while(|(a, b)| a == b).count();
        let max_suffix = prev.len().min(cur.len()) - prefix;
        let suffix = prev
            .iter()
            .rev()
            .zip(cur.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let longer = prev.len().max(cur.len());
        let changed = longer - prefix - suffix;
        if changed >= self.config.min_changed_chars {
            return true;
        }
        longer > 0 && (changed as f64 / longer as f64) >= self.config.min_changed_ratio
    }
}

/// Per-field gate memory: last decision and current scan ticket.
#[derive(Debug, Default)]
pub struct FieldGateState {
    last_decisions: HashMap<String, LastDecision>,
    tickets: HashMap<String, u64>,
}

impl FieldGateState {
    pub fn last_decision(&self, field_id: &str) -> Option<&LastDecision> {
        self.last_decisions.get(field_id)
    }

    pub fn record_decision(&mut self, field_id: &str, text: &str, spans: Vec<Span>) {
        self.last_decisions.insert(
            field_id.to_string(),
            LastDecision {
                text: text.to_string(),
                spans,
            },
        );
    }

    /// Issues the next ticket for `field_id`, superseding any earlier one.
    pub fn next_ticket(&mut self, field_id: &str) -> ScanTicket {
        let counter = self.tickets.entry(field_id.to_string()).or_insert(0);
        *counter += 1;
        ScanTicket(*counter)
    }

    pub fn is_current(&self, field_id: &str, ticket: ScanTicket) -> bool {
        self.tickets.get(field_id).copied() == Some(ticket.0)
    }

    /// Forgets the field's last decision. Its ticket counter keeps counting
    /// so tickets handed out before the reset can never become current again.
    pub fn forget(&mut self, field_id: &str) {
        self.last_decisions.remove(field_id);
        if let Some(counter) = self.tickets.get_mut(field_id) {
            *counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ScanGate {
        ScanGate::new(ScanGateConfig::default())
    }

    #[test]
    fn test_should_scan_length_bounds() {
        assert!(!gate().should_scan("abcd"));
        assert!(gate().should_scan("abcde"));
        assert!(!gate().should_scan(&"ab".repeat(2_501)));
    }

    #[test]
    fn test_should_scan_rejects_repetitive_text() {
        assert!(!gate().should_scan(&"abab".repeat(6)));
        assert!(gate().should_scan("abcdefghijklmnopqrstuvwxyz"));
        // Short repetitive text is still allowed.
        assert!(gate().should_scan("aaaaaaaa"));
    }

    #[test]
    fn test_significant_change() {
        let gate = gate();
        assert!(gate.has_significant_change(None, "anything"));
        assert!(!gate.has_significant_change(Some("same text"), "same text"));
        // One character out of 40: under both thresholds.
        let base = "x".repeat(20) + &"y".repeat(20);
        let edited = "x".repeat(20) + "z" + &"y".repeat(19);
        assert!(!gate.has_significant_change(Some(&base), &edited));
        // Five characters appended.
        assert!(gate.has_significant_change(Some(&base), &(base.clone() + "12345")));
        // One character out of four is over the ratio.
        assert!(gate.has_significant_change(Some("abcd"), "abce"));
    }

    #[test]
    fn test_tickets_supersede() {
        let mut state = FieldGateState::default();
        let first = state.next_ticket("f");
        let second = state.next_ticket("f");
        assert!(!state.is_current("f", first));
        assert!(state.is_current("f", second));
        state.forget("f");
        assert!(!state.is_current("f", second));
        assert!(!state.is_current("other", ScanTicket(1)));
    }

    #[test]
    fn test_forget_drops_last_decision() {
        let mut state = FieldGateState::default();
        state.record_decision("f", "text", vec![]);
        assert!(state.last_decision("f").is_some());
        state.forget("f");
        assert!(state.last_decision("f").is_none());
    }
}
