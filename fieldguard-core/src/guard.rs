// fieldguard-core/src/guard.rs
//! The `FieldGuard` façade.
//!
//! `FieldGuard` owns every piece of long-lived state: the pattern registry,
//! the scan-gate memory, the result cache, the event queue and the per-field
//! sessions. Hosts hold it in an `Arc` and call into it from any thread.
//!
//! License: MIT OR APACHE 2.0

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;

use crate::category::Category;
use crate::config::{CustomPattern, GuardConfig};
use crate::engine::DetectionEngine;
use crate::engines::regex_engine::RegexEngine;
use crate::errors::FieldGuardError;
use crate::field_context::{coarse_kind, expected_categories, filter_expected, FieldDescriptor};
use crate::gate::{
    text_fingerprint, ClassificationRequest, FieldGateState, HttpClassifier, RemoteClassifier,
    ResultCache, ScanGate, ScanTicket,
};
use crate::masking::{self, is_redaction_marker};
use crate::policy::OrgPolicy;
use crate::registry::{PatternRegistry, RegistrationReport};
use crate::resolution::{drop_local_duplicates, merge};
use crate::span::{canonical_value_hash, Span};
use crate::telemetry::{
    DetectionEventQueue, EventAction, FlushReport, HttpTelemetrySink, QueueItem, TelemetrySink,
};

/// Where a remote-step result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Remote,
    Cache,
    LastDecision,
}

/// Outcome of the remote classification step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoteOutcome {
    /// Remote findings not already reported locally.
    Detected { spans: Vec<Span>, source: ResultSource },
    /// No classifier configured, or the gate judged the text not worth sending.
    Skipped,
    /// The classifier failed or timed out. Local findings are unaffected.
    Unavailable,
    /// A quota or subscription message the host may show once.
    Notice { message: String },
    /// The field lost focus before the result arrived.
    Cancelled,
    /// A newer scan for the same field was started.
    Superseded,
}

/// A focused field. Dropping it does nothing; call
/// [`FieldGuard::blur_field`] to end the session.
#[derive(Debug, Clone)]
pub struct FieldSession {
    pub field_id: String,
    token: CancellationToken,
}

impl FieldSession {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct FieldGuard {
    config: GuardConfig,
    engine: Box<dyn DetectionEngine>,
    registry: RwLock<Arc<PatternRegistry>>,
    gate: ScanGate,
    gate_state: Mutex<FieldGateState>,
    cache: Mutex<ResultCache>,
    queue: DetectionEventQueue,
    classifier: Option<Arc<dyn RemoteClassifier>>,
    sessions: Mutex<HashMap<String, CancellationToken>>,
}

impl std::fmt::Debug for FieldGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGuard")
            .field("engine", &self.engine.name())
            .field("classifier", &self.classifier.as_ref().map(|c| c.name().to_string()))
            .field("queue", &self.queue)
            .finish()
    }
}

impl FieldGuard {
    /// Builds a guard from a validated configuration, with no remote
    /// classifier and no telemetry sink.
    pub fn new(config: GuardConfig) -> Result<Self, FieldGuardError> {
        config.validate()?;
        let registry = PatternRegistry::new().with_disabled_builtins(config.disabled_builtins.iter().copied());
        Ok(Self {
            engine: Box::new(RegexEngine::new(config.max_scan_length)),
            registry: RwLock::new(Arc::new(registry)),
            gate: ScanGate::new(config.scan_gate.clone()),
            gate_state: Mutex::new(FieldGateState::default()),
            cache: Mutex::new(ResultCache::new(
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.max_entries,
            )),
            queue: DetectionEventQueue::new(config.queue.capacity, config.queue.batch_size, None),
            classifier: None,
            sessions: Mutex::new(HashMap::new()),
            config,
        })
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn RemoteClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_telemetry_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.queue.set_sink(sink);
        self
    }

    /// Wires the bundled HTTP adapters for whichever endpoints the
    /// configuration names.
    pub fn with_http_adapters(self) -> Result<Self> {
        let timeout = Duration::from_millis(self.config.remote.timeout_ms);
        let mut guard = self;
        if let Some(endpoint) = guard.config.remote.endpoint.clone() {
            info!("Using HTTP classifier at {}", endpoint);
            let classifier = HttpClassifier::new(endpoint, timeout)?;
            guard = guard.with_classifier(Arc::new(classifier));
        }
        if let Some(endpoint) = guard.config.telemetry.endpoint.clone() {
            info!("Using HTTP telemetry sink at {}", endpoint);
            let sink = HttpTelemetrySink::new(endpoint, timeout)?;
            guard = guard.with_telemetry_sink(Arc::new(sink));
        }
        Ok(guard)
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// The registry currently in effect.
    pub fn registry(&self) -> Arc<PatternRegistry> {
        let registry = self.registry.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*registry)
    }

    fn replace_registry(&self, registry: PatternRegistry) {
        let mut current = self.registry.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::new(registry);
    }

    /// Replaces the custom pattern set. Invalid patterns are reported and the
    /// rest take effect.
    pub fn register_custom_patterns(&self, patterns: &[CustomPattern]) -> RegistrationReport {
        let (registry, report) = self
            .registry()
            .with_custom_patterns(patterns, self.config.custom_confidence);
        self.replace_registry(registry);
        report
    }

    /// Applies an organization policy: its disabled built-ins and its
    /// custom patterns.
    pub fn apply_policy(&self, policy: &OrgPolicy) -> RegistrationReport {
        let disabled = self
            .config
            .disabled_builtins
            .iter()
            .chain(&policy.disabled_builtins)
            .copied();
        let (registry, report) = self
            .registry()
            .with_disabled_builtins(disabled)
            .with_custom_patterns(&policy.custom_patterns, self.config.custom_confidence);
        self.replace_registry(registry);
        info!("Applied policy '{}' (version {}).", policy.policy_name, policy.version);
        report
    }

    /// Every finding in `text`, resolved and ordered by position, without any
    /// field-context filtering.
    pub fn detect(&self, text: &str) -> Vec<Span> {
        let registry = self.registry();
        let raw = self.engine.scan(text, &registry);
        merge(raw.built_in, raw.custom)
    }

    /// Findings worth flagging for a field: everything `detect` finds minus
    /// the categories the field is expected to hold. Each returned span is
    /// recorded as an `Observed` event.
    pub fn scan(&self, text: &str, field: &FieldDescriptor) -> Vec<Span> {
        let expected = expected_categories(field);
        let spans = filter_expected(self.detect(text), &expected);
        self.record_observed(&spans, field);
        spans
    }

    pub fn mask(&self, span: &Span) -> String {
        masking::mask(span)
    }

    pub fn mask_in_text(&self, text: &str, span: &Span) -> String {
        masking::mask_in_text(text, span)
    }

    /// Masks `span` in `text` and records a `Masked` event for it.
    pub fn apply_mask(&self, text: &str, span: &Span, field: &FieldDescriptor) -> String {
        let masked = masking::mask_in_text(text, span);
        if masked != text {
            self.record_event(span, field, EventAction::Masked);
        }
        masked
    }

    /// Masks every span in `text` at once and records a `Masked` event for
    /// each span that was still present.
    pub fn apply_mask_all(&self, text: &str, spans: &[Span], field: &FieldDescriptor) -> String {
        for span in spans.iter().filter(|span| masking::locate(text, span).is_some()) {
            self.record_event(span, field, EventAction::Masked);
        }
        masking::mask_all_in_text(text, spans)
    }

    fn record_observed(&self, spans: &[Span], field: &FieldDescriptor) {
        for span in spans {
            self.record_event(span, field, EventAction::Observed);
        }
    }

    /// Queues a detection event. The span's value is never recorded, only
    /// its canonical hash.
    pub fn record_event(&self, span: &Span, field: &FieldDescriptor, action: EventAction) {
        let item = QueueItem::new(span.category.clone(), field.name.clone(), action)
            .with_metadata("value_hash", canonical_value_hash(&span.category, &span.value))
            .with_metadata("origin", format!("{:?}", span.origin).to_lowercase())
            .with_metadata("confidence", span.confidence.to_string())
            .with_metadata("field_kind", format!("{:?}", coarse_kind(field)).to_lowercase());
        self.queue.enqueue(item);
    }

    pub async fn flush_events(&self) -> FlushReport {
        self.queue.flush().await
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Evicts expired cache entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        lock(&self.cache).sweep()
    }

    /// Spawns the periodic sweep-and-flush task. The task ends on its own
    /// once the last strong reference to the guard is dropped.
    pub fn start_sweep_loop(guard: Arc<FieldGuard>) -> JoinHandle<()> {
        let period = Duration::from_secs(guard.config.sweep_interval_secs);
        let weak: Weak<FieldGuard> = Arc::downgrade(&guard);
        drop(guard);

        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(guard) = weak.upgrade() else {
                    debug!("FieldGuard dropped; sweep loop exiting.");
                    break;
                };
                let evicted = guard.sweep();
                let report = guard.flush_events().await;
                debug!(
                    "Sweep tick: {} cache entries evicted, {} events delivered.",
                    evicted, report.delivered
                );
            }
        })
    }

    /// Starts a session for a focused field, cancelling any previous session
    /// for the same field.
    pub fn focus_field(&self, field_id: &str) -> FieldSession {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.sessions).insert(field_id.to_string(), token.clone()) {
            previous.cancel();
        }
        FieldSession {
            field_id: field_id.to_string(),
            token,
        }
    }

    /// Ends a field's session: cancels its in-flight remote call and forgets
    /// its last decision.
    pub fn blur_field(&self, field_id: &str) {
        if let Some(token) = lock(&self.sessions).remove(field_id) {
            token.cancel();
        }
        lock(&self.gate_state).forget(field_id);
    }

    /// Hands out the newest scan ticket for a field.
    pub fn begin_scan(&self, field_id: &str) -> ScanTicket {
        lock(&self.gate_state).next_ticket(field_id)
    }

    pub fn is_current(&self, field_id: &str, ticket: ScanTicket) -> bool {
        lock(&self.gate_state).is_current(field_id, ticket)
    }

    fn session_token(&self, field_id: &str) -> CancellationToken {
        lock(&self.sessions)
            .get(field_id)
            .cloned()
            .unwrap_or_else(CancellationToken::new)
    }

    /// Keeps what the host should show: no local duplicates, nothing the
    /// field is expected to hold. What is kept is recorded as `Observed`.
    fn finish_remote(
        &self,
        spans: Vec<Span>,
        local: &[Span],
        field: &FieldDescriptor,
        expected: &BTreeSet<Category>,
        source: ResultSource,
    ) -> RemoteOutcome {
        let spans = filter_expected(drop_local_duplicates(local, spans), expected);
        self.record_observed(&spans, field);
        RemoteOutcome::Detected { spans, source }
    }

    /// Runs the remote classification step for one field.
    ///
    /// `local` is what the local scan already reported for `text`; remote
    /// findings with the same values are dropped. `ticket` must come from
    /// [`FieldGuard::begin_scan`]; if a newer ticket exists when the response
    /// arrives the outcome is [`RemoteOutcome::Superseded`].
    pub async fn classify_remote(
        &self,
        field_id: &str,
        text: &str,
        field: &FieldDescriptor,
        local: &[Span],
        ticket: ScanTicket,
    ) -> RemoteOutcome {
        let Some(classifier) = self.classifier.clone() else {
            return RemoteOutcome::Skipped;
        };
        if !self.gate.should_scan(text) {
            debug!("Scan gate declined text for field '{}'.", field_id);
            return RemoteOutcome::Skipped;
        }

        let expected = expected_categories(field);
        let kind = coarse_kind(field);
        let context = context_hint(field);
        let fingerprint = text_fingerprint(text, context.as_deref(), kind);

        let cached = lock(&self.cache).get(&fingerprint);
        if let Some(spans) = cached {
            if !self.is_current(field_id, ticket) {
                debug!("Cached result for field '{}' superseded by a newer scan.", field_id);
                return RemoteOutcome::Superseded;
            }
            debug!("Remote result for field '{}' served from cache.", field_id);
            lock(&self.gate_state).record_decision(field_id, text, spans.clone());
            return self.finish_remote(spans, local, field, &expected, ResultSource::Cache);
        }

        let reusable = {
            let state = lock(&self.gate_state);
            state.last_decision(field_id).and_then(|last| {
                (!self.gate.has_significant_change(Some(&last.text), text)).then(|| {
                    last.spans
                        .iter()
                        .cloned()
                        .map(|mut span| {
                            span.offsets = None;
                            span.locate_in(text)
                        })
                        .collect::<Vec<_>>()
                })
            })
        };
        if let Some(spans) = reusable {
            if !self.is_current(field_id, ticket) {
                debug!("Reused decision for field '{}' superseded by a newer scan.", field_id);
                return RemoteOutcome::Superseded;
            }
            debug!("Insignificant edit in field '{}'; reusing last decision.", field_id);
            return self.finish_remote(spans, local, field, &expected, ResultSource::LastDecision);
        }

        let token = self.session_token(field_id);
        if token.is_cancelled() {
            return RemoteOutcome::Cancelled;
        }

        let request = ClassificationRequest {
            text: text.to_string(),
            context,
            coarse_kind: kind,
        };
        let timeout = Duration::from_millis(self.config.remote.timeout_ms);

        let response = tokio::select! {
            _ = token.cancelled() => {
                debug!("Remote classification for field '{}' cancelled.", field_id);
                return RemoteOutcome::Cancelled;
            }
            result = time::timeout(timeout, classifier.classify(&request)) => result,
        };

        let response = match response {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_quota() => {
                warn!("Remote classifier '{}' refused the call: {}", classifier.name(), e);
                return RemoteOutcome::Notice {
                    message: e.to_string(),
                };
            }
            Ok(Err(e)) => {
                warn!("Remote classifier '{}' failed: {}", classifier.name(), e);
                return RemoteOutcome::Unavailable;
            }
            Err(_) => {
                warn!(
                    "Remote classifier '{}' timed out after {} ms.",
                    classifier.name(),
                    self.config.remote.timeout_ms
                );
                return RemoteOutcome::Unavailable;
            }
        };

        let spans: Vec<Span> = response
            .detections
            .into_iter()
            .filter(|detection| !is_redaction_marker(&detection.value))
            .filter_map(|detection| detection.into_span(text, classifier.name()))
            .collect();
        lock(&self.cache).insert(fingerprint, spans.clone());

        if !self.is_current(field_id, ticket) {
            debug!("Remote result for field '{}' superseded by a newer scan.", field_id);
            return RemoteOutcome::Superseded;
        }
        lock(&self.gate_state).record_decision(field_id, text, spans.clone());
        self.finish_remote(spans, local, field, &expected, ResultSource::Remote)
    }
}

/// The most descriptive text attribute of a field, sent as context.
fn context_hint(field: &FieldDescriptor) -> Option<String> {
    [&field.label, &field.placeholder, &field.name, &field.title]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
}
