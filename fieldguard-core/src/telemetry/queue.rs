// fieldguard-core/src/telemetry/queue.rs
//! Bounded queue of detection events with single-flight batch delivery.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::Category;
use crate::telemetry::sink::TelemetrySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Observed,
    Masked,
}

/// One detection event. Never carries the matched value itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub category: Category,
    pub context: Option<String>,
    pub action: EventAction,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(category: Category, context: Option<String>, action: EventAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            context,
            action,
            metadata: BTreeMap::new(),
            enqueued_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a flush call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub delivered: usize,
    pub dropped: usize,
    pub batches: usize,
    /// True when another flush was already running and this call did nothing.
    pub in_progress: bool,
}

impl FlushReport {
    pub fn in_progress() -> Self {
        Self {
            in_progress: true,
            ..Self::default()
        }
    }
}

/// Resets the single-flight flag however the flush ends.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DetectionEventQueue {
    items: Mutex<VecDeque<QueueItem>>,
    capacity: usize,
    batch_size: usize,
    flushing: AtomicBool,
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl std::fmt::Debug for DetectionEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionEventQueue")
            .field("capacity", &self.capacity)
            .field("batch_size", &self.batch_size)
            .field("sink", &self.sink.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl DetectionEventQueue {
    pub fn new(capacity: usize, batch_size: usize, sink: Option<Arc<dyn TelemetrySink>>) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            batch_size: batch_size.max(1),
            flushing: AtomicBool::new(false),
            sink,
        }
    }

    pub fn set_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sink = Some(sink);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueueItem>> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an event, dropping the oldest one when full.
    pub fn enqueue(&self, item: QueueItem) {
        let mut items = self.lock();
        if items.len() >= self.capacity {
            items.pop_front();
            debug!("Event queue full; dropped the oldest event.");
        }
        items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers every queued event in fixed-size batches.
    ///
    /// Only one flush runs at a time; a concurrent call returns
    /// [`FlushReport::in_progress`] immediately. Failed batches are dropped.
    pub async fn flush(&self) -> FlushReport {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return FlushReport::in_progress();
        }
        let _guard = FlushGuard(&self.flushing);

        let Some(sink) = self.sink.clone() else {
            debug!("No telemetry sink configured; keeping {} events queued.", self.len());
            return FlushReport::default();
        };

        let pending: Vec<QueueItem> = self.lock().drain(..).collect();
        let mut report = FlushReport::default();
        for batch in pending.chunks(self.batch_size) {
            report.batches += 1;
            match sink.deliver(batch).await {
                Ok(()) => report.delivered += batch.len(),
                Err(e) => {
                    warn!(
                        "Telemetry sink '{}' rejected a batch of {} events: {:#}",
                        sink.name(),
                        batch.len(),
                        e
                    );
                    report.dropped += batch.len();
                }
            }
        }
        if report.batches > 0 {
            debug!(
                "Flushed {} events in {} batches ({} dropped).",
                report.delivered, report.batches, report.dropped
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::BuiltInCategory;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<usize>>,
        fail_first: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, batch: &[QueueItem]) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                bail!("endpoint unavailable");
            }
            self.batches.lock().unwrap().push(batch.len());
            Ok(())
        }
    }

    /// Blocks inside `deliver` until released.
    struct GatedSink {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TelemetrySink for GatedSink {
        fn name(&self) -> &str {
            "gated"
        }

        async fn deliver(&self, _batch: &[QueueItem]) -> Result<()> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    fn item() -> QueueItem {
        QueueItem::new(BuiltInCategory::Email.into(), Some("field".into()), EventAction::Observed)
    }

    #[test]
    fn test_enqueue_drops_oldest_at_capacity() {
        let queue = DetectionEventQueue::new(2, 10, None);
        let first = item();
        let first_id = first.id;
        queue.enqueue(first);
        queue.enqueue(item());
        queue.enqueue(item());
        assert_eq!(queue.len(), 2);
        assert!(queue.lock().iter().all(|i| i.id != first_id));
    }

    #[tokio::test]
    async fn test_flush_batches_and_drops_failures() {
        let sink = Arc::new(RecordingSink {
            fail_first: true,
            ..RecordingSink::default()
        });
        let queue = DetectionEventQueue::new(100, 2, Some(sink.clone()));
        for _ in 0..5 {
            queue.enqueue(item());
        }

        let report = queue.flush().await;
        assert_eq!(report.batches, 3);
        assert_eq!(report.dropped, 2);
        assert_eq!(report.delivered, 3);
        assert!(queue.is_empty());
        assert_eq!(*sink.batches.lock().unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_flush_without_sink_keeps_events() {
        let queue = DetectionEventQueue::new(10, 2, None);
        queue.enqueue(item());
        assert_eq!(queue.flush().await, FlushReport::default());
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_flush_is_single_flight() {
        let sink = Arc::new(GatedSink {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let queue = Arc::new(DetectionEventQueue::new(10, 10, Some(sink.clone())));
        queue.enqueue(item());

        let running = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.flush().await })
        };
        sink.entered.notified().await;

        assert!(queue.flush().await.in_progress);

        sink.release.notify_one();
        let report = running.await.unwrap();
        assert_eq!(report.delivered, 1);
        assert!(!queue.flush().await.in_progress);
    }

    #[test]
    fn test_queue_item_serializes_without_values() {
        let json = serde_json::to_value(item().with_metadata("field_kind", "email")).unwrap();
        assert_eq!(json["category"], "email");
        assert_eq!(json["action"], "observed");
        assert_eq!(json["metadata"]["field_kind"], "email");
    }
}
