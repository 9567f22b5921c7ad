// fieldguard-core/src/telemetry/mod.rs
//! Detection events: a bounded in-memory queue and the sink it flushes to.

pub mod queue;
pub mod sink;

pub use queue::{DetectionEventQueue, EventAction, FlushReport, QueueItem};
pub use sink::{HttpTelemetrySink, TelemetrySink};
