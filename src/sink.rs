//! Event sinks receiving change/archive notifications from the graph.
//!
//! Every accepted state transition produces exactly one change and one
//! archive report, emitted synchronously while the graph lock is held.
//! Sinks must therefore be fast and must not call back into the graph.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::failure::FailureContext;
use crate::triplet::Triplet;

/// Payload of a change/archive notification: a settled value or a failure.
#[derive(Clone, Debug)]
pub enum AttrReport {
    Value(Triplet),
    Error(FailureContext),
}

impl AttrReport {
    pub fn triplet(&self) -> Option<&Triplet> {
        match self {
            AttrReport::Value(t) => Some(t),
            AttrReport::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureContext> {
        match self {
            AttrReport::Value(_) => None,
            AttrReport::Error(ctx) => Some(ctx),
        }
    }
}

/// Receiver for per-attribute change and archive events.
pub trait EventSink: Send + Sync {
    fn on_change(&self, name: &str, report: &AttrReport);
    fn on_archive(&self, name: &str, report: &AttrReport);
}

/// Which of the two event streams an entry was recorded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Change,
    Archive,
}

/// One recorded event, as captured by [`MemorySink`].
#[derive(Clone, Debug)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub name: String,
    pub report: AttrReport,
}

/// Recording sink for tests and diagnostics.
///
/// Clones share the same buffer, so a test can keep one handle while the
/// graph owns the other.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Change events recorded for `name`, in emission order.
    pub fn changes_for(&self, name: &str) -> Vec<RecordedEvent> {
        self.filtered(name, EventKind::Change)
    }

    /// Archive events recorded for `name`, in emission order.
    pub fn archives_for(&self, name: &str) -> Vec<RecordedEvent> {
        self.filtered(name, EventKind::Archive)
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn filtered(&self, name: &str, kind: EventKind) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind && e.name == name)
            .cloned()
            .collect()
    }

    fn record(&self, kind: EventKind, name: &str, report: &AttrReport) {
        self.events.lock().push(RecordedEvent {
            kind,
            name: name.to_owned(),
            report: report.clone(),
        });
    }
}

impl EventSink for MemorySink {
    fn on_change(&self, name: &str, report: &AttrReport) {
        self.record(EventKind::Change, name, report);
    }

    fn on_archive(&self, name: &str, report: &AttrReport) {
        self.record(EventKind::Archive, name, report);
    }
}

/// Sink logging every event through `tracing`. Default sink of a graph.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    fn log(stream: &str, name: &str, report: &AttrReport) {
        match report {
            AttrReport::Value(t) => {
                tracing::debug!(
                    attribute = name,
                    stream,
                    quality = %t.quality,
                    timestamp = %t.timestamp,
                    "attribute settled"
                );
            }
            AttrReport::Error(ctx) => {
                tracing::debug!(attribute = name, stream, error = %ctx, "attribute failed");
            }
        }
    }
}

impl EventSink for TracingSink {
    fn on_change(&self, name: &str, report: &AttrReport) {
        Self::log("change", name, report);
    }

    fn on_archive(&self, name: &str, report: &AttrReport) {
        Self::log("archive", name, report);
    }
}
