// Shared between integration test binaries; not every binary uses it all.
#![allow(dead_code)]

pub mod source;

pub use source::*;

use attrgraph::sink::{MemorySink, RecordedEvent};
use attrgraph::triplet::Quality;

/// Assert the most recent change event for `name` carries the expected
/// numeric value and quality, and that the archive stream matches it.
#[allow(dead_code)]
pub fn assert_last_event(sink: &MemorySink, name: &str, value: f64, quality: Quality) {
    let changes = sink.changes_for(name);
    let archives = sink.archives_for(name);
    let change = last(&changes, name, "change");
    let archive = last(&archives, name, "archive");
    for (stream, event) in [("change", change), ("archive", archive)] {
        let triplet = event
            .report
            .triplet()
            .unwrap_or_else(|| panic!("{stream} event for {name} is an error"));
        assert_eq!(triplet.as_f64(), Some(value), "{stream} value for {name}");
        assert_eq!(triplet.quality, quality, "{stream} quality for {name}");
    }
    assert_eq!(
        change.report.triplet().unwrap().timestamp,
        archive.report.triplet().unwrap().timestamp,
        "change/archive timestamps for {name} must match"
    );
}

#[allow(dead_code)]
fn last<'e>(events: &'e [RecordedEvent], name: &str, stream: &str) -> &'e RecordedEvent {
    events
        .last()
        .unwrap_or_else(|| panic!("no {stream} events recorded for {name}"))
}
