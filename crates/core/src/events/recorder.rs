// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory trail of accepted events
//!
//! The recorder holds a bus tap and drains it lazily on every read, so it
//! needs no task of its own and observes events in emission order.

use super::bus::{EventBus, EventReceiver};
use super::event::Event;
use super::subscription::TopicPattern;
use crate::topic::Topic;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// A recorded event with metadata
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Bus sequence number of the event
    pub sequence: u64,
    /// Milliseconds from attachment to the bus accepting the event
    pub elapsed_ms: u64,
    pub topic: Topic,
    pub event: Arc<Event>,
}

struct RecorderState {
    rx: EventReceiver,
    records: Vec<EventRecord>,
}

/// Records every event the bus accepts after attachment
pub struct EventRecorder {
    state: Mutex<RecorderState>,
    start_time: Instant,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        Self {
            state: Mutex::new(RecorderState {
                rx: bus.tap(),
                records: Vec::new(),
            }),
            start_time: Instant::now(),
        }
    }

    fn with_records<T>(&self, f: impl FnOnce(&[EventRecord]) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while let Ok(event) = state.rx.try_recv() {
            let elapsed = event.emitted_at.saturating_duration_since(self.start_time);
            state.records.push(EventRecord {
                sequence: event.sequence,
                elapsed_ms: elapsed.as_millis() as u64,
                topic: event.topic.clone(),
                event,
            });
        }
        f(&state.records)
    }

    /// All recorded events in emission order
    pub fn records(&self) -> Vec<EventRecord> {
        self.with_records(<[EventRecord]>::to_vec)
    }

    /// Recorded events whose topic matches `pattern`
    pub fn query(&self, pattern: &TopicPattern) -> Vec<EventRecord> {
        self.with_records(|records| {
            records
                .iter()
                .filter(|r| pattern.matches(&r.topic))
                .cloned()
                .collect()
        })
    }

    /// Recorded events after a sequence number
    pub fn after(&self, sequence: u64) -> Vec<EventRecord> {
        self.with_records(|records| {
            records
                .iter()
                .filter(|r| r.sequence > sequence)
                .cloned()
                .collect()
        })
    }

    /// Number of recorded events on exactly `topic`
    pub fn count(&self, topic: &Topic) -> usize {
        self.with_records(|records| records.iter().filter(|r| &r.topic == topic).count())
    }

    pub fn len(&self) -> usize {
        self.with_records(<[EventRecord]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.with_records(|_| ());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.records.clear();
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
