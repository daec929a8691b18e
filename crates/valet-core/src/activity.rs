//! Append-only activity log.
//!
//! The `ActivityStore` is the shared event log both execution contexts
//! write to: the interactive dispatch path and the background rule
//! scheduler. Appends are atomic per event; snapshot reads never observe a
//! partial event. An optional `ActivitySink` forwards every append to the
//! external persistence layer.

use std::sync::{Arc, RwLock};

use crate::types::{ActivityEvent, EventCategory, Timestamp};

/// External persistence for activity events.
///
/// Implemented by the surrounding project's storage layer. `append` never
/// fails observably to the caller; retries and error logging are the
/// implementor's concern.
pub trait ActivitySink: Send + Sync {
    fn append(&self, event: &ActivityEvent);

    /// Events in `[from, to]`, optionally filtered by category, in
    /// chronological order.
    fn query(
        &self,
        from: Timestamp,
        to: Timestamp,
        category: Option<EventCategory>,
    ) -> Vec<ActivityEvent>;
}

/// In-memory append-only event log with time-range queries.
///
/// Safe for concurrent append and concurrent snapshot reads from both
/// execution contexts.
pub struct ActivityStore {
    events: RwLock<Vec<ActivityEvent>>,
    sink: Option<Arc<dyn ActivitySink>>,
}

impl ActivityStore {
    /// Create a store with no external sink.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            sink: None,
        }
    }

    /// Create a store that forwards every append to `sink`.
    pub fn with_sink(sink: Arc<dyn ActivitySink>) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            sink: Some(sink),
        }
    }

    /// Append one event. Atomic: a concurrent reader sees either the whole
    /// event or nothing.
    pub fn append(&self, event: ActivityEvent) {
        if let Some(sink) = &self.sink {
            sink.append(&event);
        }
        match self.events.write() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    /// Events in `[from, to]`, optionally filtered by category, in
    /// chronological order.
    pub fn query(
        &self,
        from: Timestamp,
        to: Timestamp,
        category: Option<EventCategory>,
    ) -> Vec<ActivityEvent> {
        let events = match self.events.read() {
            Ok(e) => e,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut result: Vec<ActivityEvent> = events
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
            .filter(|e| category.map_or(true, |c| e.category == c))
            .cloned()
            .collect();
        result.sort_by_key(|e| e.timestamp);
        result
    }

    /// All events in the `days`-day window ending at `now`, chronological.
    pub fn window(&self, now: Timestamp, days: u32) -> Vec<ActivityEvent> {
        let from = Timestamp(now.0 - i64::from(days) * 86_400);
        self.query(from, now, None)
    }

    /// Number of events on the civil day (UTC) that `day` falls on.
    pub fn count_on_day(&self, day: Timestamp, category: Option<EventCategory>) -> usize {
        let date = day.date();
        let events = match self.events.read() {
            Ok(e) => e,
            Err(poisoned) => poisoned.into_inner(),
        };
        events
            .iter()
            .filter(|e| e.timestamp.date() == date)
            .filter(|e| category.map_or(true, |c| e.category == c))
            .count()
    }

    pub fn len(&self) -> usize {
        match self.events.read() {
            Ok(e) => e.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivitySink for ActivityStore {
    fn append(&self, event: &ActivityEvent) {
        ActivityStore::append(self, event.clone());
    }

    fn query(
        &self,
        from: Timestamp,
        to: Timestamp,
        category: Option<EventCategory>,
    ) -> Vec<ActivityEvent> {
        ActivityStore::query(self, from, to, category)
    }
}
