//! Analytics value types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use valet_core::activity::ActivityStore;
use valet_core::types::{ActivityEvent, EventCategory, Timestamp};

/// A bounded window of activity, captured at one point in time.
///
/// All analytics are pure functions of a snapshot, so results are
/// reproducible given the same capture.
#[derive(Clone, Debug)]
pub struct ActivitySnapshot {
    /// Reference time the window ends at.
    pub taken_at: Timestamp,
    pub window_days: u32,
    /// Events in the window, chronological.
    pub events: Vec<ActivityEvent>,
    /// Task events marked completed within the window.
    pub completed_tasks: u32,
}

impl ActivitySnapshot {
    /// Capture the last `window_days` days ending at `now`.
    pub fn capture(
        store: &ActivityStore,
        now: Timestamp,
        window_days: u32,
    ) -> Result<Self, InsightError> {
        if window_days == 0 {
            return Err(InsightError::InvalidWindow(window_days));
        }
        let events = store.window(now, window_days);
        let completed_tasks = events.iter().filter(|e| is_completed_task(e)).count() as u32;
        Ok(Self {
            taken_at: now,
            window_days,
            events,
            completed_tasks,
        })
    }

    /// Build a snapshot directly from events (test and sink-replay path).
    pub fn from_events(now: Timestamp, window_days: u32, events: Vec<ActivityEvent>) -> Self {
        let completed_tasks = events.iter().filter(|e| is_completed_task(e)).count() as u32;
        Self {
            taken_at: now,
            window_days,
            events,
            completed_tasks,
        }
    }

    /// Events on a given civil day, optionally filtered by category.
    pub fn count_on(&self, date: NaiveDate, category: Option<EventCategory>) -> usize {
        self.events
            .iter()
            .filter(|e| e.timestamp.date() == date)
            .filter(|e| category.map_or(true, |c| e.category == c))
            .count()
    }

    /// Events on the snapshot's final day.
    pub fn today_count(&self) -> usize {
        self.count_on(self.taken_at.date(), None)
    }

    /// Events on the day before the snapshot's final day.
    pub fn yesterday_count(&self) -> usize {
        match self.taken_at.date().pred_opt() {
            Some(yesterday) => self.count_on(yesterday, None),
            None => 0,
        }
    }
}

fn is_completed_task(event: &ActivityEvent) -> bool {
    event.category == EventCategory::Task
        && event.metadata.get("status").map(String::as_str) == Some("completed")
}

/// The time axis a pattern clusters on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Recurring hour of day (slot 0-23).
    HourOfDay,
    /// Recurring day of week (slot 0 = Monday .. 6 = Sunday).
    DayOfWeek,
}

/// A recurring time cluster of one activity category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub category: EventCategory,
    pub slot: u8,
    pub count: u32,
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

impl Pattern {
    /// Human-readable description of the cluster.
    pub fn describe(&self) -> String {
        match self.kind {
            PatternKind::HourOfDay => format!(
                "{} activity clusters around {:02}:00 ({} times)",
                self.category, self.slot, self.count
            ),
            PatternKind::DayOfWeek => format!(
                "{} activity clusters on {}s ({} times)",
                self.category,
                WEEKDAYS[usize::from(self.slot) % 7],
                self.count
            ),
        }
    }
}

/// Why a suggestion was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    UnusualHour,
    ActivitySpike,
    TimeOfDay,
    WeeklyCleanup,
    MailBacklog,
    Habit,
}

/// An advisory produced by analytics. Delivery is the scheduler's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
}

impl Suggestion {
    pub fn new(kind: SuggestionKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Summary of one civil day's activity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_events: usize,
    pub mail_sent: usize,
    pub mail_read: usize,
    pub messages_sent: usize,
    pub media_actions: usize,
    pub tasks_completed: usize,
    /// Hour with the most events; ties resolve to the earliest hour.
    pub peak_hour: Option<u8>,
}

impl DailySummary {
    /// One-line notification text.
    pub fn describe(&self) -> String {
        let peak = match self.peak_hour {
            Some(h) => format!(", busiest around {:02}:00", h),
            None => String::new(),
        };
        format!(
            "{}: {} events: {} emails sent, {} messages, {} tasks completed{}",
            self.date, self.total_events, self.mail_sent, self.messages_sent, self.tasks_completed, peak
        )
    }
}
