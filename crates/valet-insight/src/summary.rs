//! Daily activity summary.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::{ActivitySnapshot, DailySummary};
use valet_core::types::EventCategory;

/// Summarize one civil day of a snapshot.
///
/// Send counts are derived from the `action` metadata the router stamps
/// on dispatch outcomes; events without it fall into the read buckets.
pub fn daily_summary(snapshot: &ActivitySnapshot, date: NaiveDate) -> DailySummary {
    let mut mail_sent = 0;
    let mut mail_read = 0;
    let mut messages_sent = 0;
    let mut media_actions = 0;
    let mut tasks_completed = 0;
    let mut total_events = 0;
    let mut by_hour: HashMap<u8, usize> = HashMap::new();

    for event in snapshot.events.iter().filter(|e| e.timestamp.date() == date) {
        total_events += 1;
        *by_hour.entry(event.timestamp.hour()).or_insert(0) += 1;

        let action = event.metadata.get("action").map(String::as_str).unwrap_or("");
        match event.category {
            EventCategory::Mail => {
                if action.starts_with("send") || action.starts_with("reply") {
                    mail_sent += 1;
                } else {
                    mail_read += 1;
                }
            }
            EventCategory::Messaging => {
                if action.starts_with("send") {
                    messages_sent += 1;
                }
            }
            EventCategory::Media => media_actions += 1,
            EventCategory::Task => {
                if event.metadata.get("status").map(String::as_str) == Some("completed") {
                    tasks_completed += 1;
                }
            }
            EventCategory::Suggestion | EventCategory::System => {}
        }
    }

    // Ties resolve to the earliest hour so the summary is deterministic.
    let peak_hour = by_hour
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(hour, _)| hour);

    DailySummary {
        date,
        total_events,
        mail_sent,
        mail_read,
        messages_sent,
        media_actions,
        tasks_completed,
        peak_hour,
    }
}
