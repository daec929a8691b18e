//! Behavior pattern detection.
//!
//! Finds recurring time clusters in an activity window: "mail around
//! 09:00", "media on Fridays". Deterministic given the same snapshot.

use std::collections::HashMap;

use crate::types::{ActivitySnapshot, Pattern, PatternKind};
use valet_core::types::EventCategory;

/// Detect recurring (category, hour-of-day) and (category, day-of-week)
/// clusters with at least `min_count` occurrences.
///
/// Ordering is deterministic: count descending, hour clusters before
/// weekday clusters, then category name, then slot.
pub fn detect_patterns(snapshot: &ActivitySnapshot, min_count: u32) -> Vec<Pattern> {
    let min_count = min_count.max(1);

    let mut by_hour: HashMap<(EventCategory, u8), u32> = HashMap::new();
    let mut by_weekday: HashMap<(EventCategory, u8), u32> = HashMap::new();

    for event in &snapshot.events {
        *by_hour
            .entry((event.category, event.timestamp.hour()))
            .or_insert(0) += 1;
        *by_weekday
            .entry((event.category, event.timestamp.weekday()))
            .or_insert(0) += 1;
    }

    let mut patterns: Vec<Pattern> = by_hour
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .map(|((category, slot), count)| Pattern {
            kind: PatternKind::HourOfDay,
            category,
            slot,
            count,
        })
        .chain(
            by_weekday
                .into_iter()
                .filter(|(_, count)| *count >= min_count)
                .map(|((category, slot), count)| Pattern {
                    kind: PatternKind::DayOfWeek,
                    category,
                    slot,
                    count,
                }),
        )
        .collect();

    patterns.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
            .then_with(|| a.category.to_string().cmp(&b.category.to_string()))
            .then_with(|| a.slot.cmp(&b.slot))
    });
    patterns
}

fn kind_rank(kind: PatternKind) -> u8 {
    match kind {
        PatternKind::HourOfDay => 0,
        PatternKind::DayOfWeek => 1,
    }
}
