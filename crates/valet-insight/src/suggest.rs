//! Proactive suggestion generation.
//!
//! Pure mapping from a snapshot, the autonomy level, and the current time
//! to advisory strings. The scheduler decides what to do with them; this
//! module performs no side effects.

use crate::patterns::detect_patterns;
use crate::types::{ActivitySnapshot, PatternKind, Suggestion, SuggestionKind};
use valet_core::config::AnalyticsConfig;
use valet_core::types::{AutonomyLevel, EventCategory, Timestamp};

/// Generate suggestions from a snapshot at time `now`.
///
/// At `AutonomyLevel::Maximum` thresholds are halved so suggestions fire
/// more readily; the multiplier affects sensitivity only, never rule
/// intervals. Output order is fixed, so results are deterministic for a
/// given snapshot and time.
pub fn suggest(
    snapshot: &ActivitySnapshot,
    autonomy: AutonomyLevel,
    now: Timestamp,
    config: &AnalyticsConfig,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    let hour = now.hour();
    let today = now.date();

    // Unusual working hours
    if !(6..22).contains(&hour) {
        suggestions.push(Suggestion::new(
            SuggestionKind::UnusualHour,
            "You are active at an unusual hour; consider wrapping up.",
        ));
    }

    // Day-over-day activity spike
    let today_count = snapshot.today_count();
    let yesterday_count = snapshot.yesterday_count();
    if yesterday_count > 0 && today_count > 2 * yesterday_count {
        suggestions.push(Suggestion::new(
            SuggestionKind::ActivitySpike,
            "Noticeably more activity than yesterday.",
        ));
    }

    // Time-of-day advice
    if (9..=11).contains(&hour) {
        suggestions.push(Suggestion::new(
            SuggestionKind::TimeOfDay,
            "Good window for clearing email.",
        ));
    } else if (14..=16).contains(&hour) {
        suggestions.push(Suggestion::new(
            SuggestionKind::TimeOfDay,
            "Afternoon focus block: a good time for deep work.",
        ));
    }

    // Friday cleanup
    if now.weekday() == 4 {
        suggestions.push(Suggestion::new(
            SuggestionKind::WeeklyCleanup,
            "It's Friday: a good day to tidy the photo library.",
        ));
    }

    // Mail backlog
    let backlog_threshold = scaled_threshold(config.unread_backlog_threshold, autonomy);
    let mail_today = snapshot.count_on(today, Some(EventCategory::Mail));
    if mail_today >= backlog_threshold as usize {
        suggestions.push(Suggestion::new(
            SuggestionKind::MailBacklog,
            format!("{} mail events today; time to clear the inbox?", mail_today),
        ));
    }

    // Habits: the user usually does X at this hour
    let pattern_threshold = scaled_threshold(config.pattern_min_count, autonomy);
    for pattern in detect_patterns(snapshot, pattern_threshold) {
        if pattern.kind == PatternKind::HourOfDay && pattern.slot == hour {
            suggestions.push(Suggestion::new(
                SuggestionKind::Habit,
                format!("You usually handle {} around this hour.", pattern.category),
            ));
        }
    }

    suggestions
}

/// Apply the autonomy sensitivity multiplier to a threshold.
///
/// `Maximum` halves thresholds (rounding up, floor 1); other levels leave
/// them unchanged. The multiplier affects sensitivity only, never
/// intervals.
pub fn scaled_threshold(threshold: u32, autonomy: AutonomyLevel) -> u32 {
    match autonomy {
        AutonomyLevel::Maximum => threshold.div_ceil(2).max(1),
        AutonomyLevel::Minimal | AutonomyLevel::Normal => threshold.max(1),
    }
}
