//! Productivity scoring.

use crate::types::ActivitySnapshot;

/// Productivity score in `[0, 100]`.
///
/// Base 50, plus the day's activity volume capped at 30, plus 2 points
/// per completed task, clamped. Pure and always derivable from a
/// snapshot; never persisted as authoritative state.
pub fn productivity_score(snapshot: &ActivitySnapshot) -> u8 {
    let base: i64 = 50;
    let activity_term = (snapshot.today_count() as i64).min(30);
    let task_term = 2 * i64::from(snapshot.completed_tasks);
    (base + activity_term + task_term).clamp(0, 100) as u8
}
