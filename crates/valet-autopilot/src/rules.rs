//! The default rule set.
//!
//! Four built-in rules poll the capability registry and the activity log
//! to surface proactive help: an unread-inbox check, periodic pattern
//! analysis, a media cleanup nudge, and the end-of-day summary.

use std::sync::Arc;

use async_trait::async_trait;

use crate::rule::{RuleContext, RuleHandler, RuleOutcome, RuleSchedule};
use crate::scheduler::RuleScheduler;
use valet_capability::provider::{ActionParams, CapabilityProvider};
use valet_capability::registry::CapabilityRegistry;
use valet_core::config::{parse_daily_time, SchedulerConfig};
use valet_core::types::{ActivityEvent, EventCategory};
use valet_insight::{daily_summary, scaled_threshold, suggest, ActivitySnapshot};

/// Register the default rules at their configured schedules.
///
/// A malformed daily-summary time is a configuration error, fatal at
/// initialization.
pub fn install_default_rules(
    scheduler: &RuleScheduler,
    config: &SchedulerConfig,
) -> valet_core::Result<()> {
    let (hour, minute) = parse_daily_time(&config.daily_summary_time)?;

    scheduler.register_rule(
        "inbox_check",
        RuleSchedule::every_minutes(config.inbox_check_minutes),
        Arc::new(InboxCheckRule),
    )?;
    scheduler.register_rule(
        "pattern_analysis",
        RuleSchedule::every_minutes(config.pattern_analysis_minutes),
        Arc::new(PatternAnalysisRule),
    )?;
    scheduler.register_rule(
        "media_cleanup",
        RuleSchedule::every_minutes(config.media_cleanup_minutes),
        Arc::new(MediaCleanupRule),
    )?;
    scheduler.register_rule(
        "daily_summary",
        RuleSchedule::daily_at(hour, minute),
        Arc::new(DailySummaryRule),
    )?;
    Ok(())
}

/// First currently-available provider declaring `action`, if any.
fn first_available(
    registry: &CapabilityRegistry,
    action: &str,
) -> Option<Arc<dyn CapabilityProvider>> {
    registry
        .find_by_action(action)
        .into_iter()
        .find(|p| CapabilityRegistry::probe(p.as_ref()))
}

fn suggestion_event(ctx: &RuleContext, rule: &str, content: String) -> ActivityEvent {
    ActivityEvent::new(
        ctx.now,
        "system",
        EventCategory::Suggestion,
        rule,
        content,
    )
    .with_metadata("rule", rule)
}

/// Checks the mail capability's unread count and nudges past a threshold.
pub struct InboxCheckRule;

#[async_trait]
impl RuleHandler for InboxCheckRule {
    async fn run(&self, ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
        let mut outcome = RuleOutcome::default();
        let Some(provider) = first_available(&ctx.registry, "unread_count") else {
            // No live mail capability; nothing to report.
            return Ok(outcome);
        };

        let result = provider
            .invoke("unread_count", "", &ActionParams::new(), ctx.invoke_timeout)
            .await?;
        let unread = result
            .payload
            .as_ref()
            .and_then(|p| p.get("unread"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let threshold = scaled_threshold(ctx.analytics.unread_backlog_threshold, ctx.autonomy);
        if unread >= u64::from(threshold) {
            let text = format!("{} unread emails are waiting", unread);
            outcome
                .events
                .push(suggestion_event(ctx, "inbox_check", text.clone()));
            outcome.notifications.push(text);
        }
        Ok(outcome)
    }
}

/// Runs analytics over the recent window and forwards every suggestion.
pub struct PatternAnalysisRule;

#[async_trait]
impl RuleHandler for PatternAnalysisRule {
    async fn run(&self, ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
        let snapshot =
            ActivitySnapshot::capture(&ctx.store, ctx.now, ctx.analytics.window_days)?;
        let suggestions = suggest(&snapshot, ctx.autonomy, ctx.now, &ctx.analytics);

        let mut outcome = RuleOutcome::default();
        for suggestion in suggestions {
            outcome.events.push(suggestion_event(
                ctx,
                "pattern_analysis",
                suggestion.text.clone(),
            ));
            outcome.notifications.push(suggestion.text);
        }
        Ok(outcome)
    }
}

/// Suggests cleaning the media library when recent volume is high.
pub struct MediaCleanupRule;

#[async_trait]
impl RuleHandler for MediaCleanupRule {
    async fn run(&self, ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
        let mut outcome = RuleOutcome::default();
        let Some(provider) = first_available(&ctx.registry, "list_recent") else {
            return Ok(outcome);
        };

        let result = provider
            .invoke("list_recent", "", &ActionParams::new(), ctx.invoke_timeout)
            .await?;
        let count = result
            .payload
            .as_ref()
            .and_then(|p| p.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let threshold = scaled_threshold(ctx.analytics.media_cleanup_threshold, ctx.autonomy);
        if count >= u64::from(threshold) {
            let text = format!("{} recent media items; worth a cleanup pass?", count);
            outcome
                .events
                .push(suggestion_event(ctx, "media_cleanup", text.clone()));
            outcome.notifications.push(text);
        }
        Ok(outcome)
    }
}

/// Summarizes the day's activity in one notification.
pub struct DailySummaryRule;

#[async_trait]
impl RuleHandler for DailySummaryRule {
    async fn run(&self, ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
        let snapshot = ActivitySnapshot::capture(&ctx.store, ctx.now, 1)?;
        let summary = daily_summary(&snapshot, ctx.now.date());

        let text = summary.describe();
        let event = ActivityEvent::new(
            ctx.now,
            "system",
            EventCategory::System,
            "daily_summary",
            text.clone(),
        )
        .with_metadata("rule", "daily_summary");

        Ok(RuleOutcome {
            events: vec![event],
            notifications: vec![text],
        })
    }
}
