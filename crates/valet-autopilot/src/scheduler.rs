//! Rule scheduler.
//!
//! One logical timer drives every rule slot: a uniform polling tick
//! evaluates each enabled rule's due-ness against the injected clock and
//! starts the due ones. Invariants:
//!
//! - At most one execution of a given rule is in flight at any time,
//!   regardless of tick frequency or handler duration.
//! - A handler fault is isolated to its rule: logged, recorded as a
//!   failure event, never disabling the rule or crashing the scheduler.
//! - Autonomy changes take effect on the next tick, never retroactively.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::SchedulerError;
use crate::rule::{RuleContext, RuleHandler, RuleOutcome, RuleSchedule, RuleView};
use valet_capability::registry::CapabilityRegistry;
use valet_core::activity::ActivityStore;
use valet_core::config::ValetConfig;
use valet_core::types::{ActivityEvent, AutonomyLevel, EventCategory, Timestamp};
use valet_dispatch::notify::{NotificationSink, RateLimiter};

struct RuleSlot {
    name: String,
    schedule: RuleSchedule,
    enabled: bool,
    last_run: Option<Timestamp>,
    handler: Arc<dyn RuleHandler>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a run ends, panicking handlers included.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Interval-driven background rule engine.
pub struct RuleScheduler {
    rules: Mutex<Vec<RuleSlot>>,
    registry: Arc<CapabilityRegistry>,
    store: Arc<ActivityStore>,
    notifier: Arc<dyn NotificationSink>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    autonomy: Mutex<AutonomyLevel>,
    config: ValetConfig,
    tick_period: Duration,
    grace: Duration,
    shutdown: Notify,
    stopping: AtomicBool,
    inflight: tokio::sync::Mutex<JoinSet<()>>,
}

impl RuleScheduler {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        store: Arc<ActivityStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: ValetConfig,
    ) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            registry,
            store,
            notifier,
            limiter: Arc::new(RateLimiter::new(config.notification.max_per_minute)),
            clock,
            autonomy: Mutex::new(config.scheduler.autonomy),
            tick_period: Duration::from_secs(config.scheduler.tick_seconds),
            grace: Duration::from_secs(config.scheduler.shutdown_grace_seconds),
            config,
            shutdown: Notify::new(),
            stopping: AtomicBool::new(false),
            inflight: tokio::sync::Mutex::new(JoinSet::new()),
        }
    }

    // =========================================================================
    // Registration and operations
    // =========================================================================

    /// Register a rule. New rules start enabled.
    pub fn register_rule(
        &self,
        name: impl Into<String>,
        schedule: RuleSchedule,
        handler: Arc<dyn RuleHandler>,
    ) -> Result<(), SchedulerError> {
        let name = name.into();
        let mut rules = lock(&self.rules);
        if rules.iter().any(|r| r.name == name) {
            return Err(SchedulerError::DuplicateRule(name));
        }
        info!(rule = %name, "Rule registered");
        rules.push(RuleSlot {
            name,
            schedule,
            enabled: true,
            last_run: None,
            handler,
            in_flight: Arc::new(AtomicBool::new(false)),
        });
        Ok(())
    }

    pub fn enable(&self, name: &str) -> Result<(), SchedulerError> {
        self.with_slot(name, |slot| slot.enabled = true)
    }

    pub fn disable(&self, name: &str) -> Result<(), SchedulerError> {
        self.with_slot(name, |slot| slot.enabled = false)
    }

    pub fn set_interval(&self, name: &str, interval: Duration) -> Result<(), SchedulerError> {
        self.with_slot(name, |slot| {
            slot.schedule = RuleSchedule::every_seconds(interval.as_secs().max(1));
        })
    }

    pub fn set_daily_at(&self, name: &str, hour: u8, minute: u8) -> Result<(), SchedulerError> {
        self.with_slot(name, |slot| {
            slot.schedule = RuleSchedule::daily_at(hour, minute);
        })
    }

    /// Change the process-wide autonomy level. Takes effect on the next
    /// tick, never retroactively.
    pub fn set_autonomy(&self, level: AutonomyLevel) {
        *lock(&self.autonomy) = level;
        info!(autonomy = %level, "Autonomy level changed");
    }

    pub fn autonomy(&self) -> AutonomyLevel {
        *lock(&self.autonomy)
    }

    pub fn rule(&self, name: &str) -> Result<RuleView, SchedulerError> {
        lock(&self.rules)
            .iter()
            .find(|r| r.name == name)
            .map(view)
            .ok_or_else(|| SchedulerError::UnknownRule(name.to_string()))
    }

    pub fn rules(&self) -> Vec<RuleView> {
        lock(&self.rules).iter().map(view).collect()
    }

    fn with_slot(
        &self,
        name: &str,
        f: impl FnOnce(&mut RuleSlot),
    ) -> Result<(), SchedulerError> {
        let mut rules = lock(&self.rules);
        let slot = rules
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| SchedulerError::UnknownRule(name.to_string()))?;
        f(slot);
        Ok(())
    }

    // =========================================================================
    // Tick loop
    // =========================================================================

    /// Run the scheduler loop until shutdown is signalled, then drain
    /// in-flight rules up to the grace period.
    pub async fn run(&self) {
        info!(tick = ?self.tick_period, "Rule scheduler started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.tick_period) => {
                    self.tick().await;
                    self.reap().await;
                }
                _ = self.shutdown.notified() => break,
            }
        }
        self.drain().await;
        info!("Rule scheduler stopped");
    }

    /// Evaluate every rule's due-ness once and start the due ones.
    ///
    /// Public so tests (and embedders with their own loops) can drive
    /// time explicitly through the injected clock.
    pub async fn tick(&self) {
        if self.stopping.load(Ordering::SeqCst) {
            return;
        }
        let autonomy = self.autonomy();
        if autonomy == AutonomyLevel::Minimal {
            // Manual trigger only.
            return;
        }
        let now = self.clock.now();

        let due: Vec<(String, Arc<dyn RuleHandler>, Arc<AtomicBool>)> = {
            let mut rules = lock(&self.rules);
            rules
                .iter_mut()
                .filter_map(|slot| {
                    if !slot.enabled || !slot.schedule.is_due(slot.last_run, now) {
                        return None;
                    }
                    if slot.in_flight.swap(true, Ordering::SeqCst) {
                        // Still running from an earlier tick; skip, and do
                        // not touch last_run.
                        return None;
                    }
                    slot.last_run = Some(now);
                    Some((
                        slot.name.clone(),
                        Arc::clone(&slot.handler),
                        Arc::clone(&slot.in_flight),
                    ))
                })
                .collect()
        };

        for (name, handler, in_flight) in due {
            let ctx = self.context(now, autonomy);
            let store = Arc::clone(&self.store);
            let notifier = Arc::clone(&self.notifier);
            let limiter = Arc::clone(&self.limiter);
            let clock = Arc::clone(&self.clock);

            let mut inflight = self.inflight.lock().await;
            inflight.spawn(async move {
                let _guard = InFlightGuard(in_flight);
                let result = handler.run(&ctx).await;
                apply_outcome(&store, notifier.as_ref(), &limiter, clock.now(), &name, result)
                    .await;
            });
        }
    }

    /// Run one rule immediately, bypassing schedule and autonomy gating.
    ///
    /// Still enforces single-flight: a rule that is already running is an
    /// `AlreadyRunning` error, not a second execution.
    pub async fn trigger(&self, name: &str) -> Result<(), SchedulerError> {
        if self.stopping.load(Ordering::SeqCst) {
            return Err(SchedulerError::ShuttingDown);
        }
        let now = self.clock.now();
        let autonomy = self.autonomy();

        let (handler, in_flight) = {
            let mut rules = lock(&self.rules);
            let slot = rules
                .iter_mut()
                .find(|r| r.name == name)
                .ok_or_else(|| SchedulerError::UnknownRule(name.to_string()))?;
            if slot.in_flight.swap(true, Ordering::SeqCst) {
                return Err(SchedulerError::AlreadyRunning(name.to_string()));
            }
            slot.last_run = Some(now);
            (Arc::clone(&slot.handler), Arc::clone(&slot.in_flight))
        };

        let _guard = InFlightGuard(in_flight);
        let ctx = self.context(now, autonomy);
        let result = handler.run(&ctx).await;
        apply_outcome(
            &self.store,
            self.notifier.as_ref(),
            &self.limiter,
            self.clock.now(),
            name,
            result,
        )
        .await;
        Ok(())
    }

    /// Signal shutdown: no new ticks are issued; `run` drains in-flight
    /// rules up to the grace period and then abandons them. An abandoned
    /// rule that eventually completes still writes its events, which
    /// readers must tolerate as late.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Await completed rule tasks without blocking on the running ones.
    async fn reap(&self) {
        let mut inflight = self.inflight.lock().await;
        while inflight.try_join_next().is_some() {}
    }

    async fn drain(&self) {
        let mut inflight = self.inflight.lock().await;
        let all_done = tokio::time::timeout(self.grace, async {
            while inflight.join_next().await.is_some() {}
        })
        .await;
        if all_done.is_err() {
            warn!(
                abandoned = inflight.len(),
                "Shutdown grace period expired; abandoning in-flight rules"
            );
            inflight.detach_all();
        }
    }

    fn context(&self, now: Timestamp, autonomy: AutonomyLevel) -> RuleContext {
        RuleContext {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            analytics: self.config.analytics.clone(),
            autonomy,
            now,
            invoke_timeout: Duration::from_secs(self.config.dispatch.invoke_timeout_seconds),
        }
    }
}

/// Append a run's events and deliver its notifications; record a failure
/// event when the handler erred. Failures never propagate.
async fn apply_outcome(
    store: &ActivityStore,
    notifier: &dyn NotificationSink,
    limiter: &RateLimiter,
    now: Timestamp,
    rule_name: &str,
    result: valet_core::Result<RuleOutcome>,
) {
    match result {
        Ok(outcome) => {
            for event in outcome.events {
                store.append(event);
            }
            for message in outcome.notifications {
                if limiter.try_acquire(now) {
                    notifier.notify(&message).await;
                } else {
                    warn!(rule = %rule_name, "Notification rate-limited; dropped");
                }
            }
        }
        Err(err) => {
            warn!(rule = %rule_name, "Rule failed: {}", err);
            store.append(
                ActivityEvent::new(
                    now,
                    "system",
                    EventCategory::System,
                    "rule_failed",
                    err.to_string(),
                )
                .with_metadata("rule", rule_name)
                .with_metadata("status", "failure"),
            );
        }
    }
}

fn view(slot: &RuleSlot) -> RuleView {
    RuleView {
        name: slot.name.clone(),
        schedule: slot.schedule,
        enabled: slot.enabled,
        last_run: slot.last_run,
        running: slot.in_flight.load(Ordering::SeqCst),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use valet_dispatch::notify::ChannelSink;

    // 2023-11-14 00:00:00 UTC
    const DAY_START: i64 = 1_699_920_000;

    struct CountingRule {
        runs: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl CountingRule {
        fn new(delay: Duration) -> (Arc<Self>, Arc<AtomicUsize>) {
            let runs = Arc::new(AtomicUsize::new(0));
            (
                Arc::new(Self {
                    runs: Arc::clone(&runs),
                    delay,
                }),
                runs,
            )
        }
    }

    #[async_trait]
    impl RuleHandler for CountingRule {
        async fn run(&self, _ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(RuleOutcome::default())
        }
    }

    struct FailingRule;

    #[async_trait]
    impl RuleHandler for FailingRule {
        async fn run(&self, _ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
            Err(valet_core::ValetError::Capability(
                "adapter went away".to_string(),
            ))
        }
    }

    struct NotifyingRule {
        messages: Vec<String>,
    }

    #[async_trait]
    impl RuleHandler for NotifyingRule {
        async fn run(&self, ctx: &RuleContext) -> valet_core::Result<RuleOutcome> {
            Ok(RuleOutcome {
                events: vec![ActivityEvent::new(
                    ctx.now,
                    "system",
                    EventCategory::Suggestion,
                    "suggestion",
                    "check the inbox",
                )],
                notifications: self.messages.clone(),
            })
        }
    }

    struct Harness {
        scheduler: Arc<RuleScheduler>,
        clock: Arc<ManualClock>,
        store: Arc<ActivityStore>,
    }

    fn harness() -> Harness {
        harness_with(ValetConfig::default())
    }

    fn harness_with(config: ValetConfig) -> Harness {
        let clock = Arc::new(ManualClock::new(Timestamp(DAY_START)));
        let store = Arc::new(ActivityStore::new());
        let scheduler = Arc::new(RuleScheduler::new(
            Arc::new(CapabilityRegistry::new()),
            Arc::clone(&store),
            Arc::new(valet_dispatch::notify::TracingSink),
            clock.clone(),
            config,
        ));
        Harness {
            scheduler,
            clock,
            store,
        }
    }

    async fn settle(scheduler: &RuleScheduler) {
        // Give spawned rule tasks a moment to finish, then reap them.
        tokio::time::sleep(Duration::from_millis(30)).await;
        scheduler.reap().await;
    }

    // ---- registration and operations ----

    #[tokio::test]
    async fn test_register_duplicate_rule_fails() {
        let h = harness();
        let (rule, _) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(1), rule.clone())
            .unwrap();
        let err = h
            .scheduler
            .register_rule("r", RuleSchedule::every_minutes(5), rule)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateRule(_)));
    }

    #[tokio::test]
    async fn test_operations_on_unknown_rule_fail() {
        let h = harness();
        assert!(matches!(
            h.scheduler.enable("ghost").unwrap_err(),
            SchedulerError::UnknownRule(_)
        ));
        assert!(matches!(
            h.scheduler.disable("ghost").unwrap_err(),
            SchedulerError::UnknownRule(_)
        ));
        assert!(matches!(
            h.scheduler
                .set_interval("ghost", Duration::from_secs(60))
                .unwrap_err(),
            SchedulerError::UnknownRule(_)
        ));
        assert!(matches!(
            h.scheduler.trigger("ghost").await.unwrap_err(),
            SchedulerError::UnknownRule(_)
        ));
    }

    // ---- due-ness and firing ----

    #[tokio::test]
    async fn test_rule_fires_when_due_and_not_before() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(15), rule)
            .unwrap();

        // Never run: first tick fires
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // 10 minutes later: not due
        h.clock.advance_secs(600);
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // 15 minutes past the first run: due again
        h.clock.advance_secs(300);
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_rule_never_fires_until_reenabled() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(1), rule)
            .unwrap();
        h.scheduler.disable("r").unwrap();

        for _ in 0..5 {
            h.clock.advance_secs(120);
            h.scheduler.tick().await;
        }
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        h.scheduler.enable("r").unwrap();
        h.clock.advance_secs(120);
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_set_interval_reshapes_dueness() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(60), rule)
            .unwrap();

        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Hourly rule would not fire after 2 minutes; shorten it
        h.scheduler
            .set_interval("r", Duration::from_secs(60))
            .unwrap();
        h.clock.advance_secs(120);
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    // ---- single-flight ----

    #[tokio::test]
    async fn test_single_flight_per_rule() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::from_millis(200));
        h.scheduler
            .register_rule("slow", RuleSchedule::every_seconds(60), rule)
            .unwrap();

        h.scheduler.tick().await;
        // Let the spawned handler start its long run.
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Advance far past the interval and tick repeatedly while it is
        // still in flight.
        for _ in 0..5 {
            h.clock.advance_secs(600);
            h.scheduler.tick().await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // After it completes, the next due tick fires again.
        tokio::time::sleep(Duration::from_millis(250)).await;
        h.scheduler.reap().await;
        h.clock.advance_secs(600);
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_trigger_enforces_single_flight() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::from_millis(200));
        h.scheduler
            .register_rule("slow", RuleSchedule::every_seconds(60), rule)
            .unwrap();

        h.scheduler.tick().await; // starts the rule in the background
        let err = h.scheduler.trigger("slow").await.unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyRunning(_)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        h.scheduler.reap().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    // ---- autonomy gating ----

    #[tokio::test]
    async fn test_minimal_autonomy_runs_nothing_automatically() {
        let mut config = ValetConfig::default();
        config.scheduler.autonomy = AutonomyLevel::Minimal;
        let h = harness_with(config);

        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(1), rule)
            .unwrap();

        for _ in 0..10 {
            h.clock.advance_secs(3600);
            h.scheduler.tick().await;
        }
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        // Manual trigger still executes
        h.scheduler.trigger("r").await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_autonomy_change_applies_on_next_tick() {
        let mut config = ValetConfig::default();
        config.scheduler.autonomy = AutonomyLevel::Minimal;
        let h = harness_with(config);

        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(1), rule)
            .unwrap();

        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        h.scheduler.set_autonomy(AutonomyLevel::Normal);
        assert_eq!(h.scheduler.autonomy(), AutonomyLevel::Normal);
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    // ---- failure isolation ----

    #[tokio::test]
    async fn test_failing_rule_is_isolated_and_logged() {
        let h = harness();
        let (ok_rule, ok_runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("bad", RuleSchedule::every_minutes(1), Arc::new(FailingRule))
            .unwrap();
        h.scheduler
            .register_rule("good", RuleSchedule::every_minutes(1), ok_rule)
            .unwrap();

        h.scheduler.tick().await;
        settle(&h.scheduler).await;

        // The healthy rule ran despite the failure next door.
        assert_eq!(ok_runs.load(Ordering::SeqCst), 1);

        // The failure was recorded as an activity event.
        let events = h.store.query(Timestamp(0), Timestamp(i64::MAX), None);
        let failure = events.iter().find(|e| e.title == "rule_failed").unwrap();
        assert_eq!(failure.metadata.get("rule").unwrap(), "bad");
        assert!(failure.content.contains("adapter went away"));

        // The failing rule stays enabled and will be retried when due.
        assert!(h.scheduler.rule("bad").unwrap().enabled);
    }

    // ---- outcomes: events and notifications ----

    #[tokio::test]
    async fn test_outcome_events_appended_and_notifications_delivered() {
        let (sink, mut rx) = ChannelSink::new(8);
        let clock = Arc::new(ManualClock::new(Timestamp(DAY_START)));
        let store = Arc::new(ActivityStore::new());
        let scheduler = RuleScheduler::new(
            Arc::new(CapabilityRegistry::new()),
            Arc::clone(&store),
            Arc::new(sink),
            clock,
            ValetConfig::default(),
        );

        scheduler
            .register_rule(
                "suggest",
                RuleSchedule::every_minutes(1),
                Arc::new(NotifyingRule {
                    messages: vec!["check the inbox".to_string()],
                }),
            )
            .unwrap();

        scheduler.trigger("suggest").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "check the inbox");
        let events = store.query(Timestamp(0), Timestamp(i64::MAX), None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, EventCategory::Suggestion);
    }

    #[tokio::test]
    async fn test_notification_rate_limit_drops_excess() {
        let (sink, mut rx) = ChannelSink::new(16);
        let clock = Arc::new(ManualClock::new(Timestamp(DAY_START)));
        let mut config = ValetConfig::default();
        config.notification.max_per_minute = 2;
        let scheduler = RuleScheduler::new(
            Arc::new(CapabilityRegistry::new()),
            Arc::new(ActivityStore::new()),
            Arc::new(sink),
            clock,
            config,
        );

        scheduler
            .register_rule(
                "noisy",
                RuleSchedule::every_minutes(1),
                Arc::new(NotifyingRule {
                    messages: vec!["one".into(), "two".into(), "three".into()],
                }),
            )
            .unwrap();

        scheduler.trigger("noisy").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "one");
        assert_eq!(rx.recv().await.unwrap(), "two");
        assert!(rx.try_recv().is_err());
    }

    // ---- run loop and shutdown ----

    #[tokio::test]
    async fn test_run_loop_shuts_down_promptly() {
        let mut config = ValetConfig::default();
        config.scheduler.tick_seconds = 1;
        let h = harness_with(config);

        let scheduler = Arc::clone(&h.scheduler);
        let handle = tokio::spawn(async move { scheduler.run().await });

        h.scheduler.shutdown();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler should stop within timeout")
            .unwrap();
        assert!(h.scheduler.is_stopping());
    }

    #[tokio::test]
    async fn test_shutdown_abandons_rules_past_grace() {
        let mut config = ValetConfig::default();
        config.scheduler.shutdown_grace_seconds = 0;
        let h = harness_with(config);

        let (rule, runs) = CountingRule::new(Duration::from_secs(30));
        h.scheduler
            .register_rule("glacial", RuleSchedule::every_minutes(1), rule)
            .unwrap();

        h.scheduler.tick().await; // starts the 30s handler
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let scheduler = Arc::clone(&h.scheduler);
        let handle = tokio::spawn(async move { scheduler.run().await });
        h.scheduler.shutdown();

        // With zero grace, run() must not wait the full 30 seconds.
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("shutdown should abandon the in-flight rule")
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_new_work_after_shutdown() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(1), rule)
            .unwrap();

        h.scheduler.shutdown();
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        assert!(matches!(
            h.scheduler.trigger("r").await.unwrap_err(),
            SchedulerError::ShuttingDown
        ));
    }

    // ---- views ----

    #[tokio::test]
    async fn test_rule_view_reflects_state() {
        let h = harness();
        let (rule, _) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("r", RuleSchedule::every_minutes(15), rule)
            .unwrap();

        let before = h.scheduler.rule("r").unwrap();
        assert!(before.enabled);
        assert!(before.last_run.is_none());
        assert!(!before.running);

        h.scheduler.tick().await;
        settle(&h.scheduler).await;

        let after = h.scheduler.rule("r").unwrap();
        assert_eq!(after.last_run, Some(Timestamp(DAY_START)));
        assert!(!after.running);
        assert_eq!(h.scheduler.rules().len(), 1);
    }

    #[tokio::test]
    async fn test_daily_rule_fires_once_per_day_via_ticks() {
        let h = harness();
        let (rule, runs) = CountingRule::new(Duration::ZERO);
        h.scheduler
            .register_rule("summary", RuleSchedule::daily_at(18, 0), rule)
            .unwrap();

        // Morning ticks: nothing
        h.clock.set(Timestamp(DAY_START + 9 * 3600));
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        // 18:00 tick fires
        h.clock.set(Timestamp(DAY_START + 18 * 3600));
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Later the same evening: nothing
        h.clock.set(Timestamp(DAY_START + 21 * 3600));
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Tomorrow evening: fires again
        h.clock.set(Timestamp(DAY_START + 86_400 + 18 * 3600 + 30));
        h.scheduler.tick().await;
        settle(&h.scheduler).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
