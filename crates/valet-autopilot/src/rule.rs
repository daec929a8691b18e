//! Rule definitions.
//!
//! A rule is a named, schedule-driven unit of background work. Handlers
//! produce events and notification texts; the scheduler owns the side
//! effects of applying them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use valet_capability::registry::CapabilityRegistry;
use valet_core::activity::ActivityStore;
use valet_core::config::AnalyticsConfig;
use valet_core::types::{ActivityEvent, AutonomyLevel, Timestamp};

/// When a rule fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSchedule {
    /// Fire whenever at least `seconds` have elapsed since the last run.
    Every { seconds: u64 },
    /// Fire once per civil day (UTC), at the first tick at or after the
    /// given time.
    DailyAt { hour: u8, minute: u8 },
}

impl RuleSchedule {
    pub fn every_seconds(seconds: u64) -> Self {
        Self::Every { seconds }
    }

    pub fn every_minutes(minutes: u64) -> Self {
        Self::Every {
            seconds: minutes * 60,
        }
    }

    /// Daily fire time. Callers validate bounds (config parsing rejects
    /// malformed times at startup).
    pub fn daily_at(hour: u8, minute: u8) -> Self {
        Self::DailyAt { hour, minute }
    }

    /// Whether a rule with this schedule and `last_run` is due at `now`.
    pub fn is_due(&self, last_run: Option<Timestamp>, now: Timestamp) -> bool {
        match *self {
            RuleSchedule::Every { seconds } => match last_run {
                None => true,
                Some(last) => now.0 - last.0 >= seconds as i64,
            },
            RuleSchedule::DailyAt { hour, minute } => {
                let fire = match now
                    .date()
                    .and_hms_opt(u32::from(hour), u32::from(minute), 0)
                {
                    Some(dt) => dt.and_utc().timestamp(),
                    None => return false,
                };
                if now.0 < fire {
                    return false;
                }
                match last_run {
                    None => true,
                    Some(last) => last.0 < fire,
                }
            }
        }
    }
}

/// What a rule run produced. The scheduler appends the events and
/// delivers the notifications.
#[derive(Debug, Default)]
pub struct RuleOutcome {
    pub events: Vec<ActivityEvent>,
    pub notifications: Vec<String>,
}

/// Everything a rule run may read. Handlers never mutate scheduler state.
#[derive(Clone)]
pub struct RuleContext {
    pub registry: Arc<CapabilityRegistry>,
    pub store: Arc<ActivityStore>,
    pub analytics: AnalyticsConfig,
    pub autonomy: AutonomyLevel,
    pub now: Timestamp,
    pub invoke_timeout: Duration,
}

/// A background unit of work.
#[async_trait]
pub trait RuleHandler: Send + Sync {
    async fn run(&self, ctx: &RuleContext) -> valet_core::Result<RuleOutcome>;
}

/// Read-only view of one registered rule's state.
#[derive(Clone, Debug)]
pub struct RuleView {
    pub name: String,
    pub schedule: RuleSchedule,
    pub enabled: bool,
    pub last_run: Option<Timestamp>,
    pub running: bool,
}
