//! Background rule engine for Valet.
//!
//! Runs named, schedule-driven rules concurrently with the interactive
//! dispatch path: polling capability adapters, feeding activity snapshots
//! through analytics, and surfacing proactive suggestions. Time is
//! injected through the `Clock` trait so schedules are deterministic in
//! tests.

pub mod clock;
pub mod error;
pub mod rule;
pub mod rules;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SchedulerError;
pub use rule::{RuleContext, RuleHandler, RuleOutcome, RuleSchedule, RuleView};
pub use rules::{
    install_default_rules, DailySummaryRule, InboxCheckRule, MediaCleanupRule, PatternAnalysisRule,
};
pub use scheduler::RuleScheduler;
