//! Shared kernel for the Valet desktop automation dispatcher.
//!
//! Defines the domain types, the top-level error, the TOML configuration,
//! and the append-only activity log that every other crate builds on.

pub mod activity;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use activity::{ActivitySink, ActivityStore};
pub use config::ValetConfig;
pub use error::{Result, ValetError};
pub use types::{
    ActivityEvent, AutonomyLevel, EventCategory, ExecutionResult, ExecutionStatus, Timestamp,
};
