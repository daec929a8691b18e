//! Error types for the rule scheduler.

use valet_core::error::ValetError;

/// Errors from scheduler operations.
///
/// Caller errors (unknown names, double triggers) surface as failed
/// results; nothing here ever terminates the process.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),
    #[error("Rule already registered: {0}")]
    DuplicateRule(String),
    #[error("Rule already running: {0}")]
    AlreadyRunning(String),
    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<SchedulerError> for ValetError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::ShuttingDown => ValetError::ShuttingDown,
            other => ValetError::Scheduler(other.to_string()),
        }
    }
}
