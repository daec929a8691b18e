//! Error types for the dispatch path.

use valet_capability::error::CapabilityError;
use valet_core::error::ValetError;

/// Errors from intent routing.
///
/// The router surfaces these to callers as failed `ExecutionResult`s, not
/// as process faults; the enum exists so internal stages compose with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Shutdown in progress")]
    ShuttingDown,
    /// Provider exceeded its per-call budget. Never retried automatically;
    /// retry policy is the caller's decision.
    #[error("timeout")]
    Timeout,
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl From<DispatchError> for ValetError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::ShuttingDown => ValetError::ShuttingDown,
            other => ValetError::Dispatch(other.to_string()),
        }
    }
}
