//! Error types for capability registration and invocation.

use valet_core::error::ValetError;

/// Errors from the capability registry and provider invocations.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),
    #[error("Capability not found: {0}")]
    NotFound(String),
    #[error("No available provider for action: {0}")]
    NoCapableProvider(String),
    #[error("Capability {capability} does not support action: {action}")]
    UnsupportedAction { capability: String, action: String },
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl From<CapabilityError> for ValetError {
    fn from(err: CapabilityError) -> Self {
        ValetError::Capability(err.to_string())
    }
}
