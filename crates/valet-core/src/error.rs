use thiserror::Error;

/// Top-level error type for the Valet system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for ValetError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Insight error: {0}")]
    Insight(String),

    #[error("Activity log error: {0}")]
    Activity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<toml::de::Error> for ValetError {
    fn from(err: toml::de::Error) -> Self {
        ValetError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ValetError {
    fn from(err: toml::ser::Error) -> Self {
        ValetError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ValetError {
    fn from(err: serde_json::Error) -> Self {
        ValetError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Valet operations.
pub type Result<T> = std::result::Result<T, ValetError>;
