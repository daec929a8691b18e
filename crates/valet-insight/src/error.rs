use valet_core::error::ValetError;

/// Errors from snapshot construction.
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("Snapshot window must be at least one day, got {0}")]
    InvalidWindow(u32),
}

impl From<InsightError> for ValetError {
    fn from(err: InsightError) -> Self {
        ValetError::Insight(err.to_string())
    }
}
