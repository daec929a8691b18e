//! Photos media adapter.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::provider::{ensure_supported, ActionParams, CapabilityProvider};
use valet_core::types::{EventCategory, ExecutionResult};

const ACTIONS: &[&str] = &["list_recent", "delete_media", "upload_media", "search"];

/// Adapter for the photo library.
pub struct PhotosProvider {
    available: AtomicBool,
    recent_count: AtomicU32,
    deleted: Mutex<Vec<String>>,
}

impl PhotosProvider {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            recent_count: AtomicU32::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Seed the recent-media counter (what the external library would report).
    pub fn with_recent(count: u32) -> Self {
        let provider = Self::new();
        provider.recent_count.store(count, Ordering::SeqCst);
        provider
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Default for PhotosProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for PhotosProvider {
    fn name(&self) -> &str {
        "Photos"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn supported_actions(&self) -> &[&str] {
        ACTIONS
    }

    fn category(&self) -> EventCategory {
        EventCategory::Media
    }

    fn describe(&self, action: &str, target: &str, params: &ActionParams) -> String {
        match action {
            "list_recent" => {
                let days = params.get("days").map(String::as_str).unwrap_or("7");
                format!("List media from the last {} days", days)
            }
            "delete_media" => format!("Delete media item {}", target),
            "upload_media" => format!("Upload media item {}", target),
            "search" => {
                let query = params.get("query").map(String::as_str).unwrap_or("");
                format!("Search photos for \"{}\"", query)
            }
            other => format!("Photos: {}", other),
        }
    }

    async fn invoke(
        &self,
        action: &str,
        target: &str,
        params: &ActionParams,
        _timeout: Duration,
    ) -> Result<ExecutionResult, CapabilityError> {
        ensure_supported(self, action)?;

        match action {
            "list_recent" => {
                let days: u32 = params.get("days").and_then(|v| v.parse().ok()).unwrap_or(7);
                let count = self.recent_count.load(Ordering::SeqCst);
                Ok(ExecutionResult::success(format!(
                    "{} media items in the last {} days",
                    count, days
                ))
                .with_payload(serde_json::json!({ "count": count, "days": days })))
            }
            "delete_media" => {
                if target.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "delete_media requires a media id".to_string(),
                    ));
                }
                if let Ok(mut deleted) = self.deleted.lock() {
                    deleted.push(target.to_string());
                }
                tracing::info!(media = %target, "Media deleted");
                Ok(ExecutionResult::success(format!("Deleted {}", target)))
            }
            "upload_media" => {
                if target.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "upload_media requires a file path".to_string(),
                    ));
                }
                tracing::info!(media = %target, "Media uploaded");
                Ok(ExecutionResult::success(format!("Uploaded {}", target)))
            }
            "search" => {
                let query = params.get("query").cloned().unwrap_or_default();
                if query.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "search requires a query".to_string(),
                    ));
                }
                Ok(ExecutionResult::success(format!(
                    "Searched photos for \"{}\"",
                    query
                )))
            }
            _ => unreachable!("ensure_supported covers the action set"),
        }
    }
}
