//! Mail capability adapter.
//!
//! Fronts the desktop mail client: sending, replying, inbox reads, and
//! unread counts.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::provider::{ensure_supported, ActionParams, CapabilityProvider};
use valet_core::types::{EventCategory, ExecutionResult};

const ACTIONS: &[&str] = &[
    "send_email",
    "reply_email",
    "read_inbox",
    "unread_count",
    "search",
];

/// A sent email, retained for inspection.
#[derive(Clone, Debug)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Adapter for the mail application.
pub struct MailProvider {
    available: AtomicBool,
    unread: AtomicU32,
    sent: Mutex<Vec<SentEmail>>,
}

impl MailProvider {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            unread: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Seed the unread counter (what the external client would report).
    pub fn with_unread(unread: u32) -> Self {
        let provider = Self::new();
        provider.unread.store(unread, Ordering::SeqCst);
        provider
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_unread(&self, unread: u32) {
        self.unread.store(unread, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn last_sent(&self) -> Option<SentEmail> {
        self.sent.lock().ok().and_then(|s| s.last().cloned())
    }
}

impl Default for MailProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for MailProvider {
    fn name(&self) -> &str {
        "Mail"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn supported_actions(&self) -> &[&str] {
        ACTIONS
    }

    fn category(&self) -> EventCategory {
        EventCategory::Mail
    }

    fn describe(&self, action: &str, target: &str, params: &ActionParams) -> String {
        match action {
            "send_email" => {
                let subject = params.get("subject").map(String::as_str).unwrap_or("");
                format!("Send email to {} with subject \"{}\"", target, subject)
            }
            "reply_email" => format!("Reply to email {}", target),
            "read_inbox" => "Read recent inbox messages".to_string(),
            "unread_count" => "Count unread emails".to_string(),
            "search" => {
                let query = params.get("query").map(String::as_str).unwrap_or("");
                format!("Search mail for \"{}\"", query)
            }
            other => format!("Mail: {}", other),
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
            "send_email" => {
                if target.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "send_email requires a recipient".to_string(),
                    ));
                }
                let subject = params.get("subject").cloned().unwrap_or_default();
                let body = params.get("body").cloned().unwrap_or_default();
                if let Ok(mut sent) = self.sent.lock() {
                    sent.push(SentEmail {
                        to: target.to_string(),
                        subject: subject.clone(),
                        body,
                    });
                }
                tracing::info!(to = %target, subject = %subject, "Email sent");
                Ok(ExecutionResult::success(format!("Email sent to {}", target)))
            }
            "reply_email" => {
                if target.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "reply_email requires an email id".to_string(),
                    ));
                }
                tracing::info!(email = %target, "Reply sent");
                Ok(ExecutionResult::success(format!("Replied to {}", target)))
            }
            "read_inbox" => {
                let limit: usize = params
                    .get("limit")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10);
                Ok(ExecutionResult::success(format!(
                    "Fetched {} inbox messages",
                    limit
                ))
                .with_payload(serde_json::json!({ "limit": limit })))
            }
            "unread_count" => {
                let unread = self.unread.load(Ordering::SeqCst);
                Ok(
                    ExecutionResult::success(format!("{} unread emails", unread))
                        .with_payload(serde_json::json!({ "unread": unread })),
                )
            }
            "search" => {
                let query = params.get("query").cloned().unwrap_or_default();
                if query.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "search requires a query".to_string(),
                    ));
                }
                Ok(ExecutionResult::success(format!("Searched mail for \"{}\"", query)))
            }
            _ => unreachable!("ensure_supported covers the action set"),
        }
    }
}
