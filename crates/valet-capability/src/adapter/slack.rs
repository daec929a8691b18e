//! Slack messaging adapter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::provider::{ensure_supported, ActionParams, CapabilityProvider};
use valet_core::types::{EventCategory, ExecutionResult};

const ACTIONS: &[&str] = &["send_message", "read_messages", "search"];

/// A sent message, retained for inspection.
#[derive(Clone, Debug)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
}

/// Adapter for the Slack desktop client.
pub struct SlackProvider {
    available: AtomicBool,
    sent: Mutex<Vec<SentMessage>>,
}

impl SlackProvider {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn last_sent(&self) -> Option<SentMessage> {
        self.sent.lock().ok().and_then(|s| s.last().cloned())
    }
}

impl Default for SlackProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for SlackProvider {
    fn name(&self) -> &str {
        "Slack"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn supported_actions(&self) -> &[&str] {
        ACTIONS
    }

    fn category(&self) -> EventCategory {
        EventCategory::Messaging
    }

    fn describe(&self, action: &str, target: &str, params: &ActionParams) -> String {
        match action {
            "send_message" => {
                let text = params.get("message").map(String::as_str).unwrap_or("");
                format!("Send Slack message to {}: \"{}\"", target, text)
            }
            "read_messages" => format!("Read recent Slack messages from {}", target),
            "search" => {
                let query = params.get("query").map(String::as_str).unwrap_or("");
                format!("Search Slack for \"{}\"", query)
            }
            other => format!("Slack: {}", other),
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
            "send_message" => {
                if target.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "send_message requires a recipient".to_string(),
                    ));
                }
                let text = params.get("message").cloned().unwrap_or_default();
                if text.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "send_message requires message text".to_string(),
                    ));
                }
                if let Ok(mut sent) = self.sent.lock() {
                    sent.push(SentMessage {
                        recipient: target.to_string(),
                        text: text.clone(),
                    });
                }
                tracing::info!(recipient = %target, "Slack message sent");
                Ok(ExecutionResult::success(format!(
                    "Message sent to {}",
                    target
                )))
            }
            "read_messages" => {
                let limit: usize = params
                    .get("limit")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10);
                Ok(ExecutionResult::success(format!(
                    "Fetched {} messages",
                    limit
                ))
                .with_payload(serde_json::json!({ "limit": limit })))
            }
            "search" => {
                let query = params.get("query").cloned().unwrap_or_default();
                if query.is_empty() {
                    return Err(CapabilityError::InvalidParams(
                        "search requires a query".to_string(),
                    ));
                }
                Ok(ExecutionResult::success(format!(
                    "Searched Slack for \"{}\"",
                    query
                )))
            }
            _ => unreachable!("ensure_supported covers the action set"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ActionParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_send_message_records_and_succeeds() {
        let slack = SlackProvider::new();
        let result = slack
            .invoke(
                "send_message",
                "#general",
                &params(&[("message", "deploy done")]),
                TIMEOUT,
            )
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(slack.sent_count(), 1);
        let sent = slack.last_sent().unwrap();
        assert_eq!(sent.recipient, "#general");
        assert_eq!(sent.text, "deploy done");
    }

    #[tokio::test]
    async fn test_send_message_requires_recipient_and_text() {
        let slack = SlackProvider::new();
        assert!(slack
            .invoke(
                "send_message",
                "",
                &params(&[("message", "hi")]),
                TIMEOUT
            )
            .await
            .is_err());
        assert!(slack
            .invoke("send_message", "#general", &ActionParams::new(), TIMEOUT)
            .await
            .is_err());
        assert_eq!(slack.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_read_messages_default_limit() {
        let slack = SlackProvider::new();
        let result = slack
            .invoke("read_messages", "#general", &ActionParams::new(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(result.payload.unwrap()["limit"], 10);
    }

    #[tokio::test]
    async fn test_unsupported_action() {
        let slack = SlackProvider::new();
        let err = slack
            .invoke("send_email", "x", &ActionParams::new(), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::UnsupportedAction { .. }));
    }

    #[test]
    fn test_describe_send_message() {
        let slack = SlackProvider::new();
        let desc = slack.describe("send_message", "bob", &params(&[("message", "hi")]));
        assert_eq!(desc, "Send Slack message to bob: \"hi\"");
    }

    #[test]
    fn test_category() {
        assert_eq!(SlackProvider::new().category(), EventCategory::Messaging);
    }
}
