//! Proactive notification delivery.
//!
//! The scheduler hands messages to a `NotificationSink` fire-and-forget:
//! delivery failures are logged and dropped, never raised back. A
//! token-bucket limiter keeps rules from flooding the foreground.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use valet_core::types::Timestamp;

/// Delivers proactive messages to the foreground.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Fire-and-forget delivery. Implementations must not panic; a
    /// foreground that is not listening is a log line, not an error.
    async fn notify(&self, message: &str);
}

/// Sink that writes notifications to the log. The default when no
/// foreground is attached.
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, message: &str) {
        info!(notification = %message, "Notification");
    }
}

/// Sink that forwards notifications to a bounded channel the foreground
/// drains. A full or closed channel drops the message.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn notify(&self, message: &str) {
        if let Err(e) = self.tx.try_send(message.to_string()) {
            warn!("Notification dropped (foreground not listening): {}", e);
        }
    }
}

/// Token-bucket rate limiter for notification delivery.
///
/// Prevents notification flooding by limiting to N deliveries per minute.
/// Time is passed in by the caller so scheduling tests stay deterministic.
pub struct RateLimiter {
    max_per_minute: u32,
    state: Mutex<LimiterState>,
}

struct LimiterState {
    remaining: u32,
    window_start: i64,
}

impl RateLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            state: Mutex::new(LimiterState {
                remaining: max_per_minute,
                window_start: i64::MIN,
            }),
        }
    }

    /// Try to acquire a delivery token at time `now`. Returns `false` when
    /// rate-limited.
    pub fn try_acquire(&self, now: Timestamp) -> bool {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now.0 - state.window_start >= 60 {
            state.remaining = self.max_per_minute;
            state.window_start = now.0;
        }
        if state.remaining > 0 {
            state.remaining -= 1;
            true
        } else {
            false
        }
    }
}
