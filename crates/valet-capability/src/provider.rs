//! The capability provider contract.
//!
//! Every app adapter (mail, messaging, media, and anything the surrounding
//! project bolts on) implements `CapabilityProvider`. The core never
//! inspects adapter internals; it only sees the fixed contract below.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use valet_core::types::{EventCategory, ExecutionResult};

/// Parameter map passed to an invocation.
pub type ActionParams = HashMap<String, String>;

/// An adapter exposing a fixed action set against one external app.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Lightweight liveness probe.
    ///
    /// Must not panic in a well-behaved adapter; any internal fault is
    /// caught and reported as `false`. The registry contains panicking
    /// probes as a last resort.
    fn is_available(&self) -> bool;

    /// The actions this adapter declares. Fixed for the adapter's lifetime.
    fn supported_actions(&self) -> &[&str];

    /// Activity category for events produced by this adapter.
    fn category(&self) -> EventCategory;

    /// Human-readable preview of what `invoke` would do, used as
    /// confirmation text. Must not perform the action.
    fn describe(&self, action: &str, target: &str, params: &ActionParams) -> String;

    /// Perform `action` against `target`.
    ///
    /// `timeout` is the caller's latency budget; adapters doing their own
    /// I/O should bound sub-operations with it. Fails with
    /// `UnsupportedAction` if `action` is not declared.
    async fn invoke(
        &self,
        action: &str,
        target: &str,
        params: &ActionParams,
        timeout: Duration,
    ) -> Result<ExecutionResult, CapabilityError>;
}

impl std::fmt::Debug for dyn CapabilityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityProvider")
            .field("name", &self.name())
            .finish()
    }
}

/// Helper for adapters: reject undeclared actions with `UnsupportedAction`.
pub fn ensure_supported(
    provider: &dyn CapabilityProvider,
    action: &str,
) -> Result<(), CapabilityError> {
    if provider.supported_actions().contains(&action) {
        Ok(())
    } else {
        Err(CapabilityError::UnsupportedAction {
            capability: provider.name().to_string(),
            action: action.to_string(),
        })
    }
}

/// Snapshot of one registered provider's identity and current availability.
///
/// Availability is the predicate's value at snapshot time; it is never
/// cached past a single call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub actions: Vec<String>,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl CapabilityProvider for Fixed {
        fn name(&self) -> &str {
            "Fixed"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn supported_actions(&self) -> &[&str] {
            &["ping"]
        }
        fn category(&self) -> EventCategory {
            EventCategory::System
        }
        fn describe(&self, action: &str, target: &str, _params: &ActionParams) -> String {
            format!("{} {}", action, target)
        }
        async fn invoke(
            &self,
            action: &str,
            _target: &str,
            _params: &ActionParams,
            _timeout: Duration,
        ) -> Result<ExecutionResult, CapabilityError> {
            ensure_supported(self, action)?;
            Ok(ExecutionResult::success("pong"))
        }
    }

    #[tokio::test]
    async fn test_ensure_supported_accepts_declared_action() {
        let provider = Fixed;
        let result = provider
            .invoke("ping", "", &ActionParams::new(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_ensure_supported_rejects_undeclared_action() {
        let provider = Fixed;
        let err = provider
            .invoke("explode", "", &ActionParams::new(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CapabilityError::UnsupportedAction { ref action, .. } if action == "explode"
        ));
    }

    #[test]
    fn test_descriptor_serde_round_trip() {
        let desc = CapabilityDescriptor {
            name: "Mail".to_string(),
            actions: vec!["send_email".to_string(), "read_inbox".to_string()],
            available: true,
        };
        let json = serde_json::to_string(&desc).unwrap();
        let rt: CapabilityDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.name, "Mail");
        assert_eq!(rt.actions.len(), 2);
        assert!(rt.available);
    }
}
