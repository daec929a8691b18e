//! Intent router.
//!
//! Resolves a parsed intent to a capability provider, enforces the
//! confirmation gate, executes with a per-call timeout, and appends the
//! outcome to the activity log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::DispatchError;
use crate::intent::Intent;
use valet_capability::provider::CapabilityProvider;
use valet_capability::registry::CapabilityRegistry;
use valet_capability::CapabilityError;
use valet_core::activity::ActivityStore;
use valet_core::config::DispatchConfig;
use valet_core::types::{ActivityEvent, EventCategory, ExecutionResult, Timestamp};

/// The fixed set of mutating actions.
///
/// Mutating actions are gated behind confirmation unless the intent is
/// imperative; everything else executes without confirmation. Extend here
/// when an adapter introduces a new send/delete/modify-type action.
pub const MUTATING_ACTIONS: &[&str] = &[
    "send_email",
    "reply_email",
    "send_message",
    "delete_media",
    "upload_media",
];

/// Whether an action mutates external state.
pub fn is_mutating(action: &str) -> bool {
    MUTATING_ACTIONS.contains(&action)
}

/// Routes intents to providers under the confirmation gate.
///
/// Safe to invoke concurrently from multiple input sources; each dispatch
/// is independent and every provider call runs in its own cancellable
/// task.
pub struct IntentRouter {
    registry: Arc<CapabilityRegistry>,
    store: Arc<ActivityStore>,
    default_timeout: Duration,
    accepting: AtomicBool,
}

impl IntentRouter {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        store: Arc<ActivityStore>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            registry,
            store,
            default_timeout: Duration::from_secs(config.invoke_timeout_seconds),
            accepting: AtomicBool::new(true),
        }
    }

    /// Dispatch with the configured default timeout budget.
    pub async fn dispatch(&self, intent: &Intent) -> ExecutionResult {
        self.dispatch_with_timeout(intent, self.default_timeout)
            .await
    }

    /// Dispatch with an explicit per-call timeout budget.
    ///
    /// Every dispatch appends exactly one activity event, success or
    /// failure alike. The exception is a pure confirmation preview, which
    /// appends none because nothing has happened yet.
    pub async fn dispatch_with_timeout(
        &self,
        intent: &Intent,
        timeout: Duration,
    ) -> ExecutionResult {
        if !self.accepting.load(Ordering::SeqCst) {
            // Rejected before entering the pipeline; no event.
            return ExecutionResult::failure(DispatchError::ShuttingDown.to_string());
        }

        let provider = match self.resolve(intent) {
            Ok(provider) => provider,
            Err(err) => {
                let result = ExecutionResult::failure(err.to_string());
                self.append_outcome("system", EventCategory::System, intent, &result);
                return result;
            }
        };

        // Confirmation gate: mutating actions need an explicit directive.
        if !intent.imperative && is_mutating(&intent.action) {
            let preview = provider.describe(&intent.action, &intent.target, &intent.params);
            info!(action = %intent.action, capability = %provider.name(), "Awaiting confirmation");
            return ExecutionResult::needs_confirmation(format!("Confirm: {}", preview));
        }

        let result = self.execute(Arc::clone(&provider), intent, timeout).await;
        self.append_outcome(provider.name(), provider.category(), intent, &result);
        result
    }

    /// Stop accepting new dispatches. In-flight dispatches finish on their
    /// own timelines.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Resolve the provider for an intent.
    ///
    /// An explicit capability name wins; otherwise the first *currently
    /// available* provider declaring the action, in registration order.
    fn resolve(&self, intent: &Intent) -> Result<Arc<dyn CapabilityProvider>, DispatchError> {
        if let Some(name) = &intent.capability {
            return Ok(self.registry.find(name)?);
        }
        self.registry
            .find_by_action(&intent.action)
            .into_iter()
            .find(|p| CapabilityRegistry::probe(p.as_ref()))
            .ok_or_else(|| CapabilityError::NoCapableProvider(intent.action.clone()).into())
    }

    /// Run the provider call in its own task, bounded by `timeout`.
    ///
    /// A hung provider is aborted and surfaced as a plain "timeout"
    /// failure; it never blocks the caller past the budget.
    async fn execute(
        &self,
        provider: Arc<dyn CapabilityProvider>,
        intent: &Intent,
        timeout: Duration,
    ) -> ExecutionResult {
        let action = intent.action.clone();
        let target = intent.target.clone();
        let params = intent.params.clone();

        let mut handle = tokio::spawn(async move {
            provider.invoke(&action, &target, &params, timeout).await
        });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(cap_err))) => ExecutionResult::failure(cap_err.to_string()),
            Ok(Err(join_err)) => {
                warn!(action = %intent.action, "Provider task failed: {}", join_err);
                ExecutionResult::failure(format!("provider task failed: {}", join_err))
            }
            Err(_) => {
                handle.abort();
                warn!(action = %intent.action, "Provider call exceeded its budget");
                ExecutionResult::failure(DispatchError::Timeout.to_string())
            }
        }
    }

    fn append_outcome(
        &self,
        source: &str,
        category: EventCategory,
        intent: &Intent,
        result: &ExecutionResult,
    ) {
        let event = ActivityEvent::new(
            Timestamp::now(),
            source,
            category,
            intent.action.clone(),
            result.message.clone(),
        )
        .with_metadata("action", intent.action.clone())
        .with_metadata("target", intent.target.clone())
        .with_metadata("status", result.status.to_string());
        self.store.append(event);
    }
}
