//! Capability registry.
//!
//! Holds every registered provider and answers "who can do X".
//! Registration is a one-time startup step; the provider set is immutable
//! for the process lifetime. Availability is re-evaluated on every call,
//! never cached past a single dispatch.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::error::CapabilityError;
use crate::provider::{CapabilityDescriptor, CapabilityProvider};

/// Registry of capability providers, in registration order.
///
/// Registration order is the tie-break when the router must pick a
/// provider automatically, so lookups stay deterministic and reproducible
/// in tests.
pub struct CapabilityRegistry {
    providers: RwLock<Vec<Arc<dyn CapabilityProvider>>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
        }
    }

    /// Register a provider. Fails with `DuplicateCapability` if a provider
    /// with the same name already exists.
    pub fn register(&self, provider: Arc<dyn CapabilityProvider>) -> Result<(), CapabilityError> {
        let mut providers = self.write_lock();
        if providers.iter().any(|p| p.name() == provider.name()) {
            return Err(CapabilityError::DuplicateCapability(
                provider.name().to_string(),
            ));
        }
        tracing::info!(capability = %provider.name(), "Capability registered");
        providers.push(provider);
        Ok(())
    }

    /// Look up a provider by name.
    pub fn find(&self, name: &str) -> Result<Arc<dyn CapabilityProvider>, CapabilityError> {
        self.read_lock()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound(name.to_string()))
    }

    /// All providers declaring `action`, in registration order.
    ///
    /// Availability is NOT checked here; callers that need a live provider
    /// filter with [`CapabilityRegistry::probe`] at the moment of use.
    pub fn find_by_action(&self, action: &str) -> Vec<Arc<dyn CapabilityProvider>> {
        self.read_lock()
            .iter()
            .filter(|p| p.supported_actions().contains(&action))
            .cloned()
            .collect()
    }

    /// Snapshot of providers whose availability predicate currently
    /// returns true.
    ///
    /// May be expensive: it invokes each provider's liveness check. A
    /// check that panics is contained and the provider reported
    /// unavailable; the fault never propagates upward.
    pub fn list_available(&self) -> Vec<Arc<dyn CapabilityProvider>> {
        self.read_lock()
            .iter()
            .filter(|p| Self::probe(p.as_ref()))
            .cloned()
            .collect()
    }

    /// Identity and current availability of every registered provider.
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        self.read_lock()
            .iter()
            .map(|p| CapabilityDescriptor {
                name: p.name().to_string(),
                actions: p
                    .supported_actions()
                    .iter()
                    .map(|a| a.to_string())
                    .collect(),
                available: Self::probe(p.as_ref()),
            })
            .collect()
    }

    /// Evaluate a provider's availability predicate, containing panics.
    pub fn probe(provider: &dyn CapabilityProvider) -> bool {
        match std::panic::catch_unwind(AssertUnwindSafe(|| provider.is_available())) {
            Ok(available) => available,
            Err(_) => {
                warn!(capability = %provider.name(), "Availability probe panicked; reporting unavailable");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn CapabilityProvider>>> {
        self.providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn CapabilityProvider>>> {
        self.providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
