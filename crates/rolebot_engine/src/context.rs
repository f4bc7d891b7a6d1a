//! Shared engine state.

use crate::{EngineTiming, Scheduler};
use derive_getters::Getters;
use rolebot_cache::SharedBindingCache;
use rolebot_interface::{GatewayClient, ReactRoleStore, RoleStateClient};
use std::fmt;
use std::sync::Arc;

/// Everything the engine components need, passed explicitly.
///
/// One context is built at startup and shared behind an `Arc` by the
/// router, the mutator, the reconciler and the registry.
#[derive(Clone, Getters)]
pub struct EngineContext {
    /// Binding cache
    cache: SharedBindingCache,
    /// Durable configuration store
    store: Arc<dyn ReactRoleStore>,
    /// Member role state on the platform
    roles: Arc<dyn RoleStateClient>,
    /// Message, user and reaction lookups on the platform
    gateway: Arc<dyn GatewayClient>,
    /// Reconciliation delays
    timing: EngineTiming,
    /// Delayed task runner
    scheduler: Scheduler,
}

impl EngineContext {
    /// Assemble a context with a fresh scheduler.
    pub fn new(
        cache: SharedBindingCache,
        store: Arc<dyn ReactRoleStore>,
        roles: Arc<dyn RoleStateClient>,
        gateway: Arc<dyn GatewayClient>,
        timing: EngineTiming,
    ) -> Self {
        Self {
            cache,
            store,
            roles,
            gateway,
            timing,
            scheduler: Scheduler::new(),
        }
    }

    /// Wrap the context for sharing.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("cache", &self.cache.read().stats())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
