//! Reaction-role reconciliation engine.
//!
//! Consumes an unordered, possibly duplicated stream of reaction and
//! membership events and converges each member's platform roles toward the
//! cached configuration.
//!
//! - [`EventRouter`] - filters and canonicalizes raw reaction events
//! - [`RoleMutator`] - grants or revokes the role bound to an emoji
//! - [`JoinRoleReconciler`] - join-role grants and their timed handoff
//! - [`FolderRegistry`] - CRUD over folders, bindings and join roles
//! - [`ReactionRoleEngine`] - per-guild ordered queues tying them together
//!
//! # Example
//!
//! ```no_run
//! use rolebot_engine::{EngineContext, EngineTiming, ReactionRoleEngine};
//! # use rolebot_cache::BindingCache;
//! # use std::sync::Arc;
//! # async fn run(
//! #     store: Arc<dyn rolebot_interface::ReactRoleStore>,
//! #     roles: Arc<dyn rolebot_interface::RoleStateClient>,
//! #     gateway: Arc<dyn rolebot_interface::GatewayClient>,
//! # ) -> rolebot_error::EngineResult<()> {
//! let cache = BindingCache::load(store.as_ref()).await?.into_shared();
//! let ctx = EngineContext::new(cache, store, roles, gateway, EngineTiming::default());
//! let engine = ReactionRoleEngine::new(ctx.into_shared());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod engine;
mod mutator;
mod reconciler;
mod registry;
mod router;
mod scheduler;

pub use config::{EngineTiming, EngineTimingBuilder};
pub use context::EngineContext;
pub use engine::ReactionRoleEngine;
pub use mutator::{MutationOutcome, RoleMutator};
pub use reconciler::{JoinRoleReconciler, JoinRoleReport};
pub use registry::FolderRegistry;
pub use router::{EventRouter, IgnoreReason, RouteDecision};
pub use scheduler::{ScheduledTask, Scheduler};
