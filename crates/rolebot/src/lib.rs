//! Rolebot: Discord reaction roles with a join-role handoff.
//!
//! Members react to a published folder message to receive roles. New
//! members get provisional join roles, which are taken away shortly after
//! their first reaction role lands.
//!
//! This crate wires the workspace together and re-exports its public API.

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::{RolebotConfig, required_env};
pub use logging::{LoggingConfig, init_logging};

pub use rolebot_cache::{BindingCache, CacheStats, SharedBindingCache};
pub use rolebot_core::*;
pub use rolebot_database::{PgReactRoleStore, establish_pool, run_migrations};
pub use rolebot_engine::{EngineContext, EngineTiming, ReactionRoleEngine};
pub use rolebot_error::{ConfigError, RolebotError, RolebotErrorKind, RolebotResult};
pub use rolebot_interface::{GatewayClient, ReactRoleStore, RoleStateClient};
pub use rolebot_social::{CommandConfig, RolebotBot};
