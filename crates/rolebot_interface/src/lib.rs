//! Trait definitions for the collaborators the Rolebot engine depends on.
//!
//! The engine never talks to Discord or PostgreSQL directly. It sees:
//! - [`ReactRoleStore`] - durable folders, bindings, react messages and join roles
//! - [`RoleStateClient`] - the authoritative per-member role set on the platform
//! - [`GatewayClient`] - message, user and reaction lookups on the platform

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod platform;
mod store;

pub use platform::{GatewayClient, RoleChange, RoleStateClient};
pub use store::ReactRoleStore;
