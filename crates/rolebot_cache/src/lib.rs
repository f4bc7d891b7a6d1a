//! Binding cache for reaction roles.
//!
//! This crate holds the in-memory view of a guild's reaction-role
//! configuration: which messages carry reaction affordances, which emoji on
//! those messages map to which role, the ordered folder list, folder
//! contents and join roles. It is populated from the persistence
//! collaborator at boot and mutated only by the folder registry.

#![warn(missing_docs)]

mod cache;
mod load;

pub use cache::{
    BindingCache, CacheStats, RolePurge, SEEN_MESSAGES_PER_GUILD, SharedBindingCache,
};
