//! Core data types for Rolebot.
//!
//! This crate provides the typed records shared by the cache, the
//! persistence layer and the reconciliation engine. Every record is fully
//! populated; there are no partially-filled role or folder shapes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binding;
mod emoji;
mod event;
mod folder;
mod ids;

pub use binding::{JoinRole, MessageBinding, ReactMessage, RoleBinding, RoleBindingBuilder};
pub use emoji::EmojiKey;
pub use event::{Direction, MemberJoin, RawReactionEvent, ReactionEvent, RoleDeleted};
pub use folder::{Folder, FolderId, FolderSummary};
pub use ids::{ChannelId, GuildId, MessageId, RoleId, UserId};
