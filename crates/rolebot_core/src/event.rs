//! Gateway events as consumed by the engine.

use crate::{ChannelId, EmojiKey, GuildId, MessageId, RoleId, UserId};
use serde::{Deserialize, Serialize};

/// Whether a reaction was added or removed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Direction {
    /// Reaction added
    Add,
    /// Reaction removed
    Remove,
}

/// Reaction event as delivered by the gateway, possibly duplicated or
/// referencing entities not yet cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReactionEvent {
    /// Guild, absent for direct messages
    pub guild_id: Option<GuildId>,
    /// Channel of the reacted message
    pub channel_id: ChannelId,
    /// Reacted message
    pub message_id: MessageId,
    /// Reacting user, absent on some malformed payloads
    pub user_id: Option<UserId>,
    /// Custom emoji id
    pub emoji_id: Option<u64>,
    /// Emoji name or unicode text
    pub emoji_name: Option<String>,
    /// Bot flag when the gateway included member data
    pub user_is_bot: Option<bool>,
    /// Add or remove
    pub direction: Direction,
}

/// Normalized reaction event handed to the role mutator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Guild owning the react message
    pub guild_id: GuildId,
    /// Channel of the react message
    pub channel_id: ChannelId,
    /// React message
    pub message_id: MessageId,
    /// Reacting user
    pub user_id: UserId,
    /// Binding lookup key
    pub emoji: EmojiKey,
    /// Add or remove
    pub direction: Direction,
}

/// A member joined a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberJoin {
    /// Joined guild
    pub guild_id: GuildId,
    /// New member
    pub user_id: UserId,
}

/// A role was deleted on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleDeleted {
    /// Guild the role belonged to
    pub guild_id: GuildId,
    /// Deleted role
    pub role_id: RoleId,
}
