//! Reaction bindings, react messages and join roles.

use crate::{ChannelId, EmojiKey, GuildId, MessageId, RoleId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Associates one emoji with one grantable role.
///
/// # Examples
///
/// ```
/// use rolebot_core::{EmojiKey, RoleBindingBuilder, RoleId};
///
/// let binding = RoleBindingBuilder::default()
///     .role_id(RoleId::new(2))
///     .role_name("Gamer")
///     .emoji(EmojiKey::Unicode("🎮".into()))
///     .build()
///     .unwrap();
/// assert_eq!(binding.role_name(), "Gamer");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct RoleBinding {
    /// Role granted by the emoji
    role_id: RoleId,
    /// Role name at the time the binding was made
    role_name: String,
    /// Emoji identity
    emoji: EmojiKey,
}

impl RoleBinding {
    /// Create a binding.
    pub fn new(role_id: RoleId, role_name: impl Into<String>, emoji: EmojiKey) -> Self {
        Self {
            role_id,
            role_name: role_name.into(),
            emoji,
        }
    }
}

/// A message that carries reaction affordances.
///
/// Membership in the react-message set is what makes a reaction relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactMessage {
    /// Owning guild
    pub guild_id: GuildId,
    /// Channel the message lives in
    pub channel_id: ChannelId,
    /// The message itself
    pub message_id: MessageId,
}

/// A role binding placed on a specific react message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBinding {
    /// Message carrying the reaction
    pub message: ReactMessage,
    /// Emoji to role mapping on that message
    pub binding: RoleBinding,
}

/// Provisional role granted on join.
///
/// Assumed, never verified, to rank below every reaction-grantable role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinRole {
    /// The provisional role
    pub role_id: RoleId,
}

impl From<RoleId> for JoinRole {
    fn from(role_id: RoleId) -> Self {
        Self { role_id }
    }
}
