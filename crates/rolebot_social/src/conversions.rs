//! Conversions between serenity models and Rolebot records.

use rolebot_core::{
    ChannelId, Direction, EmojiKey, GuildId, MessageId, RawReactionEvent, RoleId, UserId,
};
use serenity::model::channel::{Reaction, ReactionType};
use serenity::model::id as sid;

/// Conversion into the serenity id of the same entity.
pub(crate) trait ToSerenity {
    /// Serenity id type
    type Id;

    /// Convert.
    fn to_serenity(self) -> Self::Id;
}

macro_rules! to_serenity {
    ($($ours:ty => $theirs:ty),* $(,)?) => {
        $(
            impl ToSerenity for $ours {
                type Id = $theirs;

                fn to_serenity(self) -> $theirs {
                    <$theirs>::new(self.get())
                }
            }
        )*
    };
}

to_serenity! {
    GuildId => sid::GuildId,
    ChannelId => sid::ChannelId,
    MessageId => sid::MessageId,
    UserId => sid::UserId,
    RoleId => sid::RoleId,
}

/// Raw event from a serenity reaction payload.
pub fn raw_reaction(reaction: &Reaction, direction: Direction) -> RawReactionEvent {
    let (emoji_id, emoji_name) = match &reaction.emoji {
        ReactionType::Custom { id, name, .. } => (Some(id.get()), name.clone()),
        ReactionType::Unicode(text) => (None, Some(text.clone())),
        _ => (None, None),
    };

    RawReactionEvent {
        guild_id: reaction.guild_id.map(|g| GuildId::new(g.get())),
        channel_id: ChannelId::new(reaction.channel_id.get()),
        message_id: MessageId::new(reaction.message_id.get()),
        user_id: reaction.user_id.map(|u| UserId::new(u.get())),
        emoji_id,
        emoji_name,
        user_is_bot: reaction.member.as_ref().map(|m| m.user.bot),
        direction,
    }
}

/// Reaction type addressing an emoji key.
///
/// Discord resolves custom emoji by id, so the name is a placeholder.
pub fn reaction_type(emoji: &EmojiKey) -> ReactionType {
    match emoji {
        EmojiKey::Custom(id) => ReactionType::Custom {
            animated: false,
            id: sid::EmojiId::new(*id),
            name: Some("_".to_string()),
        },
        EmojiKey::Unicode(text) => ReactionType::Unicode(text.clone()),
    }
}
