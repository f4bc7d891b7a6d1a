//! Normalization and filtering of raw reaction events.

use crate::{EngineContext, FolderRegistry};
use rolebot_core::{EmojiKey, GuildId, MessageId, RawReactionEvent, ReactionEvent};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Why a raw event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum IgnoreReason {
    /// Reaction outside a guild
    #[display("not in a guild")]
    NoGuild,
    /// Payload without a user
    #[display("no user")]
    NoUser,
    /// Reaction by a bot account
    #[display("bot user")]
    Bot,
    /// Message carries no reaction bindings
    #[display("not a react message")]
    NotReactMessage,
    /// Emoji carries neither an id nor a name
    #[display("unresolvable emoji")]
    UnresolvableEmoji,
    /// A lookup needed to decide failed
    #[display("lookup failed")]
    LookupFailed,
    /// The engine stopped before the event was routed
    #[display("engine shut down")]
    ShuttingDown,
}

/// Result of routing a raw event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The event is relevant and canonical
    Accepted(ReactionEvent),
    /// The event was dropped
    Ignored(IgnoreReason),
}

impl RouteDecision {
    /// The canonical event, if accepted.
    pub fn accepted(&self) -> Option<&ReactionEvent> {
        match self {
            Self::Accepted(event) => Some(event),
            Self::Ignored(_) => None,
        }
    }
}

/// Turns gateway payloads into canonical reaction events.
///
/// Routing never mutates role state. The engine routes the events of a
/// guild one at a time in arrival order, and applies the settling delay
/// that follows an accepted event on the guild queue, so ordering is
/// preserved across lookups and while events wait.
#[derive(Debug, Clone)]
pub struct EventRouter {
    ctx: Arc<EngineContext>,
    registry: FolderRegistry,
}

impl EventRouter {
    /// Create a router over a shared context.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        let registry = FolderRegistry::new(ctx.clone());
        Self { ctx, registry }
    }

    /// Decide whether a raw event is relevant and canonicalize it.
    #[instrument(
        skip(self, raw),
        fields(guild_id = ?raw.guild_id, message_id = %raw.message_id, direction = %raw.direction)
    )]
    pub async fn route(&self, raw: RawReactionEvent) -> RouteDecision {
        let Some(guild_id) = raw.guild_id else {
            return RouteDecision::Ignored(IgnoreReason::NoGuild);
        };
        let Some(user_id) = raw.user_id else {
            return RouteDecision::Ignored(IgnoreReason::NoUser);
        };
        if raw.user_is_bot == Some(true) {
            return RouteDecision::Ignored(IgnoreReason::Bot);
        }

        match self.is_react_message(guild_id, raw.message_id, &raw).await {
            Ok(true) => {}
            Ok(false) => return RouteDecision::Ignored(IgnoreReason::NotReactMessage),
            Err(reason) => return RouteDecision::Ignored(reason),
        }

        let Some(emoji) = EmojiKey::from_parts(raw.emoji_id, raw.emoji_name.as_deref()) else {
            return RouteDecision::Ignored(IgnoreReason::UnresolvableEmoji);
        };

        if raw.user_is_bot.is_none() {
            match self.ctx.gateway().is_bot(user_id).await {
                Ok(false) => {}
                Ok(true) => return RouteDecision::Ignored(IgnoreReason::Bot),
                Err(e) => {
                    warn!(%user_id, error = %e, "Could not resolve reacting user");
                    return RouteDecision::Ignored(IgnoreReason::LookupFailed);
                }
            }
        }

        RouteDecision::Accepted(ReactionEvent {
            guild_id,
            channel_id: raw.channel_id,
            message_id: raw.message_id,
            user_id,
            emoji,
            direction: raw.direction,
        })
    }

    /// Membership check, materializing first-seen messages.
    async fn is_react_message(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        raw: &RawReactionEvent,
    ) -> Result<bool, IgnoreReason> {
        {
            let cache = self.ctx.cache().read();
            if cache.has_seen_message(guild_id, message_id) {
                return Ok(cache.is_react_message(guild_id, message_id));
            }
        }

        debug!("First sighting of message, fetching");
        if let Err(e) = self
            .ctx
            .gateway()
            .fetch_message(raw.channel_id, message_id)
            .await
        {
            if e.is_not_found() {
                self.registry.mark_message_seen(guild_id, message_id);
                return Ok(false);
            }
            warn!(error = %e, "Could not fetch message");
            return Err(IgnoreReason::LookupFailed);
        }

        self.registry
            .hydrate_message(guild_id, message_id)
            .await
            .map_err(|e| {
                warn!(error = %e, "Could not load bindings for message");
                IgnoreReason::LookupFailed
            })
    }
}
