//! Remote platform collaborators.

use async_trait::async_trait;
use rolebot_core::{ChannelId, GuildId, MessageId, ReactionEvent, RoleId, UserId};
use rolebot_error::EngineResult;
use serde::{Deserialize, Serialize};

/// Outcome of an idempotent role mutation.
///
/// Adding a held role or removing an absent one is `Unchanged`, which
/// callers treat as success.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum RoleChange {
    /// The member's role set changed
    Applied,
    /// The member's role set already matched the request
    Unchanged,
}

/// Source of truth for member role state.
///
/// All calls are suspension points and all are fallible.
#[async_trait]
pub trait RoleStateClient: Send + Sync {
    /// Grant a role to a member.
    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> EngineResult<RoleChange>;

    /// Revoke a role from a member.
    async fn remove_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> EngineResult<RoleChange>;

    /// The member's highest-ranked role, freshly fetched.
    ///
    /// `None` when the member holds no roles besides `@everyone`.
    async fn highest_role(&self, guild_id: GuildId, user_id: UserId)
    -> EngineResult<Option<RoleId>>;
}

/// Gateway-side lookups needed to decide whether an event is relevant.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Whether the user is a bot account.
    async fn is_bot(&self, user_id: UserId) -> EngineResult<bool>;

    /// Materialize a message the gateway referenced before it was cached.
    ///
    /// Returns a `NotFound` error when the message no longer exists.
    async fn fetch_message(&self, channel_id: ChannelId, message_id: MessageId)
    -> EngineResult<()>;

    /// Retract the user's reaction described by `event`.
    async fn retract_reaction(&self, event: &ReactionEvent) -> EngineResult<()>;
}
