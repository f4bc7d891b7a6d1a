//! Serenity-backed platform collaborators.

use crate::DiscordError;
use crate::conversions::{ToSerenity, reaction_type};
use async_trait::async_trait;
use rolebot_core::{ChannelId, GuildId, MessageId, ReactionEvent, RoleId, UserId};
use rolebot_error::EngineResult;
use rolebot_interface::{GatewayClient, RoleChange, RoleStateClient};
use serenity::http::Http;
use serenity::model::guild::{Member, Role};
use std::sync::Arc;
use tracing::{debug, instrument};

const AUDIT_REASON: &str = "Reaction role";

/// Discord REST access for the engine.
///
/// Member state is always fetched fresh; nothing here trusts the gateway
/// cache for role decisions.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    /// Wrap a shared serenity HTTP client.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn member(&self, guild_id: GuildId, user_id: UserId) -> EngineResult<Member> {
        Ok(self
            .http
            .get_member(guild_id.to_serenity(), user_id.to_serenity())
            .await
            .map_err(DiscordError::from)?)
    }

    fn holds(member: &Member, role_id: RoleId) -> bool {
        member.roles.contains(&role_id.to_serenity())
    }
}

/// Highest-ranked role among `(role, position)` pairs, using Discord's
/// ordering: higher position wins, and on equal positions the lower id wins.
pub fn highest_ranked(ranked: impl IntoIterator<Item = (RoleId, u16)>) -> Option<RoleId> {
    ranked
        .into_iter()
        .max_by(|(a_id, a_pos), (b_id, b_pos)| a_pos.cmp(b_pos).then_with(|| b_id.cmp(a_id)))
        .map(|(role_id, _)| role_id)
}

fn held_positions(roles: &[Role], member: &Member) -> Vec<(RoleId, u16)> {
    roles
        .iter()
        .filter(|role| member.roles.contains(&role.id))
        .map(|role| (RoleId::new(role.id.get()), role.position))
        .collect()
}

#[async_trait]
impl RoleStateClient for SerenityPlatform {
    #[instrument(skip(self))]
    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> EngineResult<RoleChange> {
        let member = self.member(guild_id, user_id).await?;
        if Self::holds(&member, role_id) {
            debug!("Member already holds role");
            return Ok(RoleChange::Unchanged);
        }

        self.http
            .add_member_role(
                guild_id.to_serenity(),
                user_id.to_serenity(),
                role_id.to_serenity(),
                Some(AUDIT_REASON),
            )
            .await
            .map_err(DiscordError::from)?;
        Ok(RoleChange::Applied)
    }

    #[instrument(skip(self))]
    async fn remove_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> EngineResult<RoleChange> {
        let member = self.member(guild_id, user_id).await?;
        if !Self::holds(&member, role_id) {
            debug!("Member does not hold role");
            return Ok(RoleChange::Unchanged);
        }

        self.http
            .remove_member_role(
                guild_id.to_serenity(),
                user_id.to_serenity(),
                role_id.to_serenity(),
                Some(AUDIT_REASON),
            )
            .await
            .map_err(DiscordError::from)?;
        Ok(RoleChange::Applied)
    }

    #[instrument(skip(self))]
    async fn highest_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> EngineResult<Option<RoleId>> {
        let member = self.member(guild_id, user_id).await?;
        if member.roles.is_empty() {
            return Ok(None);
        }

        let roles = self
            .http
            .get_guild_roles(guild_id.to_serenity())
            .await
            .map_err(DiscordError::from)?;
        Ok(highest_ranked(held_positions(&roles, &member)))
    }
}

#[async_trait]
impl GatewayClient for SerenityPlatform {
    #[instrument(skip(self))]
    async fn is_bot(&self, user_id: UserId) -> EngineResult<bool> {
        let user = self
            .http
            .get_user(user_id.to_serenity())
            .await
            .map_err(DiscordError::from)?;
        Ok(user.bot)
    }

    #[instrument(skip(self))]
    async fn fetch_message(&self, channel_id: ChannelId, message_id: MessageId) -> EngineResult<()> {
        self.http
            .get_message(channel_id.to_serenity(), message_id.to_serenity())
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }

    #[instrument(skip(self, event), fields(message_id = %event.message_id, user_id = %event.user_id))]
    async fn retract_reaction(&self, event: &ReactionEvent) -> EngineResult<()> {
        self.http
            .delete_reaction(
                event.channel_id.to_serenity(),
                event.message_id.to_serenity(),
                event.user_id.to_serenity(),
                &reaction_type(&event.emoji),
            )
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_ranked_prefers_position() {
        let ranked = [
            (RoleId::new(10), 1),
            (RoleId::new(20), 7),
            (RoleId::new(30), 3),
        ];
        assert_eq!(highest_ranked(ranked), Some(RoleId::new(20)));
    }

    #[test]
    fn test_highest_ranked_ties_go_to_lower_id() {
        let ranked = [(RoleId::new(30), 4), (RoleId::new(10), 4)];
        assert_eq!(highest_ranked(ranked), Some(RoleId::new(10)));
    }

    #[test]
    fn test_highest_ranked_of_nothing() {
        assert_eq!(highest_ranked(Vec::new()), None);
    }
}
