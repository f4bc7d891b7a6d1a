//! Serenity event handler feeding the reaction-role engine.

use crate::commands::CommandExecutor;
use crate::conversions::raw_reaction;
use rolebot_core::{Direction, GuildId, MemberJoin, RoleDeleted, RoleId, UserId};
use rolebot_engine::ReactionRoleEngine;
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::guild::{Guild, Member, Role, UnavailableGuild};
use serenity::model::id as sid;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Engine and command executor, installed once the client exists.
pub(crate) struct Dispatch {
    pub(crate) engine: Arc<ReactionRoleEngine>,
    pub(crate) commands: CommandExecutor,
}

/// Event handler for the Rolebot Discord bot.
///
/// The engine needs the client's HTTP handle, so it is installed after the
/// client is built. Events that arrive before that are dropped.
pub struct RolebotHandler {
    dispatch: Arc<OnceLock<Dispatch>>,
}

impl RolebotHandler {
    pub(crate) fn new(dispatch: Arc<OnceLock<Dispatch>>) -> Self {
        Self { dispatch }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn dispatch(&self) -> Option<&Dispatch> {
        let dispatch = self.dispatch.get();
        if dispatch.is_none() {
            warn!("Event received before the engine was installed");
        }
        dispatch
    }

    async fn reaction(&self, reaction: &Reaction, direction: Direction) {
        let Some(dispatch) = self.dispatch() else {
            return;
        };
        dispatch
            .engine
            .handle_reaction(raw_reaction(reaction, direction))
            .await;
    }
}

#[async_trait]
impl EventHandler for RolebotHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "Bot connected to Discord"
        );
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        self.reaction(&reaction, Direction::Add).await;
    }

    async fn reaction_remove(&self, _ctx: Context, reaction: Reaction) {
        self.reaction(&reaction, Direction::Remove).await;
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        if new_member.user.bot {
            debug!(user_id = %new_member.user.id, "Bot joined, no join roles");
            return;
        }
        let Some(dispatch) = self.dispatch() else {
            return;
        };
        info!(
            guild_id = %new_member.guild_id,
            user_id = %new_member.user.id,
            "Member joined guild"
        );
        dispatch.engine.handle_member_join(MemberJoin {
            guild_id: GuildId::new(new_member.guild_id.get()),
            user_id: UserId::new(new_member.user.id.get()),
        });
    }

    async fn guild_role_delete(
        &self,
        _ctx: Context,
        guild_id: sid::GuildId,
        removed_role_id: sid::RoleId,
        _removed_role_data_if_available: Option<Role>,
    ) {
        let Some(dispatch) = self.dispatch() else {
            return;
        };
        info!(%guild_id, role_id = %removed_role_id, "Role deleted");
        dispatch
            .engine
            .handle_role_deleted(RoleDeleted {
                guild_id: GuildId::new(guild_id.get()),
                role_id: RoleId::new(removed_role_id.get()),
            })
            .await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        let Some(dispatch) = self.dispatch() else {
            return;
        };
        dispatch
            .engine
            .handle_guild_available(GuildId::new(guild.id.get()))
            .await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        if incomplete.unavailable {
            info!(guild_id = %incomplete.id, "Guild outage, keeping configuration");
            return;
        }
        let Some(dispatch) = self.dispatch() else {
            return;
        };
        info!(guild_id = %incomplete.id, "Removed from guild");
        dispatch
            .engine
            .handle_guild_removed(GuildId::new(incomplete.id.get()));
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        if let Some(dispatch) = self.dispatch.get() {
            dispatch.commands.handle_message(&ctx, &new_message).await;
        }
    }
}
