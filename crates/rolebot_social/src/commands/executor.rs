//! Operator command execution against the folder registry.

use super::{OperatorCommand, USAGE};
use crate::conversions::{ToSerenity, reaction_type};
use crate::{CommandConfig, DiscordError};
use rolebot_core::{ChannelId, EmojiKey, Folder, GuildId, JoinRole, MessageId, RoleBinding, RoleId};
use rolebot_engine::ReactionRoleEngine;
use rolebot_error::{EngineError, EngineErrorKind, EngineResult};
use serenity::client::Context;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id as sid;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How long the invoking message stays up.
const INVOCATION_TTL: Duration = Duration::from_secs(5);

/// Runs operator text commands.
///
/// Commands require the Manage Roles permission. Both the invoking message
/// and the reply are deleted after a short delay.
pub struct CommandExecutor {
    engine: Arc<ReactionRoleEngine>,
    config: CommandConfig,
}

impl CommandExecutor {
    /// Create an executor over a running engine.
    pub fn new(engine: Arc<ReactionRoleEngine>, config: CommandConfig) -> Self {
        Self { engine, config }
    }

    /// Handle a guild message, ignoring anything that is not a command.
    #[instrument(skip_all, fields(author = %msg.author.id, message_id = %msg.id))]
    pub async fn handle_message(&self, ctx: &Context, msg: &Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(parsed) = OperatorCommand::parse(self.config.command_prefix(), &msg.content)
        else {
            return;
        };

        self.expire(ctx.http.clone(), msg.channel_id, msg.id, INVOCATION_TTL);

        if !self.is_operator(ctx, guild_id, msg.author.id).await {
            debug!("Command from member without Manage Roles");
            if let Err(e) = msg.react(ctx, '❌').await {
                debug!(error = %e, "Could not react to command");
            }
            return;
        }

        let guild = GuildId::new(guild_id.get());
        let reply = match parsed {
            Ok(command) => {
                info!(%guild, ?command, "Running operator command");
                match self.execute(ctx, guild, msg.channel_id, command).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(%guild, error = %e, "Operator command failed");
                        failure_text(&e)
                    }
                }
            }
            Err(e) => failure_text(&e),
        };

        self.reply(ctx, msg.channel_id, reply).await;
    }

    async fn execute(
        &self,
        ctx: &Context,
        guild: GuildId,
        channel: sid::ChannelId,
        command: OperatorCommand,
    ) -> EngineResult<String> {
        let registry = self.engine.registry();
        let prefix = self.config.command_prefix();

        match command {
            OperatorCommand::Help => Ok(format!("Commands (prefix `{prefix}`):\n```\n{USAGE}\n```")),

            OperatorCommand::FolderCreate { label } => {
                let folder = registry.create_folder(guild, &label).await?;
                let index = registry.folders(guild).len().saturating_sub(1);
                Ok(format!(
                    "Created folder `{}`. Add roles with `{prefix}folder add {index} <role> <emoji>`.",
                    folder.label
                ))
            }

            OperatorCommand::FolderList => {
                let folders: Vec<Folder> = registry
                    .folders(guild)
                    .iter()
                    .filter_map(|summary| registry.folder(guild, summary.id).ok())
                    .collect();
                Ok(render_folder_list(&folders))
            }

            OperatorCommand::FolderAdd {
                index,
                role_id,
                emoji,
            } => {
                let folder = registry.folder_at(guild, index)?;
                let role_name = self.role_name(ctx, guild, role_id).await?;
                registry
                    .add_role_binding(
                        guild,
                        folder.id,
                        RoleBinding::new(role_id, role_name.clone(), emoji.clone()),
                    )
                    .await?;
                Ok(format!(
                    "Added {} {role_name} to `{}`.",
                    emoji_markdown(&emoji),
                    folder.label
                ))
            }

            OperatorCommand::FolderPublish { index } => self.publish(ctx, guild, channel, index).await,

            OperatorCommand::FolderRemove { index } => {
                let folder = registry.delete_folder_at(guild, index).await?;
                Ok(format!(
                    "Folder `{}` has been deleted. Its {} roles are no longer associated with it.",
                    folder.label,
                    folder.roles.len()
                ))
            }

            OperatorCommand::JoinRoleAdd { role_id } => {
                let role_name = self.role_name(ctx, guild, role_id).await?;
                Ok(if registry.add_join_role(guild, role_id).await? {
                    format!("New members will now receive {role_name}.")
                } else {
                    format!("{role_name} is already a join role.")
                })
            }

            OperatorCommand::JoinRoleRemove { role_id } => {
                Ok(if registry.remove_join_role(guild, role_id).await? {
                    format!("<@&{role_id}> is no longer a join role.")
                } else {
                    format!("<@&{role_id}> was not a join role.")
                })
            }

            OperatorCommand::JoinRoleList => Ok(render_join_roles(&registry.join_roles(guild))),

            OperatorCommand::ReactNuke => {
                let messages = registry.nuke_guild(guild).await?;
                info!(%guild, messages, "Guild react roles nuked by operator");
                Ok("I deleted all your react roles. Any folders that had react roles are now empty."
                    .to_string())
            }
        }
    }

    /// Post a folder and bind its roles to the new message.
    async fn publish(
        &self,
        ctx: &Context,
        guild: GuildId,
        channel: sid::ChannelId,
        index: usize,
    ) -> EngineResult<String> {
        let registry = self.engine.registry();
        let folder = registry.folder_at(guild, index)?;
        if folder.roles.is_empty() {
            return Err(EngineError::new(EngineErrorKind::InvalidInput(format!(
                "Folder `{}` has no roles yet.",
                folder.label
            ))));
        }

        let posted = channel
            .say(ctx, render_folder(&folder))
            .await
            .map_err(DiscordError::from)?;

        let published = match registry
            .publish_folder(
                guild,
                folder.id,
                ChannelId::new(channel.get()),
                MessageId::new(posted.id.get()),
            )
            .await
        {
            Ok(published) => published,
            Err(e) => {
                if let Err(delete_err) = posted.delete(ctx).await {
                    warn!(error = %delete_err, "Could not remove unpublished folder message");
                }
                return Err(e);
            }
        };

        for entry in &published {
            if let Err(e) = posted.react(ctx, reaction_type(entry.binding.emoji())).await {
                warn!(emoji = %entry.binding.emoji(), error = %e, "Could not seed reaction");
            }
        }

        Ok(format!(
            "Published `{}` with {} roles.",
            folder.label,
            published.len()
        ))
    }

    async fn is_operator(&self, ctx: &Context, guild_id: sid::GuildId, user_id: sid::UserId) -> bool {
        let member = match guild_id.member(ctx, user_id).await {
            Ok(member) => member,
            Err(e) => {
                warn!(error = %e, "Could not resolve command author");
                return false;
            }
        };

        ctx.cache
            .guild(guild_id)
            .is_some_and(|guild| guild.member_permissions(&member).manage_roles())
    }

    async fn role_name(&self, ctx: &Context, guild: GuildId, role_id: RoleId) -> EngineResult<String> {
        let cached = ctx
            .cache
            .guild(guild.to_serenity())
            .and_then(|g| g.roles.get(&role_id.to_serenity()).map(|r| r.name.clone()));
        if let Some(name) = cached {
            return Ok(name);
        }

        let roles = ctx
            .http
            .get_guild_roles(guild.to_serenity())
            .await
            .map_err(DiscordError::from)?;
        roles
            .into_iter()
            .find(|r| r.id == role_id.to_serenity())
            .map(|r| r.name)
            .ok_or_else(|| EngineError::not_found(format!("role {role_id}")))
    }

    async fn reply(&self, ctx: &Context, channel: sid::ChannelId, text: String) {
        match channel.say(ctx, text).await {
            Ok(sent) => self.expire(ctx.http.clone(), channel, sent.id, self.config.feedback_ttl()),
            Err(e) => warn!(error = %e, "Could not send command reply"),
        }
    }

    fn expire(&self, http: Arc<Http>, channel: sid::ChannelId, message: sid::MessageId, ttl: Duration) {
        self.engine
            .context()
            .scheduler()
            .schedule("message_cleanup", ttl, async move {
                if let Err(e) = http.delete_message(channel, message, None).await {
                    debug!(error = %e, "Could not delete message");
                }
            });
    }
}

/// Operator-facing text for a failed command.
pub fn failure_text(err: &EngineError) -> String {
    match err.kind() {
        EngineErrorKind::InvalidInput(message) | EngineErrorKind::DuplicateEmoji(message) => {
            message.clone()
        }
        EngineErrorKind::NotFound(what) => format!("I couldn't find {what}."),
        EngineErrorKind::PermissionDenied(_) => {
            "I don't have permission to do that. Is my role above the ones I hand out?".to_string()
        }
        EngineErrorKind::Persistence(_) => {
            "I couldn't save that change, so nothing was modified.".to_string()
        }
        EngineErrorKind::StaleCacheConflict(_)
        | EngineErrorKind::RateLimited(_)
        | EngineErrorKind::TransientNetwork(_) => {
            "Something changed while I was working on that. Try again.".to_string()
        }
    }
}

/// Chat markup for an emoji key.
pub fn emoji_markdown(emoji: &EmojiKey) -> String {
    match emoji {
        EmojiKey::Custom(id) => format!("<:_:{id}>"),
        EmojiKey::Unicode(text) => text.clone(),
    }
}

/// Body of a published folder message.
pub fn render_folder(folder: &Folder) -> String {
    let mut body = format!("**{}**\n", folder.label);
    for binding in &folder.roles {
        body.push_str(&format!(
            "{} {}\n",
            emoji_markdown(binding.emoji()),
            binding.role_name()
        ));
    }
    body
}

/// Folder list with operator-facing positions.
pub fn render_folder_list(folders: &[Folder]) -> String {
    if folders.is_empty() {
        return "There are no folders.".to_string();
    }
    folders
        .iter()
        .enumerate()
        .map(|(index, folder)| format!("`{index}` {} ({} roles)", folder.label, folder.roles.len()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join roles as mentions.
pub fn render_join_roles(roles: &[JoinRole]) -> String {
    if roles.is_empty() {
        return "No join roles are configured.".to_string();
    }
    let mentions: Vec<String> = roles.iter().map(|r| format!("<@&{}>", r.role_id)).collect();
    format!("Join roles: {}", mentions.join(", "))
}
