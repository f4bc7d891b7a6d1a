//! Folder, binding and join-role CRUD.
//!
//! The registry is the only writer of the binding cache. Every mutation is
//! persisted first; the cache changes only once the store has confirmed,
//! so a persistence failure leaves the cache exactly as it was.

use crate::EngineContext;
use rolebot_cache::{BindingCache, RolePurge};
use rolebot_core::{
    ChannelId, Folder, FolderId, FolderSummary, GuildId, JoinRole, MessageBinding, MessageId,
    ReactMessage, RoleBinding, RoleId,
};
use rolebot_error::{EngineError, EngineErrorKind, EngineResult};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// CRUD orchestration over the binding cache and the store.
#[derive(Debug, Clone)]
pub struct FolderRegistry {
    ctx: Arc<EngineContext>,
}

impl FolderRegistry {
    /// Create a registry over a shared context.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    /// Folders of a guild, in creation order.
    pub fn folders(&self, guild_id: GuildId) -> Vec<FolderSummary> {
        self.ctx.cache().read().folders(guild_id).to_vec()
    }

    /// A folder of the guild by id.
    pub fn folder(&self, guild_id: GuildId, folder_id: FolderId) -> EngineResult<Folder> {
        self.ctx
            .cache()
            .read()
            .folder(folder_id)
            .filter(|f| f.guild_id == guild_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("folder {folder_id}")))
    }

    /// The folder at a list position.
    pub fn folder_at(&self, guild_id: GuildId, index: usize) -> EngineResult<Folder> {
        let folder_id = self.folder_id_at(guild_id, index)?;
        self.folder(guild_id, folder_id)
    }

    /// Join roles of a guild, in configuration order.
    pub fn join_roles(&self, guild_id: GuildId) -> Vec<JoinRole> {
        self.ctx.cache().read().join_roles(guild_id).to_vec()
    }

    fn folder_id_at(&self, guild_id: GuildId, index: usize) -> EngineResult<FolderId> {
        self.ctx
            .cache()
            .read()
            .folder_id_at(guild_id, index)
            .ok_or_else(|| EngineError::not_found(format!("folder at position {index}")))
    }

    // ============================================================================
    // Folders
    // ============================================================================

    /// Create an empty folder at the end of the guild's list.
    #[instrument(skip(self))]
    pub async fn create_folder(&self, guild_id: GuildId, label: &str) -> EngineResult<Folder> {
        let label = label.trim();
        if label.is_empty() {
            return Err(EngineError::new(EngineErrorKind::InvalidInput(
                "folder label must not be empty".into(),
            )));
        }

        let summary = self.ctx.store().create_folder(guild_id, label).await?;
        let folder = Folder::new(summary.id, summary.label, guild_id);
        self.ctx.cache().write().insert_folder(folder.clone());

        info!(folder_id = %folder.id, "Folder created");
        Ok(folder)
    }

    /// Delete a folder and its contents.
    ///
    /// The folder must be in the guild's list. Its list entry and its
    /// contents entry are removed together once the store confirms.
    #[instrument(skip(self))]
    pub async fn delete_folder(&self, guild_id: GuildId, folder_id: FolderId) -> EngineResult<Folder> {
        let snapshot = self.folder(guild_id, folder_id)?;

        self.ctx.store().delete_folder(folder_id).await?;

        let removed = self.ctx.cache().write().remove_folder(guild_id, folder_id);
        if removed.is_none() {
            warn!(
                %folder_id,
                "Folder left the cache while its deletion was in flight, returning stale snapshot"
            );
        }

        info!(label = %snapshot.label, "Folder deleted");
        Ok(removed.unwrap_or(snapshot))
    }

    /// Delete the folder at a list position.
    ///
    /// Positions of later folders shift down by one.
    #[instrument(skip(self))]
    pub async fn delete_folder_at(&self, guild_id: GuildId, index: usize) -> EngineResult<Folder> {
        let folder_id = self.folder_id_at(guild_id, index)?;
        self.delete_folder(guild_id, folder_id).await
    }

    // ============================================================================
    // Bindings
    // ============================================================================

    /// Add a role binding to a folder.
    ///
    /// Fails with `DuplicateEmoji` if the folder already uses the emoji.
    #[instrument(skip(self, binding), fields(role_id = %binding.role_id(), emoji = %binding.emoji()))]
    pub async fn add_role_binding(
        &self,
        guild_id: GuildId,
        folder_id: FolderId,
        binding: RoleBinding,
    ) -> EngineResult<()> {
        let folder = self.folder(guild_id, folder_id)?;
        if let Some(existing) = folder.binding_for(binding.emoji()) {
            return Err(EngineError::new(EngineErrorKind::DuplicateEmoji(format!(
                "{} already grants {} in folder {}",
                binding.emoji(),
                existing.role_name(),
                folder.label
            ))));
        }

        self.ctx
            .store()
            .add_react_role(guild_id, folder_id, &binding)
            .await?;
        self.ctx
            .cache()
            .write()
            .push_folder_binding(folder_id, binding)?;

        info!(folder = %folder.label, "Role binding added");
        Ok(())
    }

    /// Bind every role of a folder to a posted message.
    ///
    /// Each binding is persisted and then cached one at a time, so a
    /// failure part way leaves the earlier bindings live.
    #[instrument(skip(self))]
    pub async fn publish_folder(
        &self,
        guild_id: GuildId,
        folder_id: FolderId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> EngineResult<Vec<MessageBinding>> {
        let folder = self.folder(guild_id, folder_id)?;
        if folder.roles.is_empty() {
            return Err(EngineError::new(EngineErrorKind::InvalidInput(format!(
                "folder {} has no roles to publish",
                folder.label
            ))));
        }

        let message = ReactMessage {
            guild_id,
            channel_id,
            message_id,
        };

        let mut published = Vec::with_capacity(folder.roles.len());
        for binding in folder.roles {
            let entry = MessageBinding { message, binding };
            self.ctx.store().add_react_message(&entry).await?;
            self.ctx
                .cache()
                .write()
                .insert_message_binding(entry.clone())?;
            published.push(entry);
        }

        info!(bindings = published.len(), "Folder published");
        Ok(published)
    }

    /// Remove every reference to a role within a guild.
    ///
    /// Runs when the platform deletes a role. Message bindings, folder
    /// contents and join roles are cleared in that order, each cache step
    /// following its own confirmed store delete. Removing a role that is
    /// no longer referenced succeeds with an empty purge.
    #[instrument(skip(self))]
    pub async fn remove_role_binding(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
    ) -> EngineResult<RolePurge> {
        let store = self.ctx.store();
        let cache = self.ctx.cache();

        store.delete_react_message_by_role_id(role_id).await?;
        let (message_bindings, react_messages) =
            cache.write().purge_role_messages(guild_id, role_id);

        store.delete_react_role_by_role_id(role_id).await?;
        let folder_bindings = cache.write().purge_role_folders(guild_id, role_id);

        store.delete_join_role(role_id).await?;
        let join_roles = usize::from(cache.write().remove_join_role(guild_id, role_id));

        let purge = RolePurge::new(message_bindings, folder_bindings, join_roles, react_messages);
        if purge.is_empty() {
            debug!("Role had no bindings");
        } else {
            info!(?purge, "Role purged");
        }
        Ok(purge)
    }

    // ============================================================================
    // Join roles
    // ============================================================================

    /// Configure a join role, returning false if it was already configured.
    #[instrument(skip(self))]
    pub async fn add_join_role(&self, guild_id: GuildId, role_id: RoleId) -> EngineResult<bool> {
        let role = JoinRole::from(role_id);
        if self.ctx.cache().read().join_roles(guild_id).contains(&role) {
            return Ok(false);
        }

        self.ctx.store().add_join_role(guild_id, role).await?;
        let added = self.ctx.cache().write().add_join_role(guild_id, role);

        info!("Join role added");
        Ok(added)
    }

    /// Unconfigure a join role, returning whether it was configured.
    #[instrument(skip(self))]
    pub async fn remove_join_role(&self, guild_id: GuildId, role_id: RoleId) -> EngineResult<bool> {
        self.ctx.store().delete_join_role(role_id).await?;
        let removed = self.ctx.cache().write().remove_join_role(guild_id, role_id);

        info!(removed, "Join role removed");
        Ok(removed)
    }

    // ============================================================================
    // Guild-wide
    // ============================================================================

    /// Delete every react message and every folder binding of a guild.
    ///
    /// Folders survive, empty. Returns the number of react messages dropped.
    #[instrument(skip(self))]
    pub async fn nuke_guild(&self, guild_id: GuildId) -> EngineResult<usize> {
        self.ctx
            .store()
            .delete_react_messages_by_guild(guild_id)
            .await?;
        let messages = self.ctx.cache().write().clear_guild_messages(guild_id);

        self.ctx
            .store()
            .delete_all_react_roles_by_guild(guild_id)
            .await?;
        self.ctx
            .cache()
            .write()
            .clear_guild_folder_contents(guild_id);

        warn!(messages, "Guild reaction roles nuked");
        Ok(messages)
    }

    /// Drop every cache entry of a guild the bot can no longer reach.
    ///
    /// Durable records are kept so the configuration returns through
    /// [`reload_guild`](Self::reload_guild) once the guild is reachable again.
    #[instrument(skip(self))]
    pub fn purge_guild(&self, guild_id: GuildId) {
        self.ctx.cache().write().purge_guild(guild_id);
        info!("Guild purged from cache");
    }

    /// Rebuild a guild's cache entries from the store.
    ///
    /// The guild is loaded into a scratch cache first, so a store failure
    /// leaves the cache as it was.
    #[instrument(skip(self))]
    pub async fn reload_guild(&self, guild_id: GuildId) -> EngineResult<()> {
        let mut loaded = BindingCache::new();
        loaded.load_guild(self.ctx.store().as_ref(), guild_id).await?;
        let stats = loaded.stats();

        self.ctx.cache().write().replace_guild(guild_id, loaded);
        info!(?stats, "Guild reloaded into cache");
        Ok(())
    }

    // ============================================================================
    // On-demand population
    // ============================================================================

    /// Populate the cache for a message the gateway referenced first.
    ///
    /// Stored bindings of the message are cached; a message without any is
    /// remembered as seen. Returns whether it is a react message of the guild.
    #[instrument(skip(self))]
    pub async fn hydrate_message(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
    ) -> EngineResult<bool> {
        let entries = self.ctx.store().role_bindings_by_message(message_id).await?;

        let mut cache = self.ctx.cache().write();
        for entry in entries {
            if entry.message.guild_id != guild_id {
                warn!(stored_guild = %entry.message.guild_id, "Stored binding belongs to another guild");
                continue;
            }
            if let Err(e) = cache.insert_message_binding(entry) {
                warn!(error = %e, "Skipping conflicting stored binding");
            }
        }
        let is_react = cache.is_react_message(guild_id, message_id);
        if !is_react {
            cache.mark_message_seen(guild_id, message_id);
        }

        Ok(is_react)
    }

    /// Remember a message that turned out not to exist.
    pub fn mark_message_seen(&self, guild_id: GuildId, message_id: MessageId) {
        self.ctx.cache().write().mark_message_seen(guild_id, message_id);
    }
}
