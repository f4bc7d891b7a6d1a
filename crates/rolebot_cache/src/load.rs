//! Populating the cache from the persistence collaborator.

use crate::BindingCache;
use rolebot_core::{Folder, GuildId};
use rolebot_error::EngineResult;
use rolebot_interface::ReactRoleStore;
use tracing::{info, instrument, warn};

impl BindingCache {
    /// Build the cache from every guild the store knows about.
    ///
    /// A persistence failure here is fatal to startup.
    #[instrument(skip(store))]
    pub async fn load(store: &dyn ReactRoleStore) -> EngineResult<Self> {
        let mut cache = Self::new();

        for message in store.react_messages().await? {
            cache.insert_react_message(message);
        }

        for guild_id in store.configured_guilds().await? {
            cache.load_guild(store, guild_id).await?;
        }

        info!(stats = ?cache.stats(), "Binding cache loaded");
        Ok(cache)
    }

    /// Load (or reload) one guild's folders, join roles and message bindings.
    #[instrument(skip(self, store))]
    pub async fn load_guild(
        &mut self,
        store: &dyn ReactRoleStore,
        guild_id: GuildId,
    ) -> EngineResult<()> {
        for summary in store.folders(guild_id).await? {
            let mut folder = Folder::new(summary.id, summary.label, guild_id);
            folder.roles = store.folder_contents(summary.id).await?;
            self.insert_folder(folder);
        }

        for role in store.join_roles(guild_id).await? {
            self.add_join_role(guild_id, role);
        }

        for entry in store.role_bindings_by_guild(guild_id).await? {
            let message_id = entry.message.message_id;
            if let Err(e) = self.insert_message_binding(entry) {
                warn!(%guild_id, %message_id, error = %e, "Skipping conflicting stored binding");
            }
        }

        Ok(())
    }
}
