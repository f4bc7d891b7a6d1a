//! Persistence collaborator.

use async_trait::async_trait;
use rolebot_core::{
    FolderId, FolderSummary, GuildId, JoinRole, MessageBinding, MessageId, ReactMessage,
    RoleBinding, RoleId,
};
use rolebot_error::EngineResult;

/// Durable store for reaction-role configuration.
///
/// Read at boot, read/written on CRUD. Each call is expected to be atomic;
/// the engine never composes multi-statement transactions itself.
/// Failures surface as [`rolebot_error::EngineErrorKind::Persistence`].
#[async_trait]
pub trait ReactRoleStore: Send + Sync {
    /// Guilds with any stored configuration.
    async fn configured_guilds(&self) -> EngineResult<Vec<GuildId>>;

    /// Every known react message.
    async fn react_messages(&self) -> EngineResult<Vec<ReactMessage>>;

    /// Bindings placed on one message.
    async fn role_bindings_by_message(
        &self,
        message_id: MessageId,
    ) -> EngineResult<Vec<MessageBinding>>;

    /// Bindings placed on any message of a guild.
    async fn role_bindings_by_guild(&self, guild_id: GuildId)
    -> EngineResult<Vec<MessageBinding>>;

    /// Join roles of a guild in configuration order.
    ///
    /// The first element is the hierarchy anchor used by the join-role handoff.
    async fn join_roles(&self, guild_id: GuildId) -> EngineResult<Vec<JoinRole>>;

    /// Folders of a guild in creation order.
    async fn folders(&self, guild_id: GuildId) -> EngineResult<Vec<FolderSummary>>;

    /// Role bindings stored in a folder.
    async fn folder_contents(&self, folder_id: FolderId) -> EngineResult<Vec<RoleBinding>>;

    /// Create a folder and return its persistence-assigned id.
    async fn create_folder(&self, guild_id: GuildId, label: &str) -> EngineResult<FolderSummary>;

    /// Delete a folder and every role binding it contains.
    async fn delete_folder(&self, folder_id: FolderId) -> EngineResult<()>;

    /// Add a role binding to a folder.
    async fn add_react_role(
        &self,
        guild_id: GuildId,
        folder_id: FolderId,
        binding: &RoleBinding,
    ) -> EngineResult<()>;

    /// Place a binding on a react message.
    async fn add_react_message(&self, binding: &MessageBinding) -> EngineResult<()>;

    /// Append a join role to a guild.
    async fn add_join_role(&self, guild_id: GuildId, role: JoinRole) -> EngineResult<()>;

    /// Delete every join-role entry for a role.
    async fn delete_join_role(&self, role_id: RoleId) -> EngineResult<()>;

    /// Delete every folder binding for a role.
    async fn delete_react_role_by_role_id(&self, role_id: RoleId) -> EngineResult<()>;

    /// Delete every react-message binding for a role.
    async fn delete_react_message_by_role_id(&self, role_id: RoleId) -> EngineResult<()>;

    /// Delete every folder binding in a guild.
    async fn delete_all_react_roles_by_guild(&self, guild_id: GuildId) -> EngineResult<()>;

    /// Delete every react-message binding in a guild.
    async fn delete_react_messages_by_guild(&self, guild_id: GuildId) -> EngineResult<()>;
}
