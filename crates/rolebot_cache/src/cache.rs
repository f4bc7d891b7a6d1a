//! Binding cache implementation.

use derive_getters::Getters;
use parking_lot::RwLock;
use rolebot_core::{
    EmojiKey, Folder, FolderId, FolderSummary, GuildId, JoinRole, MessageBinding, MessageId,
    ReactMessage, RoleBinding, RoleId,
};
use rolebot_error::{EngineError, EngineErrorKind, EngineResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Cache shared between the gateway handlers and the engine.
///
/// Guards must never be held across an `.await`; a read taken before a
/// suspension point may be stale afterwards.
pub type SharedBindingCache = Arc<RwLock<BindingCache>>;

/// Messages remembered per guild as resolved without bindings.
pub const SEEN_MESSAGES_PER_GUILD: usize = 1024;

/// Entry counts, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct CacheStats {
    guilds: usize,
    react_messages: usize,
    message_bindings: usize,
    folders: usize,
    join_roles: usize,
}

/// What a role purge removed from the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct RolePurge {
    message_bindings: usize,
    folder_bindings: usize,
    join_roles: usize,
    react_messages: usize,
}

impl RolePurge {
    /// Tally of a purge applied in several steps.
    pub fn new(
        message_bindings: usize,
        folder_bindings: usize,
        join_roles: usize,
        react_messages: usize,
    ) -> Self {
        Self {
            message_bindings,
            folder_bindings,
            join_roles,
            react_messages,
        }
    }

    /// Whether anything referenced the role.
    pub fn is_empty(&self) -> bool {
        self.message_bindings == 0 && self.folder_bindings == 0 && self.join_roles == 0
    }
}

/// In-memory reaction-role configuration.
///
/// The guild folder list is ordered by creation and indexed by position;
/// folder contents live in a second map keyed by folder id. Every id in a
/// guild's folder list has exactly one entry in the contents map.
///
/// # Example
///
/// ```
/// use rolebot_cache::BindingCache;
/// use rolebot_core::*;
///
/// let guild = GuildId::new(1);
/// let message = ReactMessage {
///     guild_id: guild,
///     channel_id: ChannelId::new(2),
///     message_id: MessageId::new(3),
/// };
/// let binding = RoleBinding::new(RoleId::new(4), "Gamer", EmojiKey::Custom(5));
///
/// let mut cache = BindingCache::new();
/// cache
///     .insert_message_binding(MessageBinding { message, binding: binding.clone() })
///     .unwrap();
///
/// assert!(cache.is_react_message(guild, message.message_id));
/// assert_eq!(
///     cache.binding(guild, message.message_id, &EmojiKey::Custom(5)),
///     Some(binding)
/// );
/// ```
#[derive(Debug, Default)]
pub struct BindingCache {
    react_messages: HashMap<MessageId, ReactMessage>,
    message_bindings: HashMap<MessageId, HashMap<EmojiKey, RoleBinding>>,
    known_messages: HashMap<GuildId, SeenMessages>,
    guild_folders: HashMap<GuildId, Vec<FolderSummary>>,
    folder_contents: HashMap<FolderId, Folder>,
    join_roles: HashMap<GuildId, Vec<JoinRole>>,
}

/// Messages of one guild that carry no bindings, oldest first.
///
/// Holds at most [`SEEN_MESSAGES_PER_GUILD`] ids; the oldest is forgotten
/// first and simply gets fetched again if it shows up later.
#[derive(Debug, Default)]
struct SeenMessages {
    order: VecDeque<MessageId>,
    members: HashSet<MessageId>,
}

impl SeenMessages {
    fn contains(&self, message_id: MessageId) -> bool {
        self.members.contains(&message_id)
    }

    fn insert(&mut self, message_id: MessageId) {
        if !self.members.insert(message_id) {
            return;
        }
        self.order.push_back(message_id);
        if self.order.len() > SEEN_MESSAGES_PER_GUILD {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    fn remove(&mut self, message_id: MessageId) {
        if self.members.remove(&message_id) {
            self.order.retain(|m| *m != message_id);
        }
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}

impl BindingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the cache for sharing.
    pub fn into_shared(self) -> SharedBindingCache {
        Arc::new(RwLock::new(self))
    }

    // ============================================================================
    // React messages
    // ============================================================================

    /// Whether `message_id` is a react message of `guild_id`.
    pub fn is_react_message(&self, guild_id: GuildId, message_id: MessageId) -> bool {
        self.react_messages
            .get(&message_id)
            .is_some_and(|m| m.guild_id == guild_id)
    }

    /// The react message record, if any.
    pub fn react_message(&self, message_id: MessageId) -> Option<ReactMessage> {
        self.react_messages.get(&message_id).copied()
    }

    /// Whether the message has been resolved before, as a react message or not.
    pub fn has_seen_message(&self, guild_id: GuildId, message_id: MessageId) -> bool {
        self.react_messages.contains_key(&message_id)
            || self
                .known_messages
                .get(&guild_id)
                .is_some_and(|seen| seen.contains(message_id))
    }

    /// Remember that a message of the guild carries no bindings.
    pub fn mark_message_seen(&mut self, guild_id: GuildId, message_id: MessageId) {
        self.known_messages
            .entry(guild_id)
            .or_default()
            .insert(message_id);
    }

    /// Number of remembered non-react messages across guilds.
    pub fn seen_message_count(&self) -> usize {
        self.known_messages.values().map(SeenMessages::len).sum()
    }

    /// Register a react message without bindings.
    pub fn insert_react_message(&mut self, message: ReactMessage) {
        if let Some(seen) = self.known_messages.get_mut(&message.guild_id) {
            seen.remove(message.message_id);
        }
        self.react_messages.insert(message.message_id, message);
        self.message_bindings.entry(message.message_id).or_default();
    }

    /// Place a binding on a react message, registering the message if needed.
    ///
    /// Re-inserting an identical binding is a no-op. A different role on an
    /// emoji already used by the message is a `DuplicateEmoji` error.
    pub fn insert_message_binding(&mut self, entry: MessageBinding) -> EngineResult<()> {
        let MessageBinding { message, binding } = entry;
        if let Some(existing) = self
            .message_bindings
            .get(&message.message_id)
            .and_then(|b| b.get(binding.emoji()))
            && existing.role_id() != binding.role_id()
        {
            return Err(EngineError::new(EngineErrorKind::DuplicateEmoji(format!(
                "{} already grants role {} on message {}",
                binding.emoji(),
                existing.role_id(),
                message.message_id
            ))));
        }

        self.insert_react_message(message);
        self.message_bindings
            .entry(message.message_id)
            .or_default()
            .insert(binding.emoji().clone(), binding);
        Ok(())
    }

    /// Binding for `(guild, message, emoji)`.
    pub fn binding(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        emoji: &EmojiKey,
    ) -> Option<RoleBinding> {
        if !self.is_react_message(guild_id, message_id) {
            return None;
        }
        self.message_bindings
            .get(&message_id)
            .and_then(|bindings| bindings.get(emoji))
            .cloned()
    }

    /// Every binding placed on a message.
    pub fn message_bindings(&self, message_id: MessageId) -> Vec<RoleBinding> {
        self.message_bindings
            .get(&message_id)
            .map(|b| b.values().cloned().collect())
            .unwrap_or_default()
    }

    /// React messages of a guild.
    pub fn guild_react_messages(&self, guild_id: GuildId) -> Vec<ReactMessage> {
        self.react_messages
            .values()
            .filter(|m| m.guild_id == guild_id)
            .copied()
            .collect()
    }

    // ============================================================================
    // Folders
    // ============================================================================

    /// Ordered folder list of a guild.
    pub fn folders(&self, guild_id: GuildId) -> &[FolderSummary] {
        self.guild_folders
            .get(&guild_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Folder contents by id.
    pub fn folder(&self, folder_id: FolderId) -> Option<&Folder> {
        self.folder_contents.get(&folder_id)
    }

    /// Folder id at a list position.
    pub fn folder_id_at(&self, guild_id: GuildId, index: usize) -> Option<FolderId> {
        self.folders(guild_id).get(index).map(|f| f.id)
    }

    /// Append a folder to its guild's list and store its contents.
    pub fn insert_folder(&mut self, folder: Folder) {
        tracing::debug!(guild_id = %folder.guild_id, folder_id = %folder.id, "Caching folder");
        let list = self.guild_folders.entry(folder.guild_id).or_default();
        if !list.iter().any(|f| f.id == folder.id) {
            list.push(folder.summary());
        }
        self.folder_contents.insert(folder.id, folder);
    }

    /// Remove a folder: the list entry by its position, then its contents.
    ///
    /// Returns `None` if the folder is not in the guild's list.
    ///
    /// # Panics
    ///
    /// Panics if the folder is listed but has no contents entry, which means
    /// the cache is corrupt.
    pub fn remove_folder(&mut self, guild_id: GuildId, folder_id: FolderId) -> Option<Folder> {
        let list = self.guild_folders.get_mut(&guild_id)?;
        let index = list.iter().position(|f| f.id == folder_id)?;
        list.remove(index);
        match self.folder_contents.remove(&folder_id) {
            Some(folder) => Some(folder),
            None => panic!(
                "binding cache corrupt: folder {folder_id} listed in guild {guild_id} without contents"
            ),
        }
    }

    /// Append a binding to a folder.
    pub fn push_folder_binding(
        &mut self,
        folder_id: FolderId,
        binding: RoleBinding,
    ) -> EngineResult<()> {
        let folder = self.folder_contents.get_mut(&folder_id).ok_or_else(|| {
            EngineError::new(EngineErrorKind::StaleCacheConflict(format!(
                "folder {folder_id} no longer cached"
            )))
        })?;
        if let Some(existing) = folder.binding_for(binding.emoji()) {
            return Err(EngineError::new(EngineErrorKind::DuplicateEmoji(format!(
                "{} already grants {} in folder {}",
                binding.emoji(),
                existing.role_name(),
                folder.label
            ))));
        }
        folder.roles.push(binding);
        Ok(())
    }

    // ============================================================================
    // Join roles
    // ============================================================================

    /// Join roles of a guild, in configuration order.
    pub fn join_roles(&self, guild_id: GuildId) -> &[JoinRole] {
        self.join_roles
            .get(&guild_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The first configured join role, used as the hierarchy anchor.
    pub fn first_join_role(&self, guild_id: GuildId) -> Option<RoleId> {
        self.join_roles(guild_id).first().map(|r| r.role_id)
    }

    /// Append a join role unless already configured.
    pub fn add_join_role(&mut self, guild_id: GuildId, role: JoinRole) -> bool {
        let roles = self.join_roles.entry(guild_id).or_default();
        if roles.contains(&role) {
            return false;
        }
        roles.push(role);
        true
    }

    /// Remove a join role, returning whether it was configured.
    pub fn remove_join_role(&mut self, guild_id: GuildId, role_id: RoleId) -> bool {
        let Some(roles) = self.join_roles.get_mut(&guild_id) else {
            return false;
        };
        let before = roles.len();
        roles.retain(|r| r.role_id != role_id);
        before != roles.len()
    }

    // ============================================================================
    // Cascades
    // ============================================================================

    /// Drop every reference to a deleted role within a guild.
    ///
    /// Covers message bindings, folder contents and join roles.
    pub fn purge_role(&mut self, guild_id: GuildId, role_id: RoleId) -> RolePurge {
        let (message_bindings, react_messages) = self.purge_role_messages(guild_id, role_id);
        let folder_bindings = self.purge_role_folders(guild_id, role_id);
        let join_roles = usize::from(self.remove_join_role(guild_id, role_id));

        let purge = RolePurge::new(message_bindings, folder_bindings, join_roles, react_messages);
        tracing::debug!(%guild_id, %role_id, ?purge, "Purged role from cache");
        purge
    }

    /// Drop message bindings for a role.
    ///
    /// React messages left without bindings leave the react-message set.
    /// Returns `(bindings removed, messages removed)`.
    pub fn purge_role_messages(&mut self, guild_id: GuildId, role_id: RoleId) -> (usize, usize) {
        let guild_messages: Vec<MessageId> = self
            .guild_react_messages(guild_id)
            .into_iter()
            .map(|m| m.message_id)
            .collect();

        let (mut bindings_removed, mut messages_removed) = (0, 0);
        for message_id in guild_messages {
            let now_empty = match self.message_bindings.get_mut(&message_id) {
                Some(bindings) => {
                    let before = bindings.len();
                    bindings.retain(|_, b| *b.role_id() != role_id);
                    let removed = before - bindings.len();
                    bindings_removed += removed;
                    removed > 0 && bindings.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.forget_react_message(message_id);
                messages_removed += 1;
            }
        }
        (bindings_removed, messages_removed)
    }

    /// Drop a role from every folder of a guild, returning bindings removed.
    pub fn purge_role_folders(&mut self, guild_id: GuildId, role_id: RoleId) -> usize {
        let mut removed = 0;
        if let Some(list) = self.guild_folders.get(&guild_id) {
            for summary in list {
                if let Some(folder) = self.folder_contents.get_mut(&summary.id) {
                    let before = folder.roles.len();
                    folder.roles.retain(|b| *b.role_id() != role_id);
                    removed += before - folder.roles.len();
                }
            }
        }
        removed
    }

    /// Remove every react message of a guild with its bindings.
    pub fn clear_guild_messages(&mut self, guild_id: GuildId) -> usize {
        let messages: Vec<MessageId> = self
            .guild_react_messages(guild_id)
            .into_iter()
            .map(|m| m.message_id)
            .collect();
        for message_id in &messages {
            self.forget_react_message(*message_id);
        }
        messages.len()
    }

    /// Empty every folder of a guild. Folders themselves survive.
    pub fn clear_guild_folder_contents(&mut self, guild_id: GuildId) {
        if let Some(list) = self.guild_folders.get(&guild_id) {
            for summary in list {
                if let Some(folder) = self.folder_contents.get_mut(&summary.id) {
                    folder.roles.clear();
                }
            }
        }
    }

    fn forget_react_message(&mut self, message_id: MessageId) {
        self.message_bindings.remove(&message_id);
        if let Some(message) = self.react_messages.remove(&message_id) {
            self.mark_message_seen(message.guild_id, message_id);
        }
    }

    /// Forget everything about a guild, including which of its messages
    /// were seen, so the next reaction there is resolved from the store.
    pub fn purge_guild(&mut self, guild_id: GuildId) {
        self.clear_guild_messages(guild_id);
        if let Some(list) = self.guild_folders.remove(&guild_id) {
            for summary in list {
                self.folder_contents.remove(&summary.id);
            }
        }
        self.join_roles.remove(&guild_id);
        self.known_messages.remove(&guild_id);
        tracing::info!(%guild_id, "Purged guild from binding cache");
    }

    /// Replace a guild's entries with those of a cache loaded for that
    /// guild alone.
    pub fn replace_guild(&mut self, guild_id: GuildId, loaded: BindingCache) {
        self.purge_guild(guild_id);

        let BindingCache {
            react_messages,
            message_bindings,
            known_messages: _,
            mut guild_folders,
            mut folder_contents,
            mut join_roles,
        } = loaded;

        self.react_messages.extend(
            react_messages
                .into_iter()
                .filter(|(_, m)| m.guild_id == guild_id),
        );
        for (message_id, bindings) in message_bindings {
            if self.is_react_message(guild_id, message_id) {
                self.message_bindings.insert(message_id, bindings);
            }
        }
        if let Some(list) = guild_folders.remove(&guild_id) {
            for summary in &list {
                if let Some(folder) = folder_contents.remove(&summary.id) {
                    self.folder_contents.insert(summary.id, folder);
                }
            }
            self.guild_folders.insert(guild_id, list);
        }
        if let Some(roles) = join_roles.remove(&guild_id) {
            self.join_roles.insert(guild_id, roles);
        }
    }

    /// Entry counts.
    pub fn stats(&self) -> CacheStats {
        let guilds: HashSet<GuildId> = self
            .guild_folders
            .keys()
            .chain(self.join_roles.keys())
            .copied()
            .chain(self.react_messages.values().map(|m| m.guild_id))
            .collect();
        CacheStats {
            guilds: guilds.len(),
            react_messages: self.react_messages.len(),
            message_bindings: self.message_bindings.values().map(HashMap::len).sum(),
            folders: self.folder_contents.len(),
            join_roles: self.join_roles.values().map(Vec::len).sum(),
        }
    }
}
