//! In-memory collaborators for engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rolebot_cache::BindingCache;
use rolebot_core::*;
use rolebot_engine::{EngineContext, EngineTiming, FolderRegistry, ReactionRoleEngine};
use rolebot_error::{EngineError, EngineErrorKind, EngineResult};
use rolebot_interface::{GatewayClient, ReactRoleStore, RoleChange, RoleStateClient};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const GUILD: GuildId = GuildId::new(100);
pub const CHANNEL: ChannelId = ChannelId::new(200);
pub const MESSAGE: MessageId = MessageId::new(300);
pub const USER: UserId = UserId::new(400);

/// Join role, lowest rank
pub const R1: RoleId = RoleId::new(1);
/// Reaction role
pub const R2: RoleId = RoleId::new(2);
/// Unrelated role ranked above everything
pub const R3: RoleId = RoleId::new(3);

pub const GAMER: &str = "🎮";

// ============================================================================
// Store
// ============================================================================

#[derive(Default)]
struct StoreState {
    next_folder_id: i32,
    folders: Vec<(GuildId, FolderSummary)>,
    react_roles: Vec<(GuildId, FolderId, RoleBinding)>,
    react_messages: Vec<MessageBinding>,
    join_roles: Vec<(GuildId, JoinRole)>,
}

/// Store backed by vectors, with switchable write failures.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Write a react-message row without touching any cache.
    pub fn seed_message_binding(&self, entry: MessageBinding) {
        self.state.lock().react_messages.push(entry);
    }

    pub fn react_message_rows(&self) -> usize {
        self.state.lock().react_messages.len()
    }

    pub fn react_role_rows(&self) -> usize {
        self.state.lock().react_roles.len()
    }

    pub fn folder_rows(&self) -> usize {
        self.state.lock().folders.len()
    }

    pub fn join_role_rows(&self) -> usize {
        self.state.lock().join_roles.len()
    }

    fn check_write(&self) -> EngineResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::new(EngineErrorKind::Persistence(
                "store offline".into(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ReactRoleStore for MemoryStore {
    async fn configured_guilds(&self) -> EngineResult<Vec<GuildId>> {
        let state = self.state.lock();
        let guilds: BTreeSet<GuildId> = state
            .folders
            .iter()
            .map(|(g, _)| *g)
            .chain(state.join_roles.iter().map(|(g, _)| *g))
            .chain(state.react_messages.iter().map(|m| m.message.guild_id))
            .collect();
        Ok(guilds.into_iter().collect())
    }

    async fn react_messages(&self) -> EngineResult<Vec<ReactMessage>> {
        let state = self.state.lock();
        let mut seen = HashSet::new();
        Ok(state
            .react_messages
            .iter()
            .map(|m| m.message)
            .filter(|m| seen.insert(m.message_id))
            .collect())
    }

    async fn role_bindings_by_message(
        &self,
        message_id: MessageId,
    ) -> EngineResult<Vec<MessageBinding>> {
        Ok(self
            .state
            .lock()
            .react_messages
            .iter()
            .filter(|m| m.message.message_id == message_id)
            .cloned()
            .collect())
    }

    async fn role_bindings_by_guild(&self, guild_id: GuildId) -> EngineResult<Vec<MessageBinding>> {
        Ok(self
            .state
            .lock()
            .react_messages
            .iter()
            .filter(|m| m.message.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn join_roles(&self, guild_id: GuildId) -> EngineResult<Vec<JoinRole>> {
        Ok(self
            .state
            .lock()
            .join_roles
            .iter()
            .filter(|(g, _)| *g == guild_id)
            .map(|(_, r)| *r)
            .collect())
    }

    async fn folders(&self, guild_id: GuildId) -> EngineResult<Vec<FolderSummary>> {
        Ok(self
            .state
            .lock()
            .folders
            .iter()
            .filter(|(g, _)| *g == guild_id)
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn folder_contents(&self, folder_id: FolderId) -> EngineResult<Vec<RoleBinding>> {
        Ok(self
            .state
            .lock()
            .react_roles
            .iter()
            .filter(|(_, f, _)| *f == folder_id)
            .map(|(_, _, b)| b.clone())
            .collect())
    }

    async fn create_folder(&self, guild_id: GuildId, label: &str) -> EngineResult<FolderSummary> {
        self.check_write()?;
        let mut state = self.state.lock();
        state.next_folder_id += 1;
        let summary = FolderSummary {
            id: FolderId::new(state.next_folder_id),
            label: label.to_string(),
        };
        state.folders.push((guild_id, summary.clone()));
        Ok(summary)
    }

    async fn delete_folder(&self, folder_id: FolderId) -> EngineResult<()> {
        self.check_write()?;
        let mut state = self.state.lock();
        let before = state.folders.len();
        state.folders.retain(|(_, f)| f.id != folder_id);
        if state.folders.len() == before {
            return Err(EngineError::not_found(format!("folder {folder_id}")));
        }
        state.react_roles.retain(|(_, f, _)| *f != folder_id);
        Ok(())
    }

    async fn add_react_role(
        &self,
        guild_id: GuildId,
        folder_id: FolderId,
        binding: &RoleBinding,
    ) -> EngineResult<()> {
        self.check_write()?;
        let mut state = self.state.lock();
        if state
            .react_roles
            .iter()
            .any(|(_, f, b)| *f == folder_id && b.emoji() == binding.emoji())
        {
            return Err(EngineError::new(EngineErrorKind::Persistence(
                "unique violation on react_roles".into(),
            )));
        }
        state.react_roles.push((guild_id, folder_id, binding.clone()));
        Ok(())
    }

    async fn add_react_message(&self, entry: &MessageBinding) -> EngineResult<()> {
        self.check_write()?;
        let mut state = self.state.lock();
        if !state.react_messages.iter().any(|m| {
            m.message.message_id == entry.message.message_id
                && m.binding.emoji() == entry.binding.emoji()
        }) {
            state.react_messages.push(entry.clone());
        }
        Ok(())
    }

    async fn add_join_role(&self, guild_id: GuildId, role: JoinRole) -> EngineResult<()> {
        self.check_write()?;
        let mut state = self.state.lock();
        if !state.join_roles.contains(&(guild_id, role)) {
            state.join_roles.push((guild_id, role));
        }
        Ok(())
    }

    async fn delete_join_role(&self, role_id: RoleId) -> EngineResult<()> {
        self.check_write()?;
        self.state
            .lock()
            .join_roles
            .retain(|(_, r)| r.role_id != role_id);
        Ok(())
    }

    async fn delete_react_role_by_role_id(&self, role_id: RoleId) -> EngineResult<()> {
        self.check_write()?;
        self.state
            .lock()
            .react_roles
            .retain(|(_, _, b)| *b.role_id() != role_id);
        Ok(())
    }

    async fn delete_react_message_by_role_id(&self, role_id: RoleId) -> EngineResult<()> {
        self.check_write()?;
        self.state
            .lock()
            .react_messages
            .retain(|m| *m.binding.role_id() != role_id);
        Ok(())
    }

    async fn delete_all_react_roles_by_guild(&self, guild_id: GuildId) -> EngineResult<()> {
        self.check_write()?;
        self.state
            .lock()
            .react_roles
            .retain(|(g, _, _)| *g != guild_id);
        Ok(())
    }

    async fn delete_react_messages_by_guild(&self, guild_id: GuildId) -> EngineResult<()> {
        self.check_write()?;
        self.state
            .lock()
            .react_messages
            .retain(|m| m.message.guild_id != guild_id);
        Ok(())
    }
}

// ============================================================================
// Role state
// ============================================================================

/// A role mutation as the platform saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleCall {
    Add(RoleId, RoleChange),
    Remove(RoleId, RoleChange),
}

/// Member role sets with a fixed role hierarchy.
#[derive(Default)]
pub struct MemoryRoles {
    members: Mutex<HashMap<(GuildId, UserId), BTreeSet<RoleId>>>,
    ranks: Mutex<HashMap<RoleId, u32>>,
    denied: Mutex<HashSet<RoleId>>,
    calls: Mutex<Vec<RoleCall>>,
    highest_fetches: AtomicUsize,
}

impl MemoryRoles {
    pub fn set_rank(&self, role_id: RoleId, rank: u32) {
        self.ranks.lock().insert(role_id, rank);
    }

    /// Grant a role out of band, as a moderator would.
    pub fn give(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) {
        self.members
            .lock()
            .entry((guild_id, user_id))
            .or_default()
            .insert(role_id);
    }

    /// Make every mutation of a role fail with `PermissionDenied`.
    pub fn deny(&self, role_id: RoleId) {
        self.denied.lock().insert(role_id);
    }

    pub fn roles_of(&self, guild_id: GuildId, user_id: UserId) -> BTreeSet<RoleId> {
        self.members
            .lock()
            .get(&(guild_id, user_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RoleCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: RoleCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn highest_fetches(&self) -> usize {
        self.highest_fetches.load(Ordering::SeqCst)
    }

    fn check_denied(&self, role_id: RoleId) -> EngineResult<()> {
        if self.denied.lock().contains(&role_id) {
            return Err(EngineError::new(EngineErrorKind::PermissionDenied(format!(
                "role {role_id} above bot"
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleStateClient for MemoryRoles {
    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> EngineResult<RoleChange> {
        self.check_denied(role_id)?;
        let inserted = self
            .members
            .lock()
            .entry((guild_id, user_id))
            .or_default()
            .insert(role_id);
        let change = if inserted {
            RoleChange::Applied
        } else {
            RoleChange::Unchanged
        };
        self.calls.lock().push(RoleCall::Add(role_id, change));
        Ok(change)
    }

    async fn remove_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> EngineResult<RoleChange> {
        self.check_denied(role_id)?;
        let removed = self
            .members
            .lock()
            .get_mut(&(guild_id, user_id))
            .is_some_and(|roles| roles.remove(&role_id));
        let change = if removed {
            RoleChange::Applied
        } else {
            RoleChange::Unchanged
        };
        self.calls.lock().push(RoleCall::Remove(role_id, change));
        Ok(change)
    }

    async fn highest_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> EngineResult<Option<RoleId>> {
        self.highest_fetches.fetch_add(1, Ordering::SeqCst);
        let ranks = self.ranks.lock();
        Ok(self
            .roles_of(guild_id, user_id)
            .into_iter()
            .max_by_key(|role| ranks.get(role).copied().unwrap_or_default()))
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Gateway lookups with configurable bots, deleted messages and latency.
#[derive(Default)]
pub struct MemoryGateway {
    bots: Mutex<HashSet<UserId>>,
    bot_lookup_delay: Mutex<Duration>,
    deleted_messages: Mutex<HashSet<MessageId>>,
    retracted: Mutex<Vec<ReactionEvent>>,
    fetches: AtomicUsize,
}

impl MemoryGateway {
    pub fn add_bot(&self, user_id: UserId) {
        self.bots.lock().insert(user_id);
    }

    /// Make every bot lookup take this long.
    pub fn set_bot_lookup_delay(&self, delay: Duration) {
        *self.bot_lookup_delay.lock() = delay;
    }

    pub fn delete_message(&self, message_id: MessageId) {
        self.deleted_messages.lock().insert(message_id);
    }

    pub fn retracted(&self) -> Vec<ReactionEvent> {
        self.retracted.lock().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayClient for MemoryGateway {
    async fn is_bot(&self, user_id: UserId) -> EngineResult<bool> {
        let delay = *self.bot_lookup_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.bots.lock().contains(&user_id))
    }

    async fn fetch_message(&self, _channel_id: ChannelId, message_id: MessageId) -> EngineResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.deleted_messages.lock().contains(&message_id) {
            return Err(EngineError::not_found(format!("message {message_id}")));
        }
        Ok(())
    }

    async fn retract_reaction(&self, event: &ReactionEvent) -> EngineResult<()> {
        self.retracted.lock().push(event.clone());
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Engine wired to in-memory collaborators.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub roles: Arc<MemoryRoles>,
    pub gateway: Arc<MemoryGateway>,
    pub ctx: Arc<EngineContext>,
    pub engine: ReactionRoleEngine,
}

impl Harness {
    /// Empty configuration with the default delays.
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::default()).await
    }

    /// Boot from a pre-populated store.
    pub async fn with_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let roles = Arc::new(MemoryRoles::default());
        let gateway = Arc::new(MemoryGateway::default());

        roles.set_rank(R1, 1);
        roles.set_rank(R2, 5);
        roles.set_rank(R3, 10);

        let cache = BindingCache::load(store.as_ref())
            .await
            .expect("boot load")
            .into_shared();
        let ctx = EngineContext::new(
            cache,
            store.clone(),
            roles.clone(),
            gateway.clone(),
            EngineTiming::default(),
        )
        .into_shared();
        let engine = ReactionRoleEngine::new(ctx.clone());

        Self {
            store,
            roles,
            gateway,
            ctx,
            engine,
        }
    }

    pub fn registry(&self) -> &FolderRegistry {
        self.engine.registry()
    }

    /// Join role `R1`, and `R2` bound to the gamer emoji on `MESSAGE`.
    pub async fn with_handoff_config() -> Self {
        let harness = Self::new().await;
        let registry = harness.registry();

        registry.add_join_role(GUILD, R1).await.expect("join role");
        let folder = registry.create_folder(GUILD, "Games").await.expect("folder");
        registry
            .add_role_binding(GUILD, folder.id, gamer_binding())
            .await
            .expect("binding");
        registry
            .publish_folder(GUILD, folder.id, CHANNEL, MESSAGE)
            .await
            .expect("publish");

        harness
    }

    pub fn roles_of_user(&self) -> BTreeSet<RoleId> {
        self.roles.roles_of(GUILD, USER)
    }

    /// Let queued workers run without advancing past any settling delay.
    pub async fn settle_queues(&self) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

pub fn gamer_binding() -> RoleBinding {
    RoleBinding::new(R2, "Gamer", EmojiKey::Unicode(GAMER.into()))
}

pub fn reaction(emoji: &str, direction: Direction) -> RawReactionEvent {
    RawReactionEvent {
        guild_id: Some(GUILD),
        channel_id: CHANNEL,
        message_id: MESSAGE,
        user_id: Some(USER),
        emoji_id: None,
        emoji_name: Some(emoji.to_string()),
        user_is_bot: Some(false),
        direction,
    }
}

pub fn roles(ids: &[RoleId]) -> BTreeSet<RoleId> {
    ids.iter().copied().collect()
}
