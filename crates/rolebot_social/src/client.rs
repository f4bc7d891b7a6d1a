//! Discord bot client setup and lifecycle management.

use crate::handler::{Dispatch, RolebotHandler};
use crate::{CommandConfig, CommandExecutor, DiscordError, DiscordErrorKind, DiscordResult, SerenityPlatform};
use rolebot_cache::SharedBindingCache;
use rolebot_engine::{EngineContext, EngineTiming, ReactionRoleEngine};
use rolebot_interface::ReactRoleStore;
use serenity::Client;
use serenity::gateway::ShardManager;
use std::sync::{Arc, OnceLock};
use tracing::{info, instrument};

/// Main Discord bot client for Rolebot.
///
/// Owns the serenity client and the reaction-role engine driven by it.
///
/// # Example
/// ```no_run
/// use rolebot_cache::BindingCache;
/// use rolebot_database::{PgReactRoleStore, establish_pool};
/// use rolebot_engine::EngineTiming;
/// use rolebot_social::{CommandConfig, RolebotBot};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = std::env::var("DISCORD_TOKEN")?;
///     let store = Arc::new(PgReactRoleStore::new(establish_pool(&std::env::var("DATABASE_URL")?)?));
///     let cache = BindingCache::load(store.as_ref()).await?.into_shared();
///
///     let mut bot = RolebotBot::new(&token, cache, store, EngineTiming::default(), CommandConfig::default()).await?;
///     bot.start().await?;
///     Ok(())
/// }
/// ```
pub struct RolebotBot {
    client: Client,
    engine: Arc<ReactionRoleEngine>,
}

impl RolebotBot {
    /// Build the client and the engine behind it.
    ///
    /// # Errors
    /// Returns an error if the serenity client fails to initialize.
    #[instrument(skip_all, fields(token_len = token.len()))]
    pub async fn new(
        token: &str,
        cache: SharedBindingCache,
        store: Arc<dyn ReactRoleStore>,
        timing: EngineTiming,
        commands: CommandConfig,
    ) -> DiscordResult<Self> {
        info!("Initializing Rolebot Discord bot");

        let dispatch = Arc::new(OnceLock::new());
        let handler = RolebotHandler::new(dispatch.clone());
        let intents = RolebotHandler::intents();

        info!(?intents, "Building Serenity client");

        let client = Client::builder(token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| {
                DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                    "Failed to build client: {}",
                    e
                )))
            })?;

        let platform = Arc::new(SerenityPlatform::new(client.http.clone()));
        let ctx = EngineContext::new(cache, store, platform.clone(), platform, timing).into_shared();
        let engine = Arc::new(ReactionRoleEngine::new(ctx));

        if dispatch
            .set(Dispatch {
                engine: engine.clone(),
                commands: CommandExecutor::new(engine.clone(), commands),
            })
            .is_err()
        {
            return Err(DiscordError::new(DiscordErrorKind::ConnectionFailed(
                "Engine installed twice".to_string(),
            )));
        }

        info!("Serenity client built successfully");

        Ok(Self { client, engine })
    }

    /// The reaction-role engine.
    pub fn engine(&self) -> &Arc<ReactionRoleEngine> {
        &self.engine
    }

    /// Shard manager, for shutting the gateway down from another task.
    pub fn shard_manager(&self) -> Arc<ShardManager> {
        self.client.shard_manager.clone()
    }

    /// Connect and run until the gateway shuts down.
    ///
    /// # Errors
    /// Returns an error if the client fails to start or hits a fatal error.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> DiscordResult<()> {
        info!("Starting Discord bot");

        let result = self.client.start().await.map_err(|e| {
            DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                "Client error: {}",
                e
            )))
        });

        self.engine.shutdown();
        result
    }
}
