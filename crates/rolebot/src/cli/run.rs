//! Bot and migration entry points.

use rolebot::{
    BindingCache, PgReactRoleStore, RolebotBot, RolebotConfig, RolebotResult, establish_pool,
    required_env, run_migrations,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Connect to Discord and serve until ctrl-c or a fatal gateway error.
#[instrument(skip_all)]
pub async fn run_bot(config: RolebotConfig) -> RolebotResult<()> {
    let token = required_env("DISCORD_TOKEN")?;
    let database_url = required_env("DATABASE_URL")?;

    let pool = establish_pool(&database_url)?;
    run_migrations(&pool)?;
    let store = Arc::new(PgReactRoleStore::new(pool));

    // Without the cache no event can be routed, so a load failure is fatal.
    let cache = BindingCache::load(store.as_ref()).await?.into_shared();

    let mut bot = RolebotBot::new(
        &token,
        cache,
        store,
        config.timing().clone(),
        config.commands().clone(),
    )
    .await?;

    let shard_manager = bot.shard_manager();
    let engine = bot.engine().clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Could not listen for ctrl-c");
            return;
        }
        info!("Shutdown requested");
        engine.shutdown();
        shard_manager.shutdown_all().await;
    });

    bot.start().await?;
    info!("Bot stopped");
    Ok(())
}

/// Apply pending migrations.
#[instrument]
pub fn migrate() -> RolebotResult<()> {
    let database_url = required_env("DATABASE_URL")?;
    let pool = establish_pool(&database_url)?;
    let applied = run_migrations(&pool)?;
    info!(applied, "Migrations complete");
    Ok(())
}
