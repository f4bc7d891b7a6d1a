//! Per-guild ordered dispatch of reaction and join events.

use crate::{
    EngineContext, EventRouter, FolderRegistry, IgnoreReason, JoinRoleReconciler,
    MutationOutcome, RoleMutator, RouteDecision,
};
use parking_lot::Mutex;
use rolebot_core::{GuildId, MemberJoin, RawReactionEvent, ReactionEvent, RoleDeleted};
use rolebot_interface::RoleChange;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Event waiting to be routed, in guild arrival order.
#[derive(Debug)]
enum Inbound {
    /// Raw reaction and the channel its routing decision goes back on
    Reaction {
        raw: RawReactionEvent,
        ready_at: Instant,
        reply: oneshot::Sender<RouteDecision>,
    },
    /// Member arrival
    Join(MemberJoin),
}

/// Work item on a guild queue.
#[derive(Debug)]
enum GuildJob {
    /// Canonical reaction, held until its settling deadline
    Reaction {
        event: ReactionEvent,
        ready_at: Instant,
    },
    /// Member arrival
    Join(MemberJoin),
}

/// Reaction-role engine.
///
/// Each guild has two tasks joined by a queue. Events take their place in
/// the guild's intake synchronously on arrival; the intake task routes
/// them one at a time, so a slow lookup for one event holds back the
/// events behind it instead of letting them overtake. Accepted reactions
/// carry a deadline one settling delay after arrival, and the worker task
/// waits for it before applying, so events of a guild are applied in
/// arrival order and never concurrently.
pub struct ReactionRoleEngine {
    ctx: Arc<EngineContext>,
    router: EventRouter,
    registry: FolderRegistry,
    intakes: Mutex<HashMap<GuildId, mpsc::UnboundedSender<Inbound>>>,
    departed: Mutex<HashSet<GuildId>>,
}

impl ReactionRoleEngine {
    /// Create an engine. Guild tasks start lazily.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            router: EventRouter::new(ctx.clone()),
            registry: FolderRegistry::new(ctx.clone()),
            ctx,
            intakes: Mutex::new(HashMap::new()),
            departed: Mutex::new(HashSet::new()),
        }
    }

    /// Shared context.
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// Folder, binding and join-role CRUD.
    pub fn registry(&self) -> &FolderRegistry {
        &self.registry
    }

    /// Queue a raw reaction for routing and wait for the decision.
    ///
    /// The event's place in its guild's order is taken before this first
    /// suspends.
    #[instrument(skip(self, raw), fields(message_id = %raw.message_id))]
    pub async fn handle_reaction(&self, raw: RawReactionEvent) -> RouteDecision {
        let Some(guild_id) = raw.guild_id else {
            debug!(reason = %IgnoreReason::NoGuild, "Reaction ignored");
            return RouteDecision::Ignored(IgnoreReason::NoGuild);
        };

        let ready_at = Instant::now() + self.ctx.timing().settle_delay();
        let (reply, decision) = oneshot::channel();
        self.enqueue(guild_id, Inbound::Reaction { raw, ready_at, reply });

        let decision = decision
            .await
            .unwrap_or(RouteDecision::Ignored(IgnoreReason::ShuttingDown));
        if let RouteDecision::Ignored(reason) = &decision {
            debug!(%reason, "Reaction ignored");
        }
        decision
    }

    /// Queue join-role grants for a new member.
    #[instrument(skip(self))]
    pub fn handle_member_join(&self, join: MemberJoin) {
        self.enqueue(join.guild_id, Inbound::Join(join));
    }

    /// Cascade a platform role deletion through the configuration.
    #[instrument(skip(self))]
    pub async fn handle_role_deleted(&self, deleted: RoleDeleted) {
        if let Err(e) = self
            .registry
            .remove_role_binding(deleted.guild_id, deleted.role_id)
            .await
        {
            error!(
                guild_id = %deleted.guild_id,
                role_id = %deleted.role_id,
                error = %e,
                "Role deletion cleanup failed"
            );
        }
    }

    /// Forget a guild the bot can no longer reach.
    ///
    /// The guild's intake is closed; its tasks drain what is queued and
    /// exit. The guild is reloaded from the store if it becomes available
    /// again.
    #[instrument(skip(self))]
    pub fn handle_guild_removed(&self, guild_id: GuildId) {
        self.intakes.lock().remove(&guild_id);
        self.departed.lock().insert(guild_id);
        self.registry.purge_guild(guild_id);
    }

    /// Restore the configuration of a guild that was removed earlier.
    ///
    /// Guilds the engine never saw leave are already cached and are left
    /// alone. A failed reload is retried on the next availability event.
    #[instrument(skip(self))]
    pub async fn handle_guild_available(&self, guild_id: GuildId) {
        if !self.departed.lock().remove(&guild_id) {
            return;
        }

        if let Err(e) = self.registry.reload_guild(guild_id).await {
            error!(error = %e, "Could not reload returning guild");
            self.departed.lock().insert(guild_id);
        }
    }

    /// Stop every guild task and abandon pending scheduled tasks.
    pub fn shutdown(&self) {
        info!("Reaction role engine shutting down");
        self.ctx.scheduler().shutdown();
        self.intakes.lock().clear();
    }

    fn enqueue(&self, guild_id: GuildId, inbound: Inbound) {
        if self.ctx.scheduler().is_shut_down() {
            debug!(%guild_id, "Engine shut down, dropping event");
            return;
        }

        let mut intakes = self.intakes.lock();
        let sender = intakes.entry(guild_id).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let intake = GuildIntake {
                ctx: self.ctx.clone(),
                router: self.router.clone(),
                guild_id,
            };
            tokio::spawn(intake.run(rx));
            tx
        });

        if let Err(mpsc::error::SendError(inbound)) = sender.send(inbound) {
            warn!(%guild_id, ?inbound, "Guild intake gone, dropping event");
            intakes.remove(&guild_id);
        }
    }
}

/// Router of one guild's events, in arrival order.
struct GuildIntake {
    ctx: Arc<EngineContext>,
    router: EventRouter,
    guild_id: GuildId,
}

impl GuildIntake {
    #[instrument(skip(self, rx), fields(guild_id = %self.guild_id))]
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Inbound>) {
        let shutdown = self.ctx.scheduler().shutdown_token();
        let (jobs, job_rx) = mpsc::unbounded_channel();
        tokio::spawn(GuildWorker::new(self.ctx.clone(), self.guild_id).run(job_rx));

        loop {
            let inbound = tokio::select! {
                _ = shutdown.cancelled() => break,
                inbound = rx.recv() => match inbound {
                    Some(inbound) => inbound,
                    None => break,
                },
            };

            let job = match inbound {
                Inbound::Reaction { raw, ready_at, reply } => {
                    let decision = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        decision = self.router.route(raw) => decision,
                    };
                    let job = decision.accepted().map(|event| GuildJob::Reaction {
                        event: event.clone(),
                        ready_at,
                    });
                    // The caller may have stopped waiting; the event still applies.
                    let _ = reply.send(decision);
                    match job {
                        Some(job) => job,
                        None => continue,
                    }
                }
                Inbound::Join(join) => GuildJob::Join(join),
            };

            if jobs.send(job).is_err() {
                warn!("Guild worker gone, closing intake");
                break;
            }
        }

        debug!("Guild intake stopped");
    }
}

/// Consumer of one guild's queue.
struct GuildWorker {
    ctx: Arc<EngineContext>,
    guild_id: GuildId,
    mutator: RoleMutator,
    reconciler: JoinRoleReconciler,
}

impl GuildWorker {
    fn new(ctx: Arc<EngineContext>, guild_id: GuildId) -> Self {
        Self {
            mutator: RoleMutator::new(ctx.clone()),
            reconciler: JoinRoleReconciler::new(ctx.clone()),
            ctx,
            guild_id,
        }
    }

    #[instrument(skip(self, rx), fields(guild_id = %self.guild_id))]
    async fn run(self, mut rx: mpsc::UnboundedReceiver<GuildJob>) {
        debug!("Guild worker started");
        let shutdown = self.ctx.scheduler().shutdown_token();

        loop {
            let job = tokio::select! {
                _ = shutdown.cancelled() => break,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            match job {
                GuildJob::Reaction { event, ready_at } => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep_until(ready_at) => {}
                    }
                    self.apply_reaction(&event).await;
                }
                GuildJob::Join(join) => {
                    let report = self.reconciler.on_member_join(join).await;
                    debug!(?report, "Join roles granted");
                }
            }
        }

        debug!("Guild worker stopped");
    }

    async fn apply_reaction(&self, event: &ReactionEvent) {
        match self.mutator.apply(event).await {
            Ok(MutationOutcome::Granted {
                change: RoleChange::Applied,
                highest_before,
                ..
            }) => {
                self.reconciler
                    .on_reaction_grant(event.guild_id, event.user_id, highest_before);
            }
            Ok(outcome) => debug!(?outcome, "Reaction applied"),
            Err(e) if e.is_not_found() => {
                info!(user_id = %event.user_id, message_id = %event.message_id, error = %e, "Reaction target vanished");
            }
            Err(e) if e.is_retryable() => {
                warn!(user_id = %event.user_id, message_id = %event.message_id, error = %e, "Reaction not applied");
            }
            Err(e) => {
                error!(user_id = %event.user_id, message_id = %event.message_id, error = %e, "Reaction failed");
            }
        }
    }
}
