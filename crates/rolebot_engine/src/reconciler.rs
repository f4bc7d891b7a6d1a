//! Join-role grant and timed handoff.
//!
//! A member receives every configured join role on arrival. When a
//! reaction later grants them a role, and the highest role they held just
//! before that grant was the guild's first join role, every join role is
//! revoked after a grace period.
//!
//! Removals are never cancelled once scheduled, except by engine
//! shutdown. A member who reacts, unreacts and reacts again inside the
//! grace period still loses their join roles on the first schedule, and
//! overlapping removals for one member are not coalesced.

use crate::{EngineContext, ScheduledTask};
use derive_getters::Getters;
use rolebot_core::{GuildId, MemberJoin, RoleId, UserId};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tally of a best-effort batch of join-role mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct JoinRoleReport {
    /// Mutations the platform accepted, including no-ops
    succeeded: usize,
    /// Mutations that failed and were logged
    failed: usize,
}

/// Drives join-role grants and their timed removal.
#[derive(Debug, Clone)]
pub struct JoinRoleReconciler {
    ctx: Arc<EngineContext>,
}

impl JoinRoleReconciler {
    /// Create a reconciler over a shared context.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Grant every configured join role to a new member.
    ///
    /// Best effort: each failure is logged and the rest still run.
    #[instrument(skip(self), fields(guild_id = %join.guild_id, user_id = %join.user_id))]
    pub async fn on_member_join(&self, join: MemberJoin) -> JoinRoleReport {
        let roles = self.join_role_ids(join.guild_id);
        if roles.is_empty() {
            debug!("Guild has no join roles");
            return JoinRoleReport::default();
        }

        let mut report = JoinRoleReport::default();
        for role_id in roles {
            match self
                .ctx
                .roles()
                .add_role(join.guild_id, join.user_id, role_id)
                .await
            {
                Ok(change) => {
                    debug!(%role_id, %change, "Join role granted");
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(%role_id, error = %e, "Join role grant failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// React to a successful reaction-role grant.
    ///
    /// `highest_before` is the member's highest role observed immediately
    /// before the grant. Removal is scheduled only when it equals the
    /// guild's first join role.
    #[instrument(skip(self))]
    pub fn on_reaction_grant(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        highest_before: Option<RoleId>,
    ) -> Option<ScheduledTask> {
        let anchor = self.ctx.cache().read().first_join_role(guild_id)?;
        if highest_before != Some(anchor) {
            debug!(%anchor, "Member holds more than join roles, keeping them");
            return None;
        }

        let grace = self.ctx.timing().join_role_grace();
        info!(?grace, "Scheduling join role removal");

        let reconciler = self.clone();
        Some(
            self.ctx
                .scheduler()
                .schedule("join_role_removal", grace, async move {
                    reconciler.revoke_join_roles(guild_id, user_id).await;
                }),
        )
    }

    /// Revoke every join role currently configured for the guild.
    ///
    /// The configuration is read when this runs, not when it was scheduled.
    #[instrument(skip(self))]
    pub async fn revoke_join_roles(&self, guild_id: GuildId, user_id: UserId) -> JoinRoleReport {
        let mut report = JoinRoleReport::default();
        for role_id in self.join_role_ids(guild_id) {
            match self
                .ctx
                .roles()
                .remove_role(guild_id, user_id, role_id)
                .await
            {
                Ok(change) => {
                    debug!(%role_id, %change, "Join role revoked");
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(%role_id, error = %e, "Join role revoke failed");
                    report.failed += 1;
                }
            }
        }
        info!(?report, "Join role handoff complete");
        report
    }

    fn join_role_ids(&self, guild_id: GuildId) -> Vec<RoleId> {
        self.ctx
            .cache()
            .read()
            .join_roles(guild_id)
            .iter()
            .map(|r| r.role_id)
            .collect()
    }
}
