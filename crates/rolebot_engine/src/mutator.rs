//! Role mutation for canonical reaction events.

use crate::EngineContext;
use rolebot_core::{Direction, ReactionEvent, RoleBinding, RoleId};
use rolebot_error::{EngineError, EngineErrorKind, EngineResult};
use rolebot_interface::RoleChange;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What applying a reaction event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A bound role was added
    Granted {
        /// Role granted
        role_id: RoleId,
        /// Whether the member's role set changed
        change: RoleChange,
        /// Highest role held just before the grant, when join roles are configured
        highest_before: Option<RoleId>,
    },
    /// A bound role was removed
    Revoked {
        /// Role revoked
        role_id: RoleId,
        /// Whether the member's role set changed
        change: RoleChange,
    },
    /// An unbound emoji was added and the reaction was taken back
    ReactionRetracted,
    /// An unbound emoji was removed
    Unbound,
}

/// Applies reaction events to member role state.
#[derive(Debug, Clone)]
pub struct RoleMutator {
    ctx: Arc<EngineContext>,
}

impl RoleMutator {
    /// Create a mutator over a shared context.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Grant or revoke the role bound to the event's emoji.
    ///
    /// Adding a held role or removing an absent one succeeds as
    /// [`RoleChange::Unchanged`]. Errors are returned for the caller to log;
    /// nothing here retries.
    #[instrument(
        skip(self, event),
        fields(
            guild_id = %event.guild_id,
            message_id = %event.message_id,
            user_id = %event.user_id,
            emoji = %event.emoji,
            direction = %event.direction,
        )
    )]
    pub async fn apply(&self, event: &ReactionEvent) -> EngineResult<MutationOutcome> {
        let Some(binding) = self.lookup(event) else {
            return match event.direction {
                Direction::Add => {
                    debug!("Emoji is unbound, retracting reaction");
                    self.ctx.gateway().retract_reaction(event).await?;
                    Ok(MutationOutcome::ReactionRetracted)
                }
                Direction::Remove => Ok(MutationOutcome::Unbound),
            };
        };
        let role_id = *binding.role_id();

        match event.direction {
            Direction::Add => {
                let highest_before = self.highest_role_before_grant(event).await;
                self.revalidate(event, &binding)?;

                let change = self
                    .ctx
                    .roles()
                    .add_role(event.guild_id, event.user_id, role_id)
                    .await?;
                debug!(%role_id, %change, "Role granted");

                Ok(MutationOutcome::Granted {
                    role_id,
                    change,
                    highest_before,
                })
            }
            Direction::Remove => {
                let change = self
                    .ctx
                    .roles()
                    .remove_role(event.guild_id, event.user_id, role_id)
                    .await?;
                debug!(%role_id, %change, "Role revoked");

                Ok(MutationOutcome::Revoked { role_id, change })
            }
        }
    }

    fn lookup(&self, event: &ReactionEvent) -> Option<RoleBinding> {
        self.ctx
            .cache()
            .read()
            .binding(event.guild_id, event.message_id, &event.emoji)
    }

    /// Snapshot for the join-role handoff, taken only when join roles exist.
    ///
    /// A failed fetch yields `None`, which never matches the anchor role.
    async fn highest_role_before_grant(&self, event: &ReactionEvent) -> Option<RoleId> {
        if self
            .ctx
            .cache()
            .read()
            .first_join_role(event.guild_id)
            .is_none()
        {
            return None;
        }

        match self
            .ctx
            .roles()
            .highest_role(event.guild_id, event.user_id)
            .await
        {
            Ok(highest) => highest,
            Err(e) => {
                warn!(error = %e, "Could not fetch highest role before grant");
                None
            }
        }
    }

    /// The binding may have been deleted while the snapshot was in flight.
    fn revalidate(&self, event: &ReactionEvent, binding: &RoleBinding) -> EngineResult<()> {
        match self.lookup(event) {
            Some(current) if current.role_id() == binding.role_id() => Ok(()),
            _ => Err(EngineError::new(EngineErrorKind::StaleCacheConflict(format!(
                "binding for {} on message {} changed before grant",
                event.emoji, event.message_id
            )))),
        }
    }
}
