//! End-to-end reaction and join-role behaviour against in-memory collaborators.

mod common;

use common::*;
use rolebot_core::{
    Direction, EmojiKey, JoinRole, MemberJoin, MessageBinding, MessageId, ReactMessage, RoleDeleted,
    UserId,
};
use rolebot_engine::{IgnoreReason, RouteDecision};
use rolebot_interface::RoleChange;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

fn join() -> MemberJoin {
    MemberJoin {
        guild_id: GUILD,
        user_id: USER,
    }
}

#[tokio::test(start_paused = true)]
async fn test_join_then_react_hands_off_join_roles() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_member_join(join());
    h.settle_queues().await;
    assert_eq!(h.roles_of_user(), roles(&[R1]));

    let t0 = Instant::now();
    let decision = h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    assert!(decision.accepted().is_some());

    sleep_until(t0 + Duration::from_millis(1400)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1]), "settling delay not honoured");

    sleep_until(t0 + Duration::from_millis(1600)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1, R2]));

    sleep_until(t0 + Duration::from_millis(6400)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1, R2]), "join roles removed early");

    sleep_until(t0 + Duration::from_millis(6600)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2]));
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_higher_role_blocks_handoff() {
    let h = Harness::with_handoff_config().await;
    h.roles.give(GUILD, USER, R3);

    let t0 = Instant::now();
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;

    sleep_until(t0 + Duration::from_millis(1600)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2, R3]));

    sleep_until(t0 + Duration::from_secs(30)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2, R3]));
    assert!(
        h.roles
            .calls()
            .iter()
            .all(|call| matches!(call, RoleCall::Add(..)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_join_role_kept_when_member_outranks_it() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_member_join(join());
    h.settle_queues().await;
    h.roles.give(GUILD, USER, R3);

    let t0 = Instant::now();
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;

    sleep_until(t0 + Duration::from_secs(30)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1, R2, R3]));
}

#[tokio::test(start_paused = true)]
async fn test_regrant_of_held_role_does_not_schedule_removal() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_member_join(join());
    h.settle_queues().await;
    h.roles.give(GUILD, USER, R2);

    let t0 = Instant::now();
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;

    sleep_until(t0 + Duration::from_secs(30)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1, R2]));
}

#[tokio::test(start_paused = true)]
async fn test_react_unreact_react_still_loses_join_roles_on_schedule() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_member_join(join());
    h.settle_queues().await;

    let t0 = Instant::now();
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    sleep_until(t0 + Duration::from_millis(2000)).await;
    h.engine.handle_reaction(reaction(GAMER, Direction::Remove)).await;
    sleep_until(t0 + Duration::from_millis(2500)).await;
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;

    // First grant at 1.5s, removal at 6.5s regardless of the second grant.
    sleep_until(t0 + Duration::from_millis(6600)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2]));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_add_grants_once() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    sleep_until(Instant::now() + Duration::from_secs(2)).await;

    assert_eq!(h.roles_of_user(), roles(&[R2]));
    assert_eq!(h.roles.count(RoleCall::Add(R2, RoleChange::Applied)), 1);
    assert_eq!(h.roles.count(RoleCall::Add(R2, RoleChange::Unchanged)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_remove_revokes_once() {
    let h = Harness::with_handoff_config().await;
    h.roles.give(GUILD, USER, R2);

    h.engine.handle_reaction(reaction(GAMER, Direction::Remove)).await;
    h.engine.handle_reaction(reaction(GAMER, Direction::Remove)).await;
    sleep_until(Instant::now() + Duration::from_secs(2)).await;

    assert!(h.roles_of_user().is_empty());
    assert_eq!(h.roles.count(RoleCall::Remove(R2, RoleChange::Applied)), 1);
    assert_eq!(h.roles.count(RoleCall::Remove(R2, RoleChange::Unchanged)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unbound_emoji_is_retracted_without_mutation() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_reaction(reaction("🍕", Direction::Add)).await;
    sleep_until(Instant::now() + Duration::from_secs(2)).await;

    let retracted = h.gateway.retracted();
    assert_eq!(retracted.len(), 1);
    assert_eq!(retracted[0].user_id, USER);
    assert!(h.roles.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unbound_emoji_removal_is_a_noop() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_reaction(reaction("🍕", Direction::Remove)).await;
    sleep_until(Instant::now() + Duration::from_secs(2)).await;

    assert!(h.gateway.retracted().is_empty());
    assert!(h.roles.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_bot_reactions_are_ignored() {
    let h = Harness::with_handoff_config().await;
    let bot = UserId::new(999);
    h.gateway.add_bot(bot);

    let mut flagged = reaction(GAMER, Direction::Add);
    flagged.user_is_bot = Some(true);
    assert_eq!(
        h.engine.handle_reaction(flagged).await,
        RouteDecision::Ignored(IgnoreReason::Bot)
    );

    let mut looked_up = reaction(GAMER, Direction::Add);
    looked_up.user_id = Some(bot);
    looked_up.user_is_bot = None;
    assert_eq!(
        h.engine.handle_reaction(looked_up).await,
        RouteDecision::Ignored(IgnoreReason::Bot)
    );

    sleep_until(Instant::now() + Duration::from_secs(2)).await;
    assert!(h.roles.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_events_outside_guilds_or_react_messages_are_ignored() {
    let h = Harness::with_handoff_config().await;

    let mut direct = reaction(GAMER, Direction::Add);
    direct.guild_id = None;
    assert_eq!(
        h.engine.handle_reaction(direct).await,
        RouteDecision::Ignored(IgnoreReason::NoGuild)
    );

    let mut anonymous = reaction(GAMER, Direction::Add);
    anonymous.user_id = None;
    assert_eq!(
        h.engine.handle_reaction(anonymous).await,
        RouteDecision::Ignored(IgnoreReason::NoUser)
    );

    let mut nameless = reaction(GAMER, Direction::Add);
    nameless.emoji_name = None;
    assert_eq!(
        h.engine.handle_reaction(nameless).await,
        RouteDecision::Ignored(IgnoreReason::UnresolvableEmoji)
    );

    let mut elsewhere = reaction(GAMER, Direction::Add);
    elsewhere.message_id = MessageId::new(12345);
    assert_eq!(
        h.engine.handle_reaction(elsewhere.clone()).await,
        RouteDecision::Ignored(IgnoreReason::NotReactMessage)
    );
    assert_eq!(h.gateway.fetches(), 1);

    // Negative result is remembered.
    h.engine.handle_reaction(elsewhere).await;
    assert_eq!(h.gateway.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_seen_message_is_fetched_and_populated() {
    let store = MemoryStore::default();
    let h = Harness::with_store(store).await;

    // Binding written after boot, so only the store knows about it.
    h.store.seed_message_binding(MessageBinding {
        message: ReactMessage {
            guild_id: GUILD,
            channel_id: CHANNEL,
            message_id: MESSAGE,
        },
        binding: gamer_binding(),
    });

    let decision = h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    assert!(decision.accepted().is_some());
    assert_eq!(h.gateway.fetches(), 1);

    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    assert_eq!(h.gateway.fetches(), 1);

    sleep_until(Instant::now() + Duration::from_secs(2)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2]));
}

#[tokio::test(start_paused = true)]
async fn test_deleted_message_is_not_relevant() {
    let h = Harness::new().await;
    h.gateway.delete_message(MESSAGE);

    assert_eq!(
        h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await,
        RouteDecision::Ignored(IgnoreReason::NotReactMessage)
    );
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    assert_eq!(h.gateway.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_mutation_does_not_stall_queue() {
    let h = Harness::with_handoff_config().await;
    h.roles.deny(R2);

    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    h.engine.handle_reaction(reaction("🍕", Direction::Add)).await;
    sleep_until(Instant::now() + Duration::from_secs(2)).await;

    assert!(h.roles_of_user().is_empty());
    assert_eq!(h.gateway.retracted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_binding_deleted_during_settling_delay_grants_nothing() {
    let h = Harness::with_handoff_config().await;

    let t0 = Instant::now();
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    sleep_until(t0 + Duration::from_millis(500)).await;
    h.engine
        .handle_role_deleted(RoleDeleted {
            guild_id: GUILD,
            role_id: R2,
        })
        .await;

    sleep_until(t0 + Duration::from_secs(2)).await;
    assert!(h.roles_of_user().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_role_deletion_cascades_everywhere() {
    let h = Harness::with_handoff_config().await;
    h.registry().add_join_role(GUILD, R2).await.unwrap();

    h.engine
        .handle_role_deleted(RoleDeleted {
            guild_id: GUILD,
            role_id: R2,
        })
        .await;

    let cache = h.ctx.cache().read();
    assert_eq!(
        cache.binding(GUILD, MESSAGE, &EmojiKey::Unicode(GAMER.into())),
        None
    );
    assert!(!cache.is_react_message(GUILD, MESSAGE));
    let folder_id = cache.folder_id_at(GUILD, 0).unwrap();
    assert!(cache.folder(folder_id).unwrap().roles.is_empty());
    assert_eq!(cache.join_roles(GUILD), &[JoinRole::from(R1)]);
    drop(cache);

    assert_eq!(h.store.react_message_rows(), 0);
    assert_eq!(h.store.react_role_rows(), 0);
    assert_eq!(h.store.join_role_rows(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_pending_handoff() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_member_join(join());
    h.settle_queues().await;

    let t0 = Instant::now();
    h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    sleep_until(t0 + Duration::from_millis(1600)).await;
    h.engine.shutdown();

    sleep_until(t0 + Duration::from_secs(10)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1, R2]));

    h.engine.handle_reaction(reaction(GAMER, Direction::Remove)).await;
    sleep_until(t0 + Duration::from_secs(15)).await;
    assert_eq!(h.roles_of_user(), roles(&[R1, R2]));
}

#[tokio::test(start_paused = true)]
async fn test_guild_removal_purges_cache() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_guild_removed(GUILD);

    let cache = h.ctx.cache().read();
    assert!(cache.folders(GUILD).is_empty());
    assert!(cache.join_roles(GUILD).is_empty());
    assert!(!cache.is_react_message(GUILD, MESSAGE));
    drop(cache);
    assert_eq!(h.store.folder_rows(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_bot_lookup_keeps_arrival_order() {
    let h = Harness::with_handoff_config().await;
    h.roles.give(GUILD, USER, R2);
    h.gateway.set_bot_lookup_delay(Duration::from_millis(200));

    // Removal payloads carry no member, so the user has to be looked up.
    let mut remove = reaction(GAMER, Direction::Remove);
    remove.user_is_bot = None;

    let (removed, added) = tokio::join!(h.engine.handle_reaction(remove), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await
    });
    assert!(removed.accepted().is_some());
    assert!(added.accepted().is_some());

    sleep_until(Instant::now() + Duration::from_secs(2)).await;
    assert_eq!(
        h.roles.calls(),
        vec![
            RoleCall::Remove(R2, RoleChange::Applied),
            RoleCall::Add(R2, RoleChange::Applied),
        ]
    );
    assert_eq!(h.roles_of_user(), roles(&[R2]));
}

#[tokio::test(start_paused = true)]
async fn test_reaction_after_guild_removal_is_resolved_from_store() {
    let h = Harness::with_handoff_config().await;
    h.engine.handle_guild_removed(GUILD);

    let decision = h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    assert!(decision.accepted().is_some());
    assert_eq!(h.gateway.fetches(), 1);

    sleep_until(Instant::now() + Duration::from_secs(2)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2]));
}

#[tokio::test(start_paused = true)]
async fn test_returning_guild_gets_configuration_back() {
    let h = Harness::with_handoff_config().await;

    h.engine.handle_guild_removed(GUILD);
    h.engine.handle_guild_available(GUILD).await;

    {
        let cache = h.ctx.cache().read();
        assert_eq!(cache.folders(GUILD).len(), 1);
        assert_eq!(cache.join_roles(GUILD), &[JoinRole::from(R1)]);
        assert!(cache.is_react_message(GUILD, MESSAGE));
    }

    h.engine.handle_member_join(join());
    h.settle_queues().await;
    assert_eq!(h.roles_of_user(), roles(&[R1]));

    let t0 = Instant::now();
    let decision = h.engine.handle_reaction(reaction(GAMER, Direction::Add)).await;
    assert!(decision.accepted().is_some());
    assert_eq!(h.gateway.fetches(), 0);

    sleep_until(t0 + Duration::from_millis(6600)).await;
    assert_eq!(h.roles_of_user(), roles(&[R2]));
}

#[tokio::test(start_paused = true)]
async fn test_guild_available_without_removal_keeps_cache() {
    let h = Harness::with_handoff_config().await;
    let other = MessageId::new(301);
    h.store.seed_message_binding(MessageBinding {
        message: ReactMessage {
            guild_id: GUILD,
            channel_id: CHANNEL,
            message_id: other,
        },
        binding: gamer_binding(),
    });

    h.engine.handle_guild_available(GUILD).await;

    assert!(!h.ctx.cache().read().is_react_message(GUILD, other));
}
