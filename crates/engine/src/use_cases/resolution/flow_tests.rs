//! Transition flows over real in-memory wiring.
//!
//! These tests assemble the same pieces the app composes: in-memory stores,
//! the session hub, the referee executor, and an authority router per party.
//! Player-side routers go through the loopback channel, so the routed path
//! (send, receipt, applied confirmation) is exercised end to end.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use rollgate_domain::{
    Actor, ActorId, AdditionalEffect, ApplyOn, CustomEffect, MessagePatch, MessageSubtype,
    NaturalFace, ResolutionMessage, Roll, RollOptions, TargetRef, UserId, Visibility,
    HP_RESOURCE, LUCK_RESOURCE,
};
use rollgate_shared::SessionEvent;

use crate::authority::{AuthorityError, AuthorityExecutor, AuthorityRouter, SessionAuthority};
use crate::infrastructure::loopback::{DisconnectedChannel, LoopbackChannel};
use crate::infrastructure::memory::{InMemoryActorStore, InMemoryMessageStore};
use crate::infrastructure::ports::{ActorStore, ChannelError, DiceRoller, MessageStore};
use crate::infrastructure::system::{FixedClock, FixedRandom, FormulaRoller};
use crate::session::{Participant, SessionHub};
use crate::stores::TransitionLocks;
use crate::use_cases::effects::ApplyEffect;

use super::{ResolutionUseCases, TransitionError};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()
}

/// One session's referee-side plumbing plus the shared in-process stores.
struct Session {
    messages: Arc<InMemoryMessageStore>,
    actors: Arc<InMemoryActorStore>,
    hub: Arc<SessionHub>,
    executor: Arc<AuthorityExecutor>,
}

impl Session {
    /// `draw` fixes every die face rolled anywhere in the session.
    fn new(draw: i32) -> Self {
        let messages = Arc::new(InMemoryMessageStore::new());
        let actors = Arc::new(InMemoryActorStore::new());
        let hub = Arc::new(SessionHub::new());
        let dice: Arc<dyn DiceRoller> = Arc::new(FormulaRoller::new(Arc::new(FixedRandom(draw))));
        let apply_effect = Arc::new(ApplyEffect::new(actors.clone(), dice, hub.clone()));
        let executor = Arc::new(AuthorityExecutor::new(
            messages.clone(),
            actors.clone(),
            apply_effect,
            hub.clone(),
        ));
        Self {
            messages,
            actors,
            hub,
            executor,
        }
    }

    /// Transitions running on the referee: authoritative writes.
    fn referee_transitions(&self, draw: i32, combo_rolls: bool) -> ResolutionUseCases {
        let authority = Arc::new(AuthorityRouter::new(
            Arc::new(SessionAuthority::referee()),
            self.executor.clone(),
            self.hub.clone(),
            Duration::from_secs(1),
        ));
        self.transitions(authority, draw, combo_rolls)
    }

    /// Transitions running on a player peer: writes routed over loopback to
    /// the referee executor, reads against the shared in-process replica.
    fn player_transitions(&self, draw: i32, combo_rolls: bool) -> ResolutionUseCases {
        let channel = Arc::new(LoopbackChannel::new(self.executor.clone()));
        let authority = Arc::new(AuthorityRouter::new(
            Arc::new(SessionAuthority::player(channel)),
            self.executor.clone(),
            self.hub.clone(),
            Duration::from_secs(1),
        ));
        self.transitions(authority, draw, combo_rolls)
    }

    /// Transitions on a player peer whose referee is gone.
    fn stranded_transitions(&self, draw: i32) -> ResolutionUseCases {
        let authority = Arc::new(AuthorityRouter::new(
            Arc::new(SessionAuthority::player(Arc::new(DisconnectedChannel))),
            self.executor.clone(),
            self.hub.clone(),
            Duration::from_millis(50),
        ));
        self.transitions(authority, draw, false)
    }

    fn transitions(
        &self,
        authority: Arc<AuthorityRouter>,
        draw: i32,
        combo_rolls: bool,
    ) -> ResolutionUseCases {
        ResolutionUseCases::new(
            self.messages.clone(),
            self.actors.clone(),
            Arc::new(FormulaRoller::new(Arc::new(FixedRandom(draw)))),
            Arc::new(FixedClock(fixed_now())),
            Arc::new(NaturalFace::default()),
            authority,
            Arc::new(TransitionLocks::new()),
            self.hub.clone(),
            combo_rolls,
        )
    }

    fn seed_actor(&self, actor: Actor) -> ActorId {
        let id = actor.id;
        self.actors.insert(actor);
        id
    }

    async fn post(&self, message: ResolutionMessage) -> ResolutionMessage {
        self.messages.create(&message).await.unwrap()
    }

    fn actor(&self, id: ActorId) -> Actor {
        self.actors.resolve(&TargetRef::actor(id)).unwrap()
    }

    async fn stored(&self, message: &ResolutionMessage) -> ResolutionMessage {
        self.messages.get(message.id).await.unwrap().unwrap()
    }

    fn damage_messages(&self) -> Vec<ResolutionMessage> {
        self.messages
            .list()
            .into_iter()
            .filter(|m| m.subtype == MessageSubtype::Damage)
            .collect()
    }
}

fn open_attack(actor_id: Option<ActorId>, total: i32, difficulty: Option<i32>) -> ResolutionMessage {
    let roll = Roll::new("1d20", vec![total.min(20)], total).with_options(RollOptions {
        bonus: 0,
        difficulty,
        has_lucky_points: true,
        opposite_roll: true,
        actor_id,
    });
    ResolutionMessage::new(MessageSubtype::Attack, roll, fixed_now())
}

fn stun_effect() -> (CustomEffect, AdditionalEffect) {
    (
        CustomEffect {
            name: "Stunned".to_string(),
            statuses: BTreeSet::from(["stunned".to_string()]),
            ..CustomEffect::default()
        },
        AdditionalEffect {
            active: true,
            apply_on: ApplyOn::OnFailure,
            success_threshold: None,
        },
    )
}

// -------------------------------------------------------------------------
// Luck
// -------------------------------------------------------------------------

#[tokio::test]
async fn luck_spend_flips_failure_into_success_and_debits_the_pool() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 3));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let transitions = session.referee_transitions(10, false);
    let outcome = transitions.spend_luck.execute(message.id).await.unwrap();

    assert!(outcome.result.is_success());
    assert_eq!(outcome.result.margin(), 6);
    assert!(outcome.debited);

    let stored = session.stored(&message).await;
    let roll = stored.primary_roll().unwrap();
    assert_eq!(roll.total, 18);
    assert_eq!(roll.options.bonus, 10);
    assert!(!roll.options.has_lucky_points);
    // the opposed path stays open
    assert!(roll.options.opposite_roll);
    assert_eq!(session.actor(actor_id).resource(LUCK_RESOURCE), 2);
}

#[tokio::test]
async fn luck_spend_with_empty_pool_closes_the_path_without_bonus() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 0));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let transitions = session.referee_transitions(10, false);
    let outcome = transitions.spend_luck.execute(message.id).await.unwrap();

    assert!(!outcome.debited);
    assert!(outcome.result.is_failure());

    let stored = session.stored(&message).await;
    let roll = stored.primary_roll().unwrap();
    assert_eq!(roll.total, 8);
    assert!(!roll.options.has_lucky_points);
    assert_eq!(session.actor(actor_id).resource(LUCK_RESOURCE), 0);
}

#[tokio::test]
async fn second_luck_spend_hits_a_closed_path() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 3));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let transitions = session.referee_transitions(10, false);
    transitions.spend_luck.execute(message.id).await.unwrap();
    let err = transitions.spend_luck.execute(message.id).await.unwrap_err();

    assert!(matches!(err, TransitionError::PathClosed));
    // only one debit landed
    assert_eq!(session.actor(actor_id).resource(LUCK_RESOURCE), 2);
}

#[tokio::test]
async fn terminal_message_rejects_every_transition() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 3));
    let victim = session.seed_actor(Actor::new("Vex"));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;
    session
        .messages
        .update(message.id, &MessagePatch::new().show_button(false))
        .await
        .unwrap();

    let transitions = session.referee_transitions(10, false);
    assert!(matches!(
        transitions.spend_luck.execute(message.id).await,
        Err(TransitionError::PathClosed)
    ));
    assert!(matches!(
        transitions
            .resolve_opposed
            .execute(message.id, TargetRef::actor(victim), None)
            .await,
        Err(TransitionError::PathClosed)
    ));
    assert!(matches!(
        transitions
            .resolve_save
            .execute(message.id, TargetRef::actor(victim), "dexterity", 12)
            .await,
        Err(TransitionError::PathClosed)
    ));
}

#[tokio::test]
async fn missing_message_is_reported_as_such() {
    let session = Session::new(10);
    let transitions = session.referee_transitions(10, false);
    let err = transitions
        .spend_luck
        .execute(rollgate_domain::MessageId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::MessageNotFound(_)));
}

#[tokio::test]
async fn dangling_spender_reference_aborts_without_consuming_the_flag() {
    let session = Session::new(10);
    let message = session
        .post(open_attack(Some(ActorId::new()), 8, Some(12)))
        .await;

    let transitions = session.referee_transitions(10, false);
    let err = transitions.spend_luck.execute(message.id).await.unwrap_err();

    assert!(matches!(err, TransitionError::TargetNotFound(_)));
    let stored = session.stored(&message).await;
    assert!(stored.primary_roll().unwrap().options.has_lucky_points);
}

#[tokio::test]
async fn luck_spend_with_combo_rolls_delivers_the_linked_damage() {
    let session = Session::new(10);
    let author = UserId::new();
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 1));
    let victim = session.seed_actor(Actor::new("Vex"));
    let message = open_attack(Some(actor_id), 8, Some(12))
        .with_author(author)
        .with_linked_roll(Roll::new("2d6", vec![2, 3], 5))
        .with_targets(vec![TargetRef::actor(victim)])
        .with_visibility(Visibility::Blind);
    let message = session.post(message).await;

    let transitions = session.referee_transitions(10, true);
    transitions.spend_luck.execute(message.id).await.unwrap();

    let delivered = session.damage_messages();
    assert_eq!(delivered.len(), 1);
    let damage = &delivered[0];
    assert_eq!(damage.primary_roll().unwrap().total, 5);
    // inherits the parent's audience
    assert_eq!(damage.visibility, Visibility::Blind);
    assert_eq!(damage.author, Some(author));
    assert_eq!(damage.targets, vec![TargetRef::actor(victim)]);
}

#[tokio::test]
async fn luck_spend_without_combo_rolls_keeps_the_damage_holstered() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 1));
    let message = open_attack(Some(actor_id), 8, Some(12))
        .with_linked_roll(Roll::new("2d6", vec![2, 3], 5));
    let message = session.post(message).await;

    let transitions = session.referee_transitions(10, false);
    let outcome = transitions.spend_luck.execute(message.id).await.unwrap();

    assert!(outcome.result.is_success());
    assert!(session.damage_messages().is_empty());
}

// -------------------------------------------------------------------------
// Opposed
// -------------------------------------------------------------------------

#[tokio::test]
async fn opposed_roll_sets_difficulty_from_the_counter_and_closes_the_path() {
    // Counter draws 10 with reflex 4: counter total 14 against a primary 12.
    let session = Session::new(10);
    let counter = session.seed_actor(Actor::new("Vex").with_stat("reflex", 4));
    let message = session.post(open_attack(None, 12, None)).await;

    let transitions = session.referee_transitions(10, false);
    let outcome = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(counter), Some("reflex".to_string()))
        .await
        .unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.margin(), -2);

    let stored = session.stored(&message).await;
    let roll = stored.primary_roll().unwrap();
    assert_eq!(roll.options.difficulty, Some(14));
    assert!(!roll.options.opposite_roll);
    // the luck path stays open
    assert!(roll.options.has_lucky_points);
}

#[tokio::test]
async fn opposed_success_delivers_linked_damage_without_combo_rolls() {
    // Counter draws 4 flat: counter total 4 against a primary 15.
    let session = Session::new(4);
    let counter = session.seed_actor(Actor::new("Vex"));
    let message = open_attack(None, 15, None).with_linked_roll(Roll::new("2d6", vec![6, 1], 7));
    let message = session.post(message).await;

    let transitions = session.referee_transitions(4, false);
    let outcome = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(counter), None)
        .await
        .unwrap();

    assert!(outcome.is_success());
    let delivered = session.damage_messages();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].primary_roll().unwrap().total, 7);
}

#[tokio::test]
async fn opposed_success_on_a_skill_check_delivers_nothing() {
    // Skill-flavored messages re-resolve like any other but never spawn
    // follow-up damage, linked roll or not.
    let session = Session::new(4);
    let counter = session.seed_actor(Actor::new("Vex"));
    let roll = Roll::new("1d20", vec![15], 15).with_options(RollOptions {
        bonus: 0,
        difficulty: None,
        has_lucky_points: false,
        opposite_roll: true,
        actor_id: None,
    });
    let message = ResolutionMessage::new(MessageSubtype::Unknown, roll, fixed_now())
        .with_linked_roll(Roll::new("2d6", vec![6, 1], 7));
    let message = session.post(message).await;

    let transitions = session.referee_transitions(4, false);
    let outcome = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(counter), None)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(session.damage_messages().is_empty());
}

#[tokio::test]
async fn opposed_effect_lands_on_the_counter_party() {
    // Counter draws 18: primary 8 loses, and the on-failure stun lands on
    // the counter-party, not the declared targets.
    let session = Session::new(18);
    let counter = session.seed_actor(Actor::new("Vex"));
    let bystander = session.seed_actor(Actor::new("Mole"));
    let (effect, spec) = stun_effect();
    let message = open_attack(None, 8, None)
        .with_custom_effect(effect)
        .with_additional_effect(spec)
        .with_targets(vec![TargetRef::actor(bystander)]);
    let message = session.post(message).await;

    let transitions = session.referee_transitions(18, false);
    let outcome = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(counter), None)
        .await
        .unwrap();

    assert!(outcome.is_failure());
    assert!(session.actor(counter).has_status("stunned"));
    assert!(!session.actor(bystander).has_status("stunned"));
}

#[tokio::test]
async fn opposed_counter_party_must_resolve() {
    let session = Session::new(10);
    let message = session.post(open_attack(None, 12, None)).await;

    let transitions = session.referee_transitions(10, false);
    let err = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(ActorId::new()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionError::TargetNotFound(_)));
    let stored = session.stored(&message).await;
    assert!(stored.primary_roll().unwrap().options.opposite_roll);
}

#[tokio::test]
async fn luck_then_opposed_resolve_in_sequence() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 1));
    let counter = session.seed_actor(Actor::new("Vex").with_stat("reflex", 4));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let transitions = session.referee_transitions(10, false);
    let after_luck = transitions.spend_luck.execute(message.id).await.unwrap();
    assert!(after_luck.result.is_success());

    // Counter total 14 against the boosted 18.
    let after_opposed = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(counter), Some("reflex".to_string()))
        .await
        .unwrap();
    assert!(after_opposed.is_success());
    assert_eq!(after_opposed.margin(), 4);

    let stored = session.stored(&message).await;
    let roll = stored.primary_roll().unwrap();
    assert!(!roll.options.has_lucky_points);
    assert!(!roll.options.opposite_roll);
    assert!(!stored.is_terminal());
}

// -------------------------------------------------------------------------
// Save
// -------------------------------------------------------------------------

#[tokio::test]
async fn failed_save_applies_the_effect_and_closes_the_message() {
    // Save draws 5 with no modifier against difficulty 12: a miss.
    let session = Session::new(5);
    let victim = session.seed_actor(Actor::new("Vex"));
    let (effect, spec) = stun_effect();
    let message = open_attack(None, 15, None)
        .with_custom_effect(effect)
        .with_additional_effect(spec)
        .with_targets(vec![TargetRef::actor(victim)]);
    let message = session.post(message).await;

    let transitions = session.referee_transitions(5, false);
    let outcome = transitions
        .resolve_save
        .execute(message.id, TargetRef::actor(victim), "dexterity", 12)
        .await
        .unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.margin(), -7);
    assert!(session.actor(victim).has_status("stunned"));

    let stored = session.stored(&message).await;
    assert!(stored.is_terminal());
    let roll = stored.primary_roll().unwrap();
    assert_eq!(roll.total, 5);
    assert_eq!(roll.options.difficulty, Some(12));
    assert_eq!(roll.options.actor_id, Some(victim));
    // no re-resolution path survives the replacement
    assert!(!roll.options.has_lucky_points);
    assert!(!roll.options.opposite_roll);
    assert_eq!(stored.linked_roll.as_ref().map(|r| r.total), Some(5));
}

#[tokio::test]
async fn made_save_uses_the_stat_modifier_and_still_takes_the_linked_damage() {
    // Save draws 15 with dexterity 2: total 17 beats difficulty 12.
    let session = Session::new(15);
    let victim = session.seed_actor(Actor::new("Vex").with_stat("dexterity", 2));
    let (effect, spec) = stun_effect();
    let message = open_attack(None, 15, None)
        .with_custom_effect(effect)
        .with_additional_effect(spec)
        .with_linked_roll(Roll::new("2d6", vec![4, 4], 8))
        .with_targets(vec![TargetRef::actor(victim)]);
    let message = session.post(message).await;

    let transitions = session.referee_transitions(15, false);
    let outcome = transitions
        .resolve_save
        .execute(message.id, TargetRef::actor(victim), "dexterity", 12)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.margin(), 5);
    // the on-failure stun does not fire on a made save
    assert!(!session.actor(victim).has_status("stunned"));
    // but the follow-through already in flight still lands
    let delivered = session.damage_messages();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].primary_roll().unwrap().total, 8);
}

#[tokio::test]
async fn save_against_a_missing_target_aborts_without_mutation() {
    let session = Session::new(10);
    let message = session.post(open_attack(None, 15, None)).await;

    let transitions = session.referee_transitions(10, false);
    let err = transitions
        .resolve_save
        .execute(message.id, TargetRef::actor(ActorId::new()), "dexterity", 12)
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionError::TargetNotFound(_)));
    let stored = session.stored(&message).await;
    assert!(!stored.is_terminal());
    assert_eq!(stored.primary_roll().unwrap().total, 15);
}

// -------------------------------------------------------------------------
// Authority routing
// -------------------------------------------------------------------------

#[tokio::test]
async fn player_transition_routes_through_the_referee_and_confirms() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 2));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let (tx, mut rx) = tokio::sync::mpsc::channel(32);
    session
        .hub
        .register(Participant::player(UserId::new(), "rolla"), tx)
        .await
        .unwrap();

    let transitions = session.player_transitions(10, false);
    let outcome = transitions.spend_luck.execute(message.id).await.unwrap();
    assert!(outcome.result.is_success());

    // the write landed on the referee's records
    let stored = session.stored(&message).await;
    assert_eq!(stored.primary_roll().unwrap().total, 18);
    assert_eq!(session.actor(actor_id).resource(LUCK_RESOURCE), 1);

    // and the peer saw the referee's fan-out, applied confirmation included
    let mut saw_applied = false;
    let mut saw_update = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            SessionEvent::MutationApplied { .. } => saw_applied = true,
            SessionEvent::MessageUpdated { .. } => saw_update = true,
            _ => {}
        }
    }
    assert!(saw_applied);
    assert!(saw_update);
}

#[tokio::test]
async fn stranded_player_cannot_transition_and_nothing_mutates() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 2));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let transitions = session.stranded_transitions(10);
    let err = transitions.spend_luck.execute(message.id).await.unwrap_err();

    assert!(matches!(
        err,
        TransitionError::Authority(AuthorityError::Channel(ChannelError::Unreachable))
    ));
    let stored = session.stored(&message).await;
    assert!(stored.primary_roll().unwrap().options.has_lucky_points);
    assert_eq!(session.actor(actor_id).resource(LUCK_RESOURCE), 2);
}

#[tokio::test]
async fn concurrent_luck_spends_admit_exactly_one_winner() {
    let session = Session::new(10);
    let actor_id = session.seed_actor(Actor::new("Brakka").with_resource(LUCK_RESOURCE, 3));
    let message = session.post(open_attack(Some(actor_id), 8, Some(12))).await;

    let transitions = Arc::new(session.referee_transitions(10, false));
    let a = {
        let transitions = transitions.clone();
        let id = message.id;
        tokio::spawn(async move { transitions.spend_luck.execute(id).await })
    };
    let b = {
        let transitions = transitions.clone();
        let id = message.id;
        tokio::spawn(async move { transitions.spend_luck.execute(id).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(TransitionError::PathClosed))));

    // the bonus folded in exactly once, the pool paid exactly once
    let stored = session.stored(&message).await;
    assert_eq!(stored.primary_roll().unwrap().total, 18);
    assert_eq!(session.actor(actor_id).resource(LUCK_RESOURCE), 2);
}

#[tokio::test]
async fn concurrent_opposed_rolls_admit_exactly_one_winner() {
    let session = Session::new(10);
    let counter = session.seed_actor(Actor::new("Vex").with_stat("reflex", 4));
    let message = session.post(open_attack(None, 12, None)).await;

    let transitions = Arc::new(session.referee_transitions(10, false));
    let a = {
        let transitions = transitions.clone();
        let id = message.id;
        let target = TargetRef::actor(counter);
        tokio::spawn(async move {
            transitions
                .resolve_opposed
                .execute(id, target, Some("reflex".to_string()))
                .await
        })
    };
    let b = {
        let transitions = transitions.clone();
        let id = message.id;
        let target = TargetRef::actor(counter);
        tokio::spawn(async move {
            transitions
                .resolve_opposed
                .execute(id, target, Some("reflex".to_string()))
                .await
        })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(TransitionError::PathClosed))));

    // the counter rolled once; the loser saw the closed path, not a reroll
    let stored = session.stored(&message).await;
    let roll = stored.primary_roll().unwrap();
    assert_eq!(roll.options.difficulty, Some(14));
    assert!(!roll.options.opposite_roll);
}

#[tokio::test]
async fn routed_effect_application_mutates_hit_points_on_the_referee_side() {
    // Opposed loss with a damage-formula effect: the effect routes as its
    // own authority op and the referee's executor applies it.
    let session = Session::new(18);
    let counter = session.seed_actor(Actor::new("Vex").with_resource(HP_RESOURCE, 20));
    let effect = CustomEffect {
        name: "Backlash".to_string(),
        formula: Some("1d4".to_string()),
        formula_type: Some(rollgate_domain::FormulaType::Damage),
        ..CustomEffect::default()
    };
    let spec = AdditionalEffect {
        active: true,
        apply_on: ApplyOn::OnFailure,
        success_threshold: None,
    };
    let message = open_attack(None, 8, None)
        .with_custom_effect(effect)
        .with_additional_effect(spec);
    let message = session.post(message).await;

    let transitions = session.player_transitions(18, false);
    let outcome = transitions
        .resolve_opposed
        .execute(message.id, TargetRef::actor(counter), None)
        .await
        .unwrap();

    assert!(outcome.is_failure());
    // 1d4 drawn at the fixed face 18 is clamped by nothing here; the fixed
    // random returns 18 for any bounds, so assert through the delta instead.
    let hp = session.actor(counter).resource(HP_RESOURCE);
    assert_eq!(hp, 20 - 18);
}
