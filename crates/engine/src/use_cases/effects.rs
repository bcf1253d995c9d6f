//! Custom-effect application.
//!
//! Lands a [`CustomEffect`] on target actors. This runs on the authoritative
//! side only: every caller reaches it through the authority executor, so a
//! player peer can never apply an effect directly to its local replica.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use rollgate_domain::{Actor, ActorId, CustomEffect, DomainError, FormulaType, TargetRef, HP_RESOURCE};
use rollgate_shared::SessionEvent;

use crate::infrastructure::ports::{ActorStore, DiceRoller, StoreError};
use crate::session::SessionHub;

/// What one application run did.
#[derive(Debug, Default)]
pub struct EffectReceipt {
    /// Targets that resolved and took the effect.
    pub applied: Vec<ActorId>,
    /// Targets that did not resolve and were skipped.
    pub missing: Vec<TargetRef>,
}

#[derive(Debug, Error)]
pub enum EffectError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("effect formula: {0}")]
    Formula(#[from] DomainError),
}

/// Use case: land an effect on every resolvable target.
pub struct ApplyEffect {
    actors: Arc<dyn ActorStore>,
    dice: Arc<dyn DiceRoller>,
    session: Arc<SessionHub>,
}

impl ApplyEffect {
    pub fn new(
        actors: Arc<dyn ActorStore>,
        dice: Arc<dyn DiceRoller>,
        session: Arc<SessionHub>,
    ) -> Self {
        Self {
            actors,
            dice,
            session,
        }
    }

    /// Apply one effect to each target in turn.
    ///
    /// A target that does not resolve is skipped with a warning and recorded
    /// on the receipt; the remaining targets still take the effect.
    pub async fn execute(
        &self,
        effect: &CustomEffect,
        targets: &[TargetRef],
    ) -> Result<EffectReceipt, EffectError> {
        let mut receipt = EffectReceipt::default();

        for target in targets {
            let Some(mut actor) = self.actors.resolve(target) else {
                warn!(%target, effect = %effect.name, "Effect target did not resolve, skipping");
                receipt.missing.push(target.clone());
                continue;
            };
            self.apply_to(&mut actor, effect).await?;
            receipt.applied.push(actor.id);
        }

        Ok(receipt)
    }

    async fn apply_to(&self, actor: &mut Actor, effect: &CustomEffect) -> Result<(), EffectError> {
        // 1. Statuses are a set union; re-applying one already present is a no-op.
        let granted = actor.grant_statuses(effect.statuses.iter().cloned());

        // 2. A formula rolls fresh on every application and its delta re-applies.
        if let Some(formula) = &effect.formula {
            let roll = self.dice.roll(formula)?;
            let delta = match effect.formula_type {
                Some(FormulaType::Healing) => i64::from(roll.total),
                // Validation guarantees a type when a formula is present;
                // damage is the conservative reading for a missing one.
                _ => -i64::from(roll.total),
            };
            let hp = actor.resource(HP_RESOURCE) + delta;
            actor.set_resource(HP_RESOURCE, hp);
            info!(actor_id = %actor.id, effect = %effect.name, delta, "Applied effect formula to hit points");
        }

        // 3. Persist and fan out the new actor state.
        self.actors.save(actor).await?;
        self.session
            .broadcast(SessionEvent::ActorUpdated {
                actor: actor.clone(),
            })
            .await;

        if !granted.is_empty() {
            info!(actor_id = %actor.id, effect = %effect.name, statuses = ?granted, "Granted statuses");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use rollgate_domain::Roll;

    use crate::infrastructure::memory::InMemoryActorStore;
    use crate::infrastructure::ports::MockDiceRoller;

    fn stun_effect() -> CustomEffect {
        CustomEffect {
            name: "Stunned".to_string(),
            statuses: BTreeSet::from(["stunned".to_string()]),
            ..CustomEffect::default()
        }
    }

    fn burn_effect() -> CustomEffect {
        CustomEffect {
            name: "Burn".to_string(),
            formula: Some("2d6".to_string()),
            formula_type: Some(FormulaType::Damage),
            ..CustomEffect::default()
        }
    }

    fn fixture(actors: Arc<InMemoryActorStore>, dice: MockDiceRoller) -> ApplyEffect {
        ApplyEffect::new(actors, Arc::new(dice), Arc::new(SessionHub::new()))
    }

    #[tokio::test]
    async fn grants_statuses_idempotently() {
        let actors = Arc::new(InMemoryActorStore::new());
        let actor = Actor::new("Brakka").with_status("stunned");
        let id = actor.id;
        actors.insert(actor);

        let use_case = fixture(actors.clone(), MockDiceRoller::new());
        let receipt = use_case
            .execute(&stun_effect(), &[TargetRef::actor(id)])
            .await
            .unwrap();

        assert_eq!(receipt.applied, vec![id]);
        let actor = actors.resolve(&TargetRef::actor(id)).unwrap();
        // still exactly one status entry
        assert_eq!(actor.statuses.len(), 1);
        assert!(actor.has_status("stunned"));
    }

    #[tokio::test]
    async fn damage_formula_reduces_hit_points_each_application() {
        let actors = Arc::new(InMemoryActorStore::new());
        let actor = Actor::new("Brakka").with_resource(HP_RESOURCE, 20);
        let id = actor.id;
        actors.insert(actor);

        let mut dice = MockDiceRoller::new();
        dice.expect_roll()
            .withf(|formula| formula == "2d6")
            .times(2)
            .returning(|_| Ok(Roll::new("2d6", vec![3, 4], 7)));

        let use_case = fixture(actors.clone(), dice);
        let targets = [TargetRef::actor(id)];
        use_case.execute(&burn_effect(), &targets).await.unwrap();
        use_case.execute(&burn_effect(), &targets).await.unwrap();

        let actor = actors.resolve(&TargetRef::actor(id)).unwrap();
        assert_eq!(actor.resource(HP_RESOURCE), 6);
    }

    #[tokio::test]
    async fn healing_formula_raises_hit_points() {
        let actors = Arc::new(InMemoryActorStore::new());
        let actor = Actor::new("Brakka").with_resource(HP_RESOURCE, 5);
        let id = actor.id;
        actors.insert(actor);

        let mut dice = MockDiceRoller::new();
        dice.expect_roll()
            .returning(|_| Ok(Roll::new("1d8", vec![6], 6)));

        let effect = CustomEffect {
            name: "Mend".to_string(),
            formula: Some("1d8".to_string()),
            formula_type: Some(FormulaType::Healing),
            ..CustomEffect::default()
        };
        let use_case = fixture(actors.clone(), dice);
        use_case
            .execute(&effect, &[TargetRef::actor(id)])
            .await
            .unwrap();

        let actor = actors.resolve(&TargetRef::actor(id)).unwrap();
        assert_eq!(actor.resource(HP_RESOURCE), 11);
    }

    #[tokio::test]
    async fn missing_target_is_skipped_and_rest_still_land() {
        let actors = Arc::new(InMemoryActorStore::new());
        let actor = Actor::new("Brakka");
        let id = actor.id;
        actors.insert(actor);

        let ghost = TargetRef::actor(ActorId::new());
        let use_case = fixture(actors.clone(), MockDiceRoller::new());
        let receipt = use_case
            .execute(&stun_effect(), &[ghost.clone(), TargetRef::actor(id)])
            .await
            .unwrap();

        assert_eq!(receipt.missing, vec![ghost]);
        assert_eq!(receipt.applied, vec![id]);
        assert!(actors
            .resolve(&TargetRef::actor(id))
            .unwrap()
            .has_status("stunned"));
    }

    #[tokio::test]
    async fn broadcasts_actor_updated_for_each_applied_target() {
        let actors = Arc::new(InMemoryActorStore::new());
        let actor = Actor::new("Brakka");
        let id = actor.id;
        actors.insert(actor);

        let hub = Arc::new(SessionHub::new());
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        hub.register(
            crate::session::Participant::player(rollgate_domain::UserId::new(), "watcher"),
            tx,
        )
        .await
        .unwrap();

        let use_case = ApplyEffect::new(
            actors,
            Arc::new(MockDiceRoller::new()),
            hub,
        );
        use_case
            .execute(&stun_effect(), &[TargetRef::actor(id)])
            .await
            .unwrap();

        match rx.try_recv() {
            Ok(SessionEvent::ActorUpdated { actor }) => assert_eq!(actor.id, id),
            other => panic!("expected ActorUpdated, got {other:?}"),
        }
    }
}
