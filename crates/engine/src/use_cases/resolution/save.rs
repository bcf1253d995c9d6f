//! Saving-throw re-resolution.

use std::sync::Arc;

use tracing::info;

use rollgate_domain::{
    classify, CriticalRule, DiceFormula, MessageId, MessageSubtype, Outcome, TargetRef,
};
use rollgate_shared::AuthorityOp;

use crate::authority::AuthorityRouter;
use crate::infrastructure::ports::{ActorStore, ClockPort, DiceRoller, MessageStore};
use crate::session::SessionHub;
use crate::stores::TransitionLocks;

use super::{deliver_linked_roll, load_open_message, manage_effect, TransitionError};

/// Use case: let a target roll its saving throw against an open message.
///
/// The save replaces the message's primary roll and linked roll and closes
/// the message for good: a saving throw is the last word on a resolution.
pub struct ResolveSave {
    messages: Arc<dyn MessageStore>,
    actors: Arc<dyn ActorStore>,
    dice: Arc<dyn DiceRoller>,
    clock: Arc<dyn ClockPort>,
    critical: Arc<dyn CriticalRule>,
    authority: Arc<AuthorityRouter>,
    locks: Arc<TransitionLocks>,
    session: Arc<SessionHub>,
}

impl ResolveSave {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        messages: Arc<dyn MessageStore>,
        actors: Arc<dyn ActorStore>,
        dice: Arc<dyn DiceRoller>,
        clock: Arc<dyn ClockPort>,
        critical: Arc<dyn CriticalRule>,
        authority: Arc<AuthorityRouter>,
        locks: Arc<TransitionLocks>,
        session: Arc<SessionHub>,
    ) -> Self {
        Self {
            messages,
            actors,
            dice,
            clock,
            critical,
            authority,
            locks,
            session,
        }
    }

    /// `ability` names the stat supplying the save modifier; `difficulty` is
    /// the number the save must beat.
    pub async fn execute(
        &self,
        message_id: MessageId,
        save_target: TargetRef,
        ability: &str,
        difficulty: i32,
    ) -> Result<Outcome, TransitionError> {
        let _transition = self.locks.acquire(message_id).await;

        // 1. Load. Saves need only an open message, no flag of their own.
        let message = load_open_message(self.messages.as_ref(), message_id).await?;

        // 2. The target rolls its own save against the transmitted
        //    difficulty; a stat missing from the block means a +0 save.
        let target_actor = self
            .actors
            .resolve(&save_target)
            .ok_or_else(|| TransitionError::TargetNotFound(save_target.clone()))?;
        let modifier = target_actor.stat(ability).unwrap_or(0);
        let mut save_roll = self.dice.roll(&DiceFormula::d20(modifier).display())?;
        save_roll.options.difficulty = Some(difficulty);
        save_roll.options.actor_id = Some(target_actor.id);

        // 3. The save's own classification becomes the message's outcome.
        let result = classify(&save_roll, self.critical.as_ref());

        // 4. A made save against an attack still takes the follow-through
        //    that was already in flight before the replacement.
        if result.is_success() && message.subtype == MessageSubtype::Attack {
            if let Some(linked) = message.linked_roll.clone() {
                deliver_linked_roll(
                    self.messages.as_ref(),
                    self.session.as_ref(),
                    self.clock.as_ref(),
                    self.critical.as_ref(),
                    &message,
                    linked,
                )
                .await?;
            }
        }

        // 5. The effect is judged on the save and lands on the saving target.
        manage_effect(
            self.authority.as_ref(),
            &message,
            &result,
            Some(&save_target),
        )
        .await?;

        // 6. Persist the replacement: the save roll stands in for both the
        //    primary and the linked roll, and the message closes.
        self.authority
            .route(AuthorityOp::UpdateMessageAfterSavedRoll {
                message_id,
                rolls: vec![save_roll.clone()],
                result,
                linked_roll: save_roll,
                show_button: false,
            })
            .await?;

        info!(%message_id, ability, difficulty, outcome = %result, "Saving throw resolved");
        Ok(result)
    }
}
