//! Luck re-resolution.

use std::sync::Arc;

use tracing::info;

use rollgate_domain::{
    classify, CriticalRule, MessageId, MessageSubtype, Outcome, TargetRef, LUCK_RESOURCE,
};
use rollgate_shared::{AuthorityOp, ResourceDebit};

use crate::authority::AuthorityRouter;
use crate::infrastructure::ports::{ActorStore, ClockPort, MessageStore};
use crate::session::SessionHub;
use crate::stores::TransitionLocks;

use super::{deliver_linked_roll, load_open_message, manage_effect, TransitionError};

/// Fixed bonus a luck spend folds into the roll total.
const LUCK_BONUS: i32 = 10;
/// Pool cost of one spend.
const LUCK_COST: i64 = 1;

/// What one luck spend did.
#[derive(Debug, Clone, Copy)]
pub struct LuckOutcome {
    pub result: Outcome,
    /// False when the pool was empty and only the flag was consumed.
    pub debited: bool,
}

/// Use case: spend a luck point to re-resolve an open message.
pub struct SpendLuck {
    messages: Arc<dyn MessageStore>,
    actors: Arc<dyn ActorStore>,
    clock: Arc<dyn ClockPort>,
    critical: Arc<dyn CriticalRule>,
    authority: Arc<AuthorityRouter>,
    locks: Arc<TransitionLocks>,
    session: Arc<SessionHub>,
    combo_rolls: bool,
}

impl SpendLuck {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        messages: Arc<dyn MessageStore>,
        actors: Arc<dyn ActorStore>,
        clock: Arc<dyn ClockPort>,
        critical: Arc<dyn CriticalRule>,
        authority: Arc<AuthorityRouter>,
        locks: Arc<TransitionLocks>,
        session: Arc<SessionHub>,
        combo_rolls: bool,
    ) -> Self {
        Self {
            messages,
            actors,
            clock,
            critical,
            authority,
            locks,
            session,
            combo_rolls,
        }
    }

    pub async fn execute(&self, message_id: MessageId) -> Result<LuckOutcome, TransitionError> {
        // One transition at a time per message; the guard drops on every
        // exit path.
        let _transition = self.locks.acquire(message_id).await;

        // 1. Load and gate on the luck flag.
        let mut message = load_open_message(self.messages.as_ref(), message_id).await?;
        if !message.can_spend_luck() {
            return Err(TransitionError::PathClosed);
        }

        // 2. Find the spender's pool. A roll with a dangling actor reference
        //    aborts; a roll with no actor, or an empty pool, still consumes
        //    the flag - just without the bonus or the debit.
        let spender = match message.actor_id() {
            Some(actor_id) => {
                let target = TargetRef::actor(actor_id);
                Some(
                    self.actors
                        .resolve(&target)
                        .ok_or(TransitionError::TargetNotFound(target))?,
                )
            }
            None => None,
        };
        let debit = spender
            .filter(|actor| actor.resource(LUCK_RESOURCE) >= LUCK_COST)
            .map(|actor| ResourceDebit {
                actor_id: actor.id,
                resource: LUCK_RESOURCE.to_string(),
                amount: LUCK_COST,
            });

        // 3. Fold the bonus in (or just close the path) and reclassify.
        let result = {
            let roll = message
                .primary_roll_mut()
                .ok_or(TransitionError::PathClosed)?;
            if debit.is_some() {
                roll.apply_luck_bonus(LUCK_BONUS);
            } else {
                roll.close_luck();
            }
            classify(roll, self.critical.as_ref())
        };

        // 4. The luck path only delivers linked damage when combo rolls are
        //    enabled for the session.
        if self.combo_rolls && result.is_success() && message.subtype == MessageSubtype::Attack {
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

        // 5. Manage the configured effect against the declared target.
        manage_effect(
            self.authority.as_ref(),
            &message,
            &result,
            message.first_target(),
        )
        .await?;

        // 6. Persist through the authority router. The debit rides along and
        //    lands before the message on the referee side.
        let debited = debit.is_some();
        self.authority
            .route(AuthorityOp::UpdateMessageAfterLuckSpend {
                message_id,
                rolls: message.rolls.clone(),
                result,
                debit,
            })
            .await?;

        info!(%message_id, debited, outcome = %result, "Luck spend resolved");
        Ok(LuckOutcome { result, debited })
    }
}
