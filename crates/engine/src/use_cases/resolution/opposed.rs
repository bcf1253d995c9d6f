//! Opposed re-resolution.

use std::sync::Arc;

use tracing::info;

use rollgate_domain::{
    classify, Actor, CriticalRule, DiceFormula, MessageId, MessageSubtype, Outcome, TargetRef,
};
use rollgate_shared::AuthorityOp;

use crate::authority::AuthorityRouter;
use crate::infrastructure::ports::{ActorStore, ClockPort, DiceRoller, MessageStore};
use crate::session::SessionHub;
use crate::stores::TransitionLocks;

use super::{deliver_linked_roll, load_open_message, manage_effect, TransitionError};

/// Use case: roll the counter-party's opposition against an open message.
pub struct ResolveOpposed {
    messages: Arc<dyn MessageStore>,
    actors: Arc<dyn ActorStore>,
    dice: Arc<dyn DiceRoller>,
    clock: Arc<dyn ClockPort>,
    critical: Arc<dyn CriticalRule>,
    authority: Arc<AuthorityRouter>,
    locks: Arc<TransitionLocks>,
    session: Arc<SessionHub>,
}

impl ResolveOpposed {
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

    /// `counter_value` names the counter-party's stat, or is an integer
    /// literal, or is absent for a flat d20.
    pub async fn execute(
        &self,
        message_id: MessageId,
        counter_target: TargetRef,
        counter_value: Option<String>,
    ) -> Result<Outcome, TransitionError> {
        let _transition = self.locks.acquire(message_id).await;

        // 1. Load and gate on the opposed flag.
        let mut message = load_open_message(self.messages.as_ref(), message_id).await?;
        if !message.can_oppose() {
            return Err(TransitionError::PathClosed);
        }

        // 2. Resolve the counter-party and draw its counter roll.
        let counter_actor = self
            .actors
            .resolve(&counter_target)
            .ok_or_else(|| TransitionError::TargetNotFound(counter_target.clone()))?;
        let modifier = counter_value
            .as_deref()
            .and_then(|expression| evaluate_counter_expression(expression, &counter_actor));
        let formula = DiceFormula::d20(modifier.unwrap_or(0)).display();
        let counter_roll = self.dice.roll(&formula)?;

        // 3. The counter total becomes the difficulty, the opposed path
        //    closes, and the roll reclassifies.
        let result = {
            let roll = message
                .primary_roll_mut()
                .ok_or(TransitionError::PathClosed)?;
            roll.close_opposition(counter_roll.total);
            classify(roll, self.critical.as_ref())
        };

        // 4. Winning the opposition delivers the linked damage outright.
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

        // 5. The effect lands on the counter-party, not the declared targets.
        manage_effect(
            self.authority.as_ref(),
            &message,
            &result,
            Some(&counter_target),
        )
        .await?;

        // 6. Persist the mutated roll and outcome.
        self.authority
            .route(AuthorityOp::UpdateMessageAfterOpposedRoll {
                message_id,
                rolls: message.rolls.clone(),
                result,
            })
            .await?;

        info!(
            %message_id,
            counter_total = counter_roll.total,
            outcome = %result,
            "Opposed roll resolved"
        );
        Ok(result)
    }
}

/// Resolve an opposed expression against the counter-party: a named stat
/// first, then an integer literal. Anything else means a flat d20.
fn evaluate_counter_expression(expression: &str, actor: &Actor) -> Option<i32> {
    let expression = expression.trim();
    if expression.is_empty() {
        return None;
    }
    actor
        .stat(expression)
        .or_else(|| expression.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_party() -> Actor {
        Actor::new("Vex").with_stat("reflex", 4)
    }

    #[test]
    fn stat_name_resolves_from_the_stat_block() {
        assert_eq!(evaluate_counter_expression("reflex", &counter_party()), Some(4));
    }

    #[test]
    fn literal_falls_through_when_no_stat_matches() {
        assert_eq!(evaluate_counter_expression("2", &counter_party()), Some(2));
        assert_eq!(evaluate_counter_expression("-1", &counter_party()), Some(-1));
    }

    #[test]
    fn unknown_expression_means_flat_d20() {
        assert_eq!(evaluate_counter_expression("wits", &counter_party()), None);
        assert_eq!(evaluate_counter_expression("  ", &counter_party()), None);
    }
}
