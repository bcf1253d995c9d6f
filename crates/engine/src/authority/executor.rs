//! Referee-side execution of authority operations.
//!
//! Both routing paths end here. The referee's own mutations call it
//! directly; a player peer's mutations arrive through the channel. Execution
//! persists exactly the fields the operation carries, fans the updated
//! records out, and closes with the applied confirmation the router waits
//! on.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use rollgate_domain::{MessagePatch, TargetRef};
use rollgate_shared::{AuthorityOp, CorrelationId, ResourceDebit, SessionEvent};

use crate::infrastructure::ports::{ActorStore, MessageStore, StoreError};
use crate::session::SessionHub;
use crate::use_cases::effects::{ApplyEffect, EffectError};

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("unrecognized authority operation")]
    UnknownOp,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Applies routed mutations against the authoritative stores.
pub struct AuthorityExecutor {
    messages: Arc<dyn MessageStore>,
    actors: Arc<dyn ActorStore>,
    apply_effect: Arc<ApplyEffect>,
    session: Arc<SessionHub>,
}

impl AuthorityExecutor {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        actors: Arc<dyn ActorStore>,
        apply_effect: Arc<ApplyEffect>,
        session: Arc<SessionHub>,
    ) -> Self {
        Self {
            messages,
            actors,
            apply_effect,
            session,
        }
    }

    /// Execute one operation and broadcast its applied confirmation.
    ///
    /// Nothing is broadcast on failure, so a routed caller times out instead
    /// of acting on a mutation that never landed.
    pub async fn execute(
        &self,
        correlation_id: CorrelationId,
        op: AuthorityOp,
    ) -> Result<(), ExecuteError> {
        info!(correlation = %correlation_id.short(), op = op.name(), "Executing authority operation");

        match op {
            AuthorityOp::ApplyCustomEffect { effect, targets } => {
                let receipt = self.apply_effect.execute(&effect, &targets).await?;
                if !receipt.missing.is_empty() {
                    warn!(
                        correlation = %correlation_id.short(),
                        missing = receipt.missing.len(),
                        "Some effect targets did not resolve"
                    );
                }
            }
            AuthorityOp::UpdateMessageAfterLuckSpend {
                message_id,
                rolls,
                result,
                debit,
            } => {
                // The debit lands before the message: a failure in between
                // leaves the pool spent but the message still open, never a
                // re-resolved message with an unspent pool.
                if let Some(debit) = debit {
                    self.apply_debit(&debit).await?;
                }
                let patch = MessagePatch::new().rolls(rolls).result(result);
                self.update_message(message_id, &patch).await?;
            }
            AuthorityOp::UpdateMessageAfterOpposedRoll {
                message_id,
                rolls,
                result,
            } => {
                let patch = MessagePatch::new().rolls(rolls).result(result);
                self.update_message(message_id, &patch).await?;
            }
            AuthorityOp::UpdateMessageAfterSavedRoll {
                message_id,
                rolls,
                result,
                linked_roll,
                show_button,
            } => {
                let patch = MessagePatch::new()
                    .rolls(rolls)
                    .result(result)
                    .linked_roll(linked_roll)
                    .show_button(show_button);
                self.update_message(message_id, &patch).await?;
            }
            AuthorityOp::Unknown => return Err(ExecuteError::UnknownOp),
        }

        self.session
            .broadcast(SessionEvent::MutationApplied { correlation_id })
            .await;
        Ok(())
    }

    async fn apply_debit(&self, debit: &ResourceDebit) -> Result<(), ExecuteError> {
        let target = TargetRef::actor(debit.actor_id);
        let actor = self
            .actors
            .resolve(&target)
            .ok_or_else(|| StoreError::not_found("Actor", debit.actor_id.to_string()))?;
        // Pools never go negative, even if a stale peer over-debits.
        let remaining = (actor.resource(&debit.resource) - debit.amount).max(0);
        let updated = self
            .actors
            .set_resource(debit.actor_id, &debit.resource, remaining)
            .await?;
        info!(actor_id = %debit.actor_id, resource = %debit.resource, remaining, "Debited resource pool");
        self.session
            .broadcast(SessionEvent::ActorUpdated { actor: updated })
            .await;
        Ok(())
    }

    async fn update_message(
        &self,
        message_id: rollgate_domain::MessageId,
        patch: &MessagePatch,
    ) -> Result<(), ExecuteError> {
        let updated = self.messages.update(message_id, patch).await?;
        self.session
            .broadcast(SessionEvent::MessageUpdated { message: updated })
            .await;
        Ok(())
    }
}
