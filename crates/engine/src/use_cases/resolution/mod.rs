//! Resolution transitions.
//!
//! The three ways an open message gets re-resolved: spending luck, rolling
//! an opposed counter, and rolling a saving throw. Every transition runs
//! under the message's transition lock and follows the same spine: gate,
//! mutate the roll, reclassify, deliver the follow-through, manage the
//! configured effect, persist through the authority router. Messages with no
//! configured effect or linked roll flow through the same spine with those
//! steps degrading to no-ops.

mod luck;
mod opposed;
mod save;

#[cfg(test)]
mod flow_tests;

pub use luck::{LuckOutcome, SpendLuck};
pub use opposed::ResolveOpposed;
pub use save::ResolveSave;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use rollgate_domain::{
    classify, should_manage_additional_effect, CriticalRule, DomainError, MessageId,
    MessageSubtype, Outcome, ResolutionMessage, Roll, TargetRef,
};
use rollgate_shared::{AuthorityOp, SessionEvent};

use crate::authority::{AuthorityError, AuthorityRouter};
use crate::infrastructure::ports::{
    ActorStore, ClockPort, DiceRoller, MessageStore, StoreError,
};
use crate::session::SessionHub;
use crate::stores::TransitionLocks;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),
    #[error("target did not resolve: {0}")]
    TargetNotFound(TargetRef),
    #[error("message is closed to this resolution path")]
    PathClosed,
    #[error(transparent)]
    Authority(#[from] AuthorityError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dice(#[from] DomainError),
}

/// Container for the resolution transitions.
pub struct ResolutionUseCases {
    pub spend_luck: Arc<SpendLuck>,
    pub resolve_opposed: Arc<ResolveOpposed>,
    pub resolve_save: Arc<ResolveSave>,
}

impl ResolutionUseCases {
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
        combo_rolls: bool,
    ) -> Self {
        Self {
            spend_luck: Arc::new(SpendLuck::new(
                messages.clone(),
                actors.clone(),
                clock.clone(),
                critical.clone(),
                authority.clone(),
                locks.clone(),
                session.clone(),
                combo_rolls,
            )),
            resolve_opposed: Arc::new(ResolveOpposed::new(
                messages.clone(),
                actors.clone(),
                dice.clone(),
                clock.clone(),
                critical.clone(),
                authority.clone(),
                locks.clone(),
                session.clone(),
            )),
            resolve_save: Arc::new(ResolveSave::new(
                messages, actors, dice, clock, critical, authority, locks, session,
            )),
        }
    }
}

/// Load a message and reject transitions on closed ones.
async fn load_open_message(
    messages: &dyn MessageStore,
    id: MessageId,
) -> Result<ResolutionMessage, TransitionError> {
    let message = messages
        .get(id)
        .await?
        .ok_or(TransitionError::MessageNotFound(id))?;
    if message.is_terminal() {
        return Err(TransitionError::PathClosed);
    }
    Ok(message)
}

/// Deliver a follow-through roll as its own dependent damage message.
///
/// The new message inherits the parent's targets, visibility, and author.
async fn deliver_linked_roll(
    messages: &dyn MessageStore,
    session: &SessionHub,
    clock: &dyn ClockPort,
    critical: &dyn CriticalRule,
    parent: &ResolutionMessage,
    linked: Roll,
) -> Result<ResolutionMessage, TransitionError> {
    let result = classify(&linked, critical);
    let mut follow = ResolutionMessage::new(MessageSubtype::Damage, linked, clock.now())
        .with_result(result)
        .with_targets(parent.targets.clone())
        .with_visibility(parent.visibility);
    if let Some(author) = parent.author {
        follow = follow.with_author(author);
    }
    let follow = messages.create(&follow).await?;
    session
        .broadcast(SessionEvent::MessageCreated {
            message: follow.clone(),
        })
        .await;
    info!(parent_id = %parent.id, follow_id = %follow.id, "Delivered linked roll");
    Ok(follow)
}

/// Run the effect gate for one re-resolution and route the application.
///
/// No configured effect, a gate that says no, or a message with nobody to
/// hit all fall through silently.
async fn manage_effect(
    authority: &AuthorityRouter,
    message: &ResolutionMessage,
    result: &Outcome,
    target: Option<&TargetRef>,
) -> Result<(), TransitionError> {
    let (Some(effect), Some(spec)) = (&message.custom_effect, &message.additional_effect) else {
        return Ok(());
    };
    if !should_manage_additional_effect(result, spec) {
        return Ok(());
    }
    let Some(target) = target else {
        debug!(message_id = %message.id, "Effect gate passed but there is no target");
        return Ok(());
    };
    authority
        .route(AuthorityOp::ApplyCustomEffect {
            effect: effect.clone(),
            targets: vec![target.clone()],
        })
        .await?;
    Ok(())
}
