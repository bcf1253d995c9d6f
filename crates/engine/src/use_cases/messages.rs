//! Message intake.
//!
//! Turns a declared action into an open resolution message: draws the
//! primary roll, classifies it, draws the linked follow-through roll when one
//! is declared, persists the message, and fans the creation out. Intake is
//! not privilege-gated; any participant may post into its own log, and the
//! routed-mutation set never includes message creation.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use rollgate_domain::{
    classify, ActorId, AdditionalEffect, CriticalRule, CustomEffect, DomainError,
    MessageSubtype, ResolutionMessage, RollOptions, TargetRef, UserId, Visibility,
};
use rollgate_shared::SessionEvent;

use crate::infrastructure::ports::{ClockPort, DiceRoller, MessageStore, StoreError};
use crate::session::SessionHub;

/// One declared action, as the caller hands it in.
#[derive(Debug, Clone)]
pub struct ActionDeclaration {
    pub subtype: MessageSubtype,
    pub author: Option<UserId>,
    pub actor_id: Option<ActorId>,
    /// Primary roll notation, e.g. `"1d20+5"`.
    pub formula: String,
    pub difficulty: Option<i32>,
    /// Whether the luck path starts open on the primary roll.
    pub has_lucky_points: bool,
    /// Whether the opposed path starts open on the primary roll.
    pub opposite_roll: bool,
    /// Follow-through notation, drawn now and delivered on later success.
    pub linked_formula: Option<String>,
    pub custom_effect: Option<CustomEffect>,
    pub additional_effect: Option<AdditionalEffect>,
    pub targets: Vec<TargetRef>,
    pub visibility: Visibility,
}

impl ActionDeclaration {
    /// A bare declaration with everything optional left out.
    pub fn new(subtype: MessageSubtype, formula: impl Into<String>) -> Self {
        Self {
            subtype,
            author: None,
            actor_id: None,
            formula: formula.into(),
            difficulty: None,
            has_lucky_points: false,
            opposite_roll: false,
            linked_formula: None,
            custom_effect: None,
            additional_effect: None,
            targets: Vec::new(),
            visibility: Visibility::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Dice(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Use case: post a declared action as an open resolution message.
pub struct PostActionMessage {
    messages: Arc<dyn MessageStore>,
    dice: Arc<dyn DiceRoller>,
    clock: Arc<dyn ClockPort>,
    session: Arc<SessionHub>,
    critical: Arc<dyn CriticalRule>,
}

impl PostActionMessage {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        dice: Arc<dyn DiceRoller>,
        clock: Arc<dyn ClockPort>,
        session: Arc<SessionHub>,
        critical: Arc<dyn CriticalRule>,
    ) -> Self {
        Self {
            messages,
            dice,
            clock,
            session,
            critical,
        }
    }

    pub async fn execute(
        &self,
        declaration: ActionDeclaration,
    ) -> Result<ResolutionMessage, PostError> {
        // 1. Draw the primary roll and attach its re-resolution options.
        let mut roll = self.dice.roll(&declaration.formula)?;
        roll.options = RollOptions {
            bonus: 0,
            difficulty: declaration.difficulty,
            has_lucky_points: declaration.has_lucky_points,
            opposite_roll: declaration.opposite_roll,
            actor_id: declaration.actor_id,
        };

        // 2. Classify it.
        let result = classify(&roll, self.critical.as_ref());

        // 3. Draw the linked follow-through roll, when declared.
        let linked_roll = declaration
            .linked_formula
            .as_deref()
            .map(|formula| self.dice.roll(formula))
            .transpose()?;

        // 4. Build and persist the open message.
        let mut message = ResolutionMessage::new(declaration.subtype, roll, self.clock.now())
            .with_result(result)
            .with_targets(declaration.targets)
            .with_visibility(declaration.visibility);
        if let Some(author) = declaration.author {
            message = message.with_author(author);
        }
        if let Some(linked) = linked_roll {
            message = message.with_linked_roll(linked);
        }
        if let Some(effect) = declaration.custom_effect {
            message = message.with_custom_effect(effect);
        }
        if let Some(spec) = declaration.additional_effect {
            message = message.with_additional_effect(spec);
        }
        let message = self.messages.create(&message).await?;

        // 5. Fan the creation out; visibility filtering happens in the hub.
        self.session
            .broadcast(SessionEvent::MessageCreated {
                message: message.clone(),
            })
            .await;

        info!(
            message_id = %message.id,
            subtype = ?message.subtype,
            outcome = %result,
            "Posted action message"
        );
        Ok(message)
    }
}
