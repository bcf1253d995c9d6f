//! Resolution message entity
//!
//! A resolution message is the shared record an actor action produces: the
//! rolls it carried, the classified result, the optional linked follow-through
//! roll, and the effect configuration. Messages are re-resolved in place by
//! the luck/opposed/save transitions until their paths close.
//!
//! Lifecycle: a message is **open** while `show_button` is true and at least
//! one re-resolution flag remains; it is **terminal** once `show_button` goes
//! false (saving throws end there). A transition in flight is runtime state
//! guarded by the per-message lock, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, MessageId, TargetRef, UserId};
use crate::value_objects::{AdditionalEffect, CustomEffect, Outcome, Roll};

/// What kind of action the message resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageSubtype {
    Attack,
    Damage,
    Save,
    /// Absorbs wire values this build does not know.
    #[serde(other)]
    Unknown,
}

/// Who a broadcast of this message may reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Public,
    /// Referee and the author.
    RefereeOnly,
    /// Referee alone; the author rolled blind.
    Blind,
    /// Author alone.
    SelfOnly,
}

fn default_true() -> bool {
    true
}

/// The shared record produced by an actor action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMessage {
    pub id: MessageId,
    pub subtype: MessageSubtype,
    #[serde(default)]
    pub author: Option<UserId>,
    pub rolls: Vec<Roll>,
    #[serde(default)]
    pub result: Option<Outcome>,
    /// Follow-through roll (e.g. the damage linked to an attack).
    #[serde(default)]
    pub linked_roll: Option<Roll>,
    #[serde(default)]
    pub custom_effect: Option<CustomEffect>,
    #[serde(default)]
    pub additional_effect: Option<AdditionalEffect>,
    /// False once the message is terminal.
    #[serde(default = "default_true")]
    pub show_button: bool,
    #[serde(default)]
    pub targets: Vec<TargetRef>,
    #[serde(default)]
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

impl ResolutionMessage {
    pub fn new(subtype: MessageSubtype, roll: Roll, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            subtype,
            author: None,
            rolls: vec![roll],
            result: None,
            linked_roll: None,
            custom_effect: None,
            additional_effect: None,
            show_button: true,
            targets: Vec::new(),
            visibility: Visibility::default(),
            created_at: now,
        }
    }

    pub fn with_author(mut self, author: UserId) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_result(mut self, result: Outcome) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_linked_roll(mut self, roll: Roll) -> Self {
        self.linked_roll = Some(roll);
        self
    }

    pub fn with_custom_effect(mut self, effect: CustomEffect) -> Self {
        self.custom_effect = Some(effect);
        self
    }

    pub fn with_additional_effect(mut self, spec: AdditionalEffect) -> Self {
        self.additional_effect = Some(spec);
        self
    }

    pub fn with_targets(mut self, targets: Vec<TargetRef>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// The roll transitions act on.
    pub fn primary_roll(&self) -> Option<&Roll> {
        self.rolls.first()
    }

    pub fn primary_roll_mut(&mut self) -> Option<&mut Roll> {
        self.rolls.first_mut()
    }

    /// The actor who made the primary roll.
    pub fn actor_id(&self) -> Option<ActorId> {
        self.primary_roll().and_then(|roll| roll.options.actor_id)
    }

    pub fn first_target(&self) -> Option<&TargetRef> {
        self.targets.first()
    }

    /// Terminal messages reject every transition.
    pub fn is_terminal(&self) -> bool {
        !self.show_button
    }

    /// Luck path still open.
    pub fn can_spend_luck(&self) -> bool {
        !self.is_terminal()
            && self
                .primary_roll()
                .map_or(false, |roll| roll.options.has_lucky_points)
    }

    /// Opposed path still open.
    pub fn can_oppose(&self) -> bool {
        !self.is_terminal()
            && self
                .primary_roll()
                .map_or(false, |roll| roll.options.opposite_roll)
    }
}

/// Partial update for a message. Stores merge these field by field; absent
/// fields leave the stored record untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    #[serde(default)]
    pub rolls: Option<Vec<Roll>>,
    #[serde(default)]
    pub result: Option<Outcome>,
    #[serde(default)]
    pub linked_roll: Option<Roll>,
    #[serde(default)]
    pub show_button: Option<bool>,
}

impl MessagePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rolls(mut self, rolls: Vec<Roll>) -> Self {
        self.rolls = Some(rolls);
        self
    }

    pub fn result(mut self, result: Outcome) -> Self {
        self.result = Some(result);
        self
    }

    pub fn linked_roll(mut self, roll: Roll) -> Self {
        self.linked_roll = Some(roll);
        self
    }

    pub fn show_button(mut self, show: bool) -> Self {
        self.show_button = Some(show);
        self
    }

    /// Merge into an existing message.
    pub fn apply_to(&self, message: &mut ResolutionMessage) {
        if let Some(rolls) = &self.rolls {
            message.rolls = rolls.clone();
        }
        if let Some(result) = self.result {
            message.result = Some(result);
        }
        if let Some(linked) = &self.linked_roll {
            message.linked_roll = Some(linked.clone());
        }
        if let Some(show) = self.show_button {
            message.show_button = show;
        }
    }
}
