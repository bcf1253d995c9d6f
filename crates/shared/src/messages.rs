//! Wire message types for referee-player session traffic
//!
//! This module contains the message types exchanged inside a session: routed
//! authority operations (player peer → referee), their receipts (referee →
//! player peer), and session events fanned out to every participant.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing variants requires major version bump
//! - Renaming variants is a breaking change
//! - Unknown enum variants deserialize to `Unknown` variant for forward compatibility

use serde::{Deserialize, Serialize};

use rollgate_domain::{Actor, ActorId, CustomEffect, MessageId, Outcome, ResolutionMessage, Roll, TargetRef};

use crate::correlation::CorrelationId;
use crate::responses::ResponseResult;

// =============================================================================
// Authority Operations (player peer → referee)
// =============================================================================

/// Envelope for one routed mutation.
///
/// Player peers never write shared state directly; they describe the mutation
/// and send it here. The referee echoes `correlation_id` back in the
/// [`AuthorityAck`] and again in [`SessionEvent::MutationApplied`] once the
/// write has landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityRequest {
    pub correlation_id: CorrelationId,
    pub op: AuthorityOp,
}

impl AuthorityRequest {
    pub fn new(op: AuthorityOp) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            op,
        }
    }
}

/// Mutations only the referee may perform.
///
/// Each variant carries exactly the fields the mutation touches; the referee
/// merges them into the stored record rather than replacing it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthorityOp {
    /// Land a custom effect on target actors
    ApplyCustomEffect {
        effect: CustomEffect,
        targets: Vec<TargetRef>,
    },
    /// Persist a luck re-resolution: the mutated rolls, the new outcome, and
    /// the luck debit that must land before the message is touched
    UpdateMessageAfterLuckSpend {
        message_id: MessageId,
        rolls: Vec<Roll>,
        result: Outcome,
        /// Absent when the spender's pool was already empty
        #[serde(default)]
        debit: Option<ResourceDebit>,
    },
    /// Persist an opposed re-resolution
    UpdateMessageAfterOpposedRoll {
        message_id: MessageId,
        rolls: Vec<Roll>,
        result: Outcome,
    },
    /// Persist a saving-throw re-resolution; the save roll replaces the
    /// linked roll and the message closes for good
    UpdateMessageAfterSavedRoll {
        message_id: MessageId,
        rolls: Vec<Roll>,
        result: Outcome,
        linked_roll: Roll,
        #[serde(default)]
        show_button: bool,
    },
    /// Unknown operation for forward compatibility
    ///
    /// When deserializing an unknown variant, this variant is used instead of
    /// failing. Allows older referees to gracefully reject new operations.
    #[serde(other)]
    Unknown,
}

impl AuthorityOp {
    /// The message this operation mutates, if it targets one.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            AuthorityOp::UpdateMessageAfterLuckSpend { message_id, .. }
            | AuthorityOp::UpdateMessageAfterOpposedRoll { message_id, .. }
            | AuthorityOp::UpdateMessageAfterSavedRoll { message_id, .. } => Some(*message_id),
            AuthorityOp::ApplyCustomEffect { .. } | AuthorityOp::Unknown => None,
        }
    }

    /// Stable operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AuthorityOp::ApplyCustomEffect { .. } => "apply_custom_effect",
            AuthorityOp::UpdateMessageAfterLuckSpend { .. } => "update_message_after_luck_spend",
            AuthorityOp::UpdateMessageAfterOpposedRoll { .. } => {
                "update_message_after_opposed_roll"
            }
            AuthorityOp::UpdateMessageAfterSavedRoll { .. } => "update_message_after_saved_roll",
            AuthorityOp::Unknown => "unknown",
        }
    }
}

/// A resource spend that must land before the mutation it funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDebit {
    pub actor_id: ActorId,
    /// Pool name, e.g. `"luck"`
    pub resource: String,
    pub amount: i64,
}

// =============================================================================
// Authority Receipts (referee → player peer)
// =============================================================================

/// Receipt for one [`AuthorityRequest`].
///
/// Acceptance is not application: an `Ok` receipt means the referee took the
/// operation, and peers learn the write actually landed through
/// [`SessionEvent::MutationApplied`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityAck {
    pub correlation_id: CorrelationId,
    pub result: ResponseResult,
}

impl AuthorityAck {
    pub fn accepted(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            result: ResponseResult::success_empty(),
        }
    }

    pub fn rejected(correlation_id: CorrelationId, result: ResponseResult) -> Self {
        Self {
            correlation_id,
            result,
        }
    }
}

// =============================================================================
// Session Events (referee → all participants)
// =============================================================================

/// Events fanned out to session participants.
///
/// Message events are filtered per-recipient by visibility before delivery;
/// actor and mutation events go to everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A new resolution message entered the log
    MessageCreated { message: ResolutionMessage },
    /// An existing message was re-resolved or closed
    MessageUpdated { message: ResolutionMessage },
    /// An actor's pools or statuses changed
    ActorUpdated { actor: Actor },
    /// The referee finished persisting a routed mutation
    MutationApplied { correlation_id: CorrelationId },
    /// Unknown event type for forward compatibility
    ///
    /// When deserializing an unknown variant, this variant is used instead of
    /// failing. Allows older peers to gracefully handle new event types.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod serde_tests {
    use super::{AuthorityOp, AuthorityRequest, ResourceDebit, SessionEvent};
    use rollgate_domain::{ActorId, MessageId, Outcome, Roll, TargetRef};

    #[test]
    fn authority_op_round_trip_luck_spend() {
        let op = AuthorityOp::UpdateMessageAfterLuckSpend {
            message_id: MessageId::new(),
            rolls: vec![Roll::new("1d20", vec![8], 18)],
            result: Outcome::new(true, false, 6),
            debit: Some(ResourceDebit {
                actor_id: ActorId::new(),
                resource: "luck".to_string(),
                amount: 1,
            }),
        };

        let json = serde_json::to_string(&op).expect("serialize");
        let decoded: AuthorityOp = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(format!("{:?}", decoded), format!("{:?}", op));
    }

    #[test]
    fn authority_op_round_trip_luck_spend_without_debit() {
        let op = AuthorityOp::UpdateMessageAfterLuckSpend {
            message_id: MessageId::new(),
            rolls: vec![Roll::new("1d20", vec![8], 8)],
            result: Outcome::new(false, false, -4),
            debit: None,
        };

        let json = serde_json::to_string(&op).expect("serialize");
        let decoded: AuthorityOp = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(format!("{:?}", decoded), format!("{:?}", op));
    }

    #[test]
    fn authority_op_round_trip_apply_custom_effect() {
        let op = AuthorityOp::ApplyCustomEffect {
            effect: rollgate_domain::CustomEffect {
                name: "Stunned".to_string(),
                statuses: std::collections::BTreeSet::from(["stunned".to_string()]),
                ..rollgate_domain::CustomEffect::default()
            },
            targets: vec![TargetRef::actor(ActorId::new())],
        };

        let json = serde_json::to_string(&op).expect("serialize");
        let decoded: AuthorityOp = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(format!("{:?}", decoded), format!("{:?}", op));
    }

    #[test]
    fn authority_op_round_trip_saved_roll() {
        let op = AuthorityOp::UpdateMessageAfterSavedRoll {
            message_id: MessageId::new(),
            rolls: vec![Roll::new("1d20+2", vec![14], 16)],
            result: Outcome::new(false, false, -1),
            linked_roll: Roll::new("1d20+2", vec![14], 16),
            show_button: false,
        };

        let json = serde_json::to_string(&op).expect("serialize");
        let decoded: AuthorityOp = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(format!("{:?}", decoded), format!("{:?}", op));
    }

    #[test]
    fn saved_roll_show_button_defaults_to_false() {
        let message_id = MessageId::new();
        let json = format!(
            r#"{{"type":"UpdateMessageAfterSavedRoll","message_id":"{message_id}","rolls":[],"result":{{"success":true,"critical":false,"margin":2}},"linked_roll":{{"formula":"1d20","faces":[11],"total":11}}}}"#
        );
        let decoded: AuthorityOp = serde_json::from_str(&json).expect("deserialize");
        match decoded {
            AuthorityOp::UpdateMessageAfterSavedRoll { show_button, .. } => assert!(!show_button),
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn request_envelope_round_trips_correlation_id() {
        let request = AuthorityRequest::new(AuthorityOp::UpdateMessageAfterOpposedRoll {
            message_id: MessageId::new(),
            rolls: vec![Roll::new("1d20", vec![12], 12)],
            result: Outcome::new(true, false, 1),
        });

        let json = serde_json::to_string(&request).expect("serialize");
        let decoded: AuthorityRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.correlation_id, request.correlation_id);
    }

    #[test]
    fn message_id_extraction() {
        let message_id = MessageId::new();
        let op = AuthorityOp::UpdateMessageAfterOpposedRoll {
            message_id,
            rolls: vec![],
            result: Outcome::new(true, false, 0),
        };
        assert_eq!(op.message_id(), Some(message_id));

        let op = AuthorityOp::ApplyCustomEffect {
            effect: rollgate_domain::CustomEffect::default(),
            targets: vec![],
        };
        assert_eq!(op.message_id(), None);
    }

    #[test]
    fn unknown_authority_op_deserializes_to_unknown() {
        let decoded: AuthorityOp =
            serde_json::from_str(r#"{"type":"BrandNewThing","foo":1}"#).expect("deserialize");
        assert!(matches!(decoded, AuthorityOp::Unknown));
    }

    #[test]
    fn unknown_session_event_deserializes_to_unknown() {
        let decoded: SessionEvent =
            serde_json::from_str(r#"{"type":"BrandNewThing","foo":1}"#).expect("deserialize");
        assert!(matches!(decoded, SessionEvent::Unknown));
    }
}
