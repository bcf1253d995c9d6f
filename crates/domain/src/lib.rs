//! Rollgate domain - pure resolution rules and shared record types.
//!
//! Nothing in this crate does I/O or speaks async: rolls, outcomes, effects,
//! and messages are plain values; randomness is injected as a closure where a
//! draw is needed.

pub mod entities;
pub mod error;
pub mod ids;
pub mod resolver;
pub mod value_objects;

// Re-export entities (explicit list in entities/mod.rs)
pub use entities::{
    Actor, MessagePatch, MessageSubtype, ResolutionMessage, Visibility, HP_RESOURCE, LUCK_RESOURCE,
};

pub use error::DomainError;

// Re-export ID types
pub use ids::{ActorId, MessageId, TargetRef, UserId};

pub use resolver::should_manage_additional_effect;

// Re-export value objects (explicit list in value_objects/mod.rs)
pub use value_objects::{
    classify, AdditionalEffect, ApplyOn, CriticalRule, CustomEffect, DiceFormula, DiceParseError,
    DiceRollResult, DurationUnit, FormulaType, NaturalFace, NeverCritical, Outcome, Roll,
    RollOptions,
};
