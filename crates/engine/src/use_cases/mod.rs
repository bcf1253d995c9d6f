//! Use cases - resolution flow orchestration.
//!
//! Each module holds the use cases for one concern: message intake, effect
//! application, and the re-resolution transitions.

pub mod effects;
pub mod messages;
pub mod resolution;

// Re-export main types
pub use effects::{ApplyEffect, EffectError, EffectReceipt};
pub use messages::{ActionDeclaration, PostActionMessage, PostError};
pub use resolution::{
    LuckOutcome, ResolutionUseCases, ResolveOpposed, ResolveSave, SpendLuck, TransitionError,
};
