//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the shared records:
//! - `TransitionLocks` - per-message transition serialization

pub mod locks;

pub use locks::{TransitionGuard, TransitionLocks};
