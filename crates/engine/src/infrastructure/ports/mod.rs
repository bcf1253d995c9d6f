//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - Shared-record stores (in-memory today, could swap to a persistent store)
//! - The authority channel (loopback today, could swap to a network transport)
//! - Dice draws, clock, random (for testing)

mod channel;
mod dice;
mod error;
mod stores;
mod testing;

pub use channel::AuthorityChannel;
pub use dice::DiceRoller;
pub use error::{ChannelError, StoreError};
pub use stores::{ActorStore, MessageStore};
pub use testing::{ClockPort, RandomPort};

// Test-only mocks (generated by mockall, only available during test builds)
#[cfg(test)]
pub use channel::MockAuthorityChannel;
#[cfg(test)]
pub use dice::MockDiceRoller;
#[cfg(test)]
pub use stores::{MockActorStore, MockMessageStore};
#[cfg(test)]
pub use testing::MockClockPort;
