//! In-memory store adapters.
//!
//! A session's shared records live in process memory on every party; the
//! referee's copies are authoritative, player copies are replicas kept
//! current by session events.

mod actor_store;
mod message_store;

pub use actor_store::InMemoryActorStore;
pub use message_store::InMemoryMessageStore;
