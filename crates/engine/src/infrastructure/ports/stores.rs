// Port traits define the full contract - some methods are for future use
#![allow(dead_code)]

//! Store port traits for shared-record access.

use async_trait::async_trait;
use rollgate_domain::{Actor, ActorId, MessagePatch, MessageId, ResolutionMessage, TargetRef};

use super::error::StoreError;

// =============================================================================
// Record Store
// =============================================================================

/// Storage for resolution messages.
///
/// `update` is a partial merge: only the fields the patch carries are
/// touched, never a full replace. Effect payloads are validated at this
/// boundary - a message carrying a malformed custom effect is rejected on
/// `create`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn get(&self, id: MessageId) -> Result<Option<ResolutionMessage>, StoreError>;
    async fn create(&self, message: &ResolutionMessage) -> Result<ResolutionMessage, StoreError>;
    async fn update(
        &self,
        id: MessageId,
        patch: &MessagePatch,
    ) -> Result<ResolutionMessage, StoreError>;
}

// =============================================================================
// Entity Resolver / Actor Store
// =============================================================================

/// Storage for actors, doubling as the target-reference resolver.
///
/// Reads go against replicated world state and are synchronous; writes are
/// async and reserved for the authoritative party.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Resolve a target reference against the local replica.
    fn resolve(&self, target: &TargetRef) -> Option<Actor>;
    /// Set one resource pool to an absolute value. Returns the updated actor.
    async fn set_resource(
        &self,
        id: ActorId,
        resource: &str,
        value: i64,
    ) -> Result<Actor, StoreError>;
    async fn save(&self, actor: &Actor) -> Result<(), StoreError>;
}
