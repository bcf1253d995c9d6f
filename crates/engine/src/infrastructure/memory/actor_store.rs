//! In-memory actor store.

use async_trait::async_trait;
use dashmap::DashMap;

use rollgate_domain::{Actor, ActorId, TargetRef};

use crate::infrastructure::ports::{ActorStore, StoreError};

/// Actor store backed by a concurrent map.
pub struct InMemoryActorStore {
    actors: DashMap<ActorId, Actor>,
}

impl InMemoryActorStore {
    pub fn new() -> Self {
        Self {
            actors: DashMap::new(),
        }
    }

    /// Seed an actor into the replica.
    pub fn insert(&self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }
}

impl Default for InMemoryActorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActorStore for InMemoryActorStore {
    fn resolve(&self, target: &TargetRef) -> Option<Actor> {
        let id = target.actor_id()?;
        self.actors.get(&id).map(|entry| entry.clone())
    }

    async fn set_resource(
        &self,
        id: ActorId,
        resource: &str,
        value: i64,
    ) -> Result<Actor, StoreError> {
        let mut entry = self
            .actors
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Actor", id.to_string()))?;
        entry.set_resource(resource, value);
        Ok(entry.clone())
    }

    async fn save(&self, actor: &Actor) -> Result<(), StoreError> {
        self.actors.insert(actor.id, actor.clone());
        Ok(())
    }
}
