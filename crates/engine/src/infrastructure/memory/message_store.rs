//! In-memory message store.

use async_trait::async_trait;
use dashmap::DashMap;

use rollgate_domain::{MessageId, MessagePatch, ResolutionMessage};

use crate::infrastructure::ports::{MessageStore, StoreError};

/// Message store backed by a concurrent map.
///
/// `update` merges the patch into the stored record so concurrent writers
/// only touch the fields they carry. Effect payloads are validated on
/// `create`; a malformed effect never enters the log.
pub struct InMemoryMessageStore {
    messages: DashMap<MessageId, ResolutionMessage>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            messages: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Snapshot of the log, oldest first.
    pub fn list(&self) -> Vec<ResolutionMessage> {
        let mut all: Vec<_> = self
            .messages
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|message| message.created_at);
        all
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn get(&self, id: MessageId) -> Result<Option<ResolutionMessage>, StoreError> {
        Ok(self.messages.get(&id).map(|entry| entry.clone()))
    }

    async fn create(&self, message: &ResolutionMessage) -> Result<ResolutionMessage, StoreError> {
        if let Some(effect) = &message.custom_effect {
            effect.validate().map_err(StoreError::validation)?;
        }
        if let Some(spec) = &message.additional_effect {
            spec.validate().map_err(StoreError::validation)?;
        }
        self.messages.insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn update(
        &self,
        id: MessageId,
        patch: &MessagePatch,
    ) -> Result<ResolutionMessage, StoreError> {
        let mut entry = self
            .messages
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Message", id.to_string()))?;
        patch.apply_to(entry.value_mut());
        Ok(entry.clone())
    }
}
