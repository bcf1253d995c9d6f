//! Session participants and event fan-out.
//!
//! One hub per session. It keeps the participant registry (with its single
//! referee slot), fans session events out to the participants allowed to see
//! them, and resolves the applied-confirmation waiters the authority router
//! parks while a routed mutation is in flight.

use std::collections::HashMap;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, warn};

use rollgate_domain::{ResolutionMessage, UserId, Visibility};
use rollgate_shared::{CorrelationId, SessionEvent};

/// A participant's role inside one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Holds write authority over the session's shared records.
    Referee,
    /// Routes every shared-record mutation through the referee.
    Player,
}

/// A registered session participant.
#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: UserId,
    pub name: String,
    pub role: SessionRole,
}

impl Participant {
    pub fn referee(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            role: SessionRole::Referee,
        }
    }

    pub fn player(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            role: SessionRole::Player,
        }
    }

    pub fn is_referee(&self) -> bool {
        self.role == SessionRole::Referee
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("a referee is already registered for this session")]
    RefereeAlreadyRegistered,
    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),
}

/// Registry and fan-out point for one session.
pub struct SessionHub {
    participants: RwLock<HashMap<UserId, (Participant, mpsc::Sender<SessionEvent>)>>,
    applied_waiters: DashMap<CorrelationId, oneshot::Sender<CorrelationId>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self {
            participants: RwLock::new(HashMap::new()),
            applied_waiters: DashMap::new(),
        }
    }

    /// Register a participant and the sender its events go out on.
    ///
    /// At most one referee per session; a second referee registration is
    /// rejected so write authority can never split.
    pub async fn register(
        &self,
        participant: Participant,
        sender: mpsc::Sender<SessionEvent>,
    ) -> Result<(), SessionError> {
        let mut participants = self.participants.write().await;
        if participants.contains_key(&participant.user_id) {
            return Err(SessionError::AlreadyRegistered(participant.user_id));
        }
        if participant.is_referee()
            && participants.values().any(|(info, _)| info.is_referee())
        {
            return Err(SessionError::RefereeAlreadyRegistered);
        }
        debug!(user_id = %participant.user_id, role = ?participant.role, "Participant registered");
        participants.insert(participant.user_id, (participant, sender));
        Ok(())
    }

    pub async fn unregister(&self, user_id: UserId) {
        let mut participants = self.participants.write().await;
        if participants.remove(&user_id).is_some() {
            debug!(%user_id, "Participant unregistered");
        }
    }

    /// The registered referee, if any.
    pub async fn referee(&self) -> Option<UserId> {
        let participants = self.participants.read().await;
        participants
            .values()
            .find(|(info, _)| info.is_referee())
            .map(|(info, _)| info.user_id)
    }

    pub async fn participant_count(&self) -> usize {
        self.participants.read().await.len()
    }

    /// Fan an event out to every participant allowed to see it.
    ///
    /// Message events honor the message's visibility; actor updates and
    /// applied confirmations go to everyone. Slow receivers are skipped with
    /// a warning rather than blocking the sender.
    pub async fn broadcast(&self, event: SessionEvent) {
        // Applied waiters resolve first so a peer awaiting its own
        // confirmation is released even if its event channel is full.
        if let SessionEvent::MutationApplied { correlation_id } = &event {
            self.resolve_applied(*correlation_id);
        }

        let participants = self.participants.read().await;
        for (info, sender) in participants.values() {
            if !Self::may_receive(info, &event) {
                continue;
            }
            if let Err(e) = sender.try_send(event.clone()) {
                warn!(user_id = %info.user_id, error = %e, "Failed to deliver session event");
            }
        }
    }

    /// Park a waiter for a routed mutation's applied confirmation.
    pub fn register_applied(&self, correlation_id: CorrelationId) -> oneshot::Receiver<CorrelationId> {
        let (tx, rx) = oneshot::channel();
        self.applied_waiters.insert(correlation_id, tx);
        rx
    }

    /// Drop a waiter that gave up.
    pub fn forget_applied(&self, correlation_id: CorrelationId) {
        self.applied_waiters.remove(&correlation_id);
    }

    fn resolve_applied(&self, correlation_id: CorrelationId) {
        if let Some((_, tx)) = self.applied_waiters.remove(&correlation_id) {
            // The waiter may have timed out and dropped its receiver.
            let _ = tx.send(correlation_id);
        }
    }

    fn may_receive(participant: &Participant, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::MessageCreated { message } | SessionEvent::MessageUpdated { message } => {
                Self::message_visible_to(participant, message)
            }
            _ => true,
        }
    }

    fn message_visible_to(participant: &Participant, message: &ResolutionMessage) -> bool {
        let is_author = message.author == Some(participant.user_id);
        match message.visibility {
            Visibility::Public => true,
            Visibility::RefereeOnly => participant.is_referee() || is_author,
            Visibility::Blind => participant.is_referee(),
            Visibility::SelfOnly => is_author,
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}
