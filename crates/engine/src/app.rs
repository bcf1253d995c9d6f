//! Application state and composition.
//!
//! One [`App`] per session participant. The referee's app owns the
//! authoritative stores; a player's app points at the same in-process stores
//! and hub but routes every mutation through a channel to the referee's
//! executor. To compose a two-party session: build the referee with
//! [`App::referee`], wrap its executor in a
//! [`LoopbackChannel`](crate::infrastructure::loopback::LoopbackChannel), and
//! hand that channel to [`App::player`] together with the referee's stores
//! and hub.

use std::sync::Arc;

use crate::authority::{AuthorityContext, AuthorityExecutor, AuthorityRouter, SessionAuthority};
use crate::infrastructure::memory::{InMemoryActorStore, InMemoryMessageStore};
use crate::infrastructure::ports::{
    ActorStore, AuthorityChannel, ClockPort, DiceRoller, MessageStore, RandomPort,
};
use crate::infrastructure::system::{FormulaRoller, SystemClock, SystemRandom};
use crate::session::SessionHub;
use crate::settings::EngineSettings;
use crate::stores::TransitionLocks;
use crate::use_cases::effects::ApplyEffect;
use crate::use_cases::messages::PostActionMessage;
use crate::use_cases::resolution::ResolutionUseCases;

/// One participant's composed engine.
pub struct App {
    pub settings: EngineSettings,
    pub stores: Stores,
    pub session: Arc<SessionHub>,
    /// Local execution endpoint. A player's channel targets the referee's.
    pub executor: Arc<AuthorityExecutor>,
    pub authority: Arc<AuthorityRouter>,
    pub use_cases: UseCases,
}

/// Container for the shared-record stores.
#[derive(Clone)]
pub struct Stores {
    pub messages: Arc<dyn MessageStore>,
    pub actors: Arc<dyn ActorStore>,
}

/// Container for the use cases.
pub struct UseCases {
    pub post_action: Arc<PostActionMessage>,
    pub resolution: ResolutionUseCases,
}

impl App {
    /// Compose the referee's app: fresh stores, a fresh hub, and write
    /// authority over both.
    pub fn referee(settings: EngineSettings) -> Self {
        let stores = Stores {
            messages: Arc::new(InMemoryMessageStore::new()),
            actors: Arc::new(InMemoryActorStore::new()),
        };
        let session = Arc::new(SessionHub::new());
        Self::assemble(
            settings,
            stores,
            session,
            Arc::new(SessionAuthority::referee()),
        )
    }

    /// Compose a player's app against an existing session.
    ///
    /// `stores` and `session` are the session's shared records and hub;
    /// `channel` carries this player's mutations to the referee.
    pub fn player(
        settings: EngineSettings,
        stores: Stores,
        session: Arc<SessionHub>,
        channel: Arc<dyn AuthorityChannel>,
    ) -> Self {
        Self::assemble(
            settings,
            stores,
            session,
            Arc::new(SessionAuthority::player(channel)),
        )
    }

    fn assemble(
        settings: EngineSettings,
        stores: Stores,
        session: Arc<SessionHub>,
        context: Arc<dyn AuthorityContext>,
    ) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
        let dice: Arc<dyn DiceRoller> = Arc::new(FormulaRoller::new(random));
        let critical = settings.critical_rule();
        let locks = Arc::new(TransitionLocks::new());

        let apply_effect = Arc::new(ApplyEffect::new(
            stores.actors.clone(),
            dice.clone(),
            session.clone(),
        ));
        let executor = Arc::new(AuthorityExecutor::new(
            stores.messages.clone(),
            stores.actors.clone(),
            apply_effect,
            session.clone(),
        ));
        let authority = Arc::new(AuthorityRouter::new(
            context,
            executor.clone(),
            session.clone(),
            settings.confirm_timeout,
        ));

        let post_action = Arc::new(PostActionMessage::new(
            stores.messages.clone(),
            dice.clone(),
            clock.clone(),
            session.clone(),
            critical.clone(),
        ));
        let resolution = ResolutionUseCases::new(
            stores.messages.clone(),
            stores.actors.clone(),
            dice,
            clock,
            critical,
            authority.clone(),
            locks,
            session.clone(),
            settings.combo_rolls,
        );

        Self {
            settings,
            stores,
            session,
            executor,
            authority,
            use_cases: UseCases {
                post_action,
                resolution,
            },
        }
    }
}
