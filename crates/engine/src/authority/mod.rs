//! Authority arbitration.
//!
//! Exactly one session participant, the referee, may write shared records.
//! Every other party describes the mutation it wants as an [`AuthorityOp`]
//! and routes it here. The router either performs the write against local
//! stores (authoritative path) or sends it over the channel and waits for
//! the referee's applied confirmation (routed path).

mod executor;

pub use executor::{AuthorityExecutor, ExecuteError};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use rollgate_shared::{AuthorityOp, AuthorityRequest, CorrelationId, ResponseResult};

use crate::infrastructure::loopback::DisconnectedChannel;
use crate::infrastructure::ports::{AuthorityChannel, ChannelError};
use crate::session::SessionHub;

/// Where this party stands in the session's authority relation.
pub trait AuthorityContext: Send + Sync {
    /// Whether this party holds write authority over shared records.
    fn has_authority(&self) -> bool;
    /// Channel to the referee, used when `has_authority` is false.
    fn channel(&self) -> Arc<dyn AuthorityChannel>;
}

/// Authority context fixed at composition time.
pub struct SessionAuthority {
    authoritative: bool,
    channel: Arc<dyn AuthorityChannel>,
}

impl SessionAuthority {
    /// The referee: writes locally, never needs a channel.
    pub fn referee() -> Self {
        Self {
            authoritative: true,
            channel: Arc::new(DisconnectedChannel),
        }
    }

    /// A player peer routing writes to the referee over `channel`.
    pub fn player(channel: Arc<dyn AuthorityChannel>) -> Self {
        Self {
            authoritative: false,
            channel,
        }
    }
}

impl AuthorityContext for SessionAuthority {
    fn has_authority(&self) -> bool {
        self.authoritative
    }

    fn channel(&self) -> Arc<dyn AuthorityChannel> {
        self.channel.clone()
    }
}

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("referee rejected the operation: {0}")]
    Rejected(String),
    #[error("no applied confirmation within {0:?}")]
    ConfirmationTimeout(Duration),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// Routes each shared-record mutation to the party allowed to perform it.
pub struct AuthorityRouter {
    context: Arc<dyn AuthorityContext>,
    executor: Arc<AuthorityExecutor>,
    session: Arc<SessionHub>,
    confirm_timeout: Duration,
}

impl AuthorityRouter {
    pub fn new(
        context: Arc<dyn AuthorityContext>,
        executor: Arc<AuthorityExecutor>,
        session: Arc<SessionHub>,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            context,
            executor,
            session,
            confirm_timeout,
        }
    }

    /// Route one mutation and return once it has genuinely landed.
    ///
    /// The authoritative path executes against local stores. The routed path
    /// sends the operation, checks the receipt, then waits for the referee's
    /// applied broadcast: the receipt alone never stands in for the final
    /// state.
    pub async fn route(&self, op: AuthorityOp) -> Result<(), AuthorityError> {
        if self.context.has_authority() {
            let correlation_id = CorrelationId::new();
            self.executor.execute(correlation_id, op).await?;
            return Ok(());
        }

        let request = AuthorityRequest::new(op);
        let correlation_id = request.correlation_id;
        // Park the waiter before sending so a fast referee cannot confirm
        // into a void.
        let applied = self.session.register_applied(correlation_id);

        info!(
            correlation = %correlation_id.short(),
            op = request.op.name(),
            "Routing mutation to referee"
        );

        let ack = match self.context.channel().send(request).await {
            Ok(ack) => ack,
            Err(e) => {
                self.session.forget_applied(correlation_id);
                return Err(e.into());
            }
        };
        match &ack.result {
            ResponseResult::Success { .. } => {}
            ResponseResult::Error { message, .. } => {
                self.session.forget_applied(correlation_id);
                return Err(AuthorityError::Rejected(message.clone()));
            }
            ResponseResult::Unknown => {
                self.session.forget_applied(correlation_id);
                return Err(AuthorityError::Rejected(
                    "unrecognized receipt from referee".to_string(),
                ));
            }
        }

        match tokio::time::timeout(self.confirm_timeout, applied).await {
            Ok(Ok(_)) => Ok(()),
            // Elapsed, or the hub dropped the confirmation sender.
            _ => {
                self.session.forget_applied(correlation_id);
                Err(AuthorityError::ConfirmationTimeout(self.confirm_timeout))
            }
        }
    }
}
