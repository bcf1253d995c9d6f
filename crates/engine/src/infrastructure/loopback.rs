//! In-process authority channel adapters.
//!
//! [`LoopbackChannel`] carries routed operations straight to a referee
//! executor living in the same process; the ack it returns reflects what the
//! executor actually did. [`DisconnectedChannel`] is what a party holds when
//! no referee is reachable: every send fails explicitly instead of hanging.

use std::sync::Arc;

use async_trait::async_trait;

use rollgate_shared::{AuthorityAck, AuthorityRequest, ErrorCode, ResponseResult};

use crate::authority::{AuthorityExecutor, ExecuteError};
use crate::infrastructure::ports::{AuthorityChannel, ChannelError, StoreError};

/// Channel whose far end is a referee executor in this process.
pub struct LoopbackChannel {
    executor: Arc<AuthorityExecutor>,
}

impl LoopbackChannel {
    pub fn new(executor: Arc<AuthorityExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl AuthorityChannel for LoopbackChannel {
    async fn send(&self, request: AuthorityRequest) -> Result<AuthorityAck, ChannelError> {
        let correlation_id = request.correlation_id;
        match self.executor.execute(correlation_id, request.op).await {
            Ok(()) => Ok(AuthorityAck::accepted(correlation_id)),
            Err(e) => Ok(AuthorityAck::rejected(
                correlation_id,
                ResponseResult::error(error_code(&e), e.to_string()),
            )),
        }
    }
}

fn error_code(error: &ExecuteError) -> ErrorCode {
    match error {
        ExecuteError::UnknownOp => ErrorCode::BadRequest,
        ExecuteError::Store(StoreError::NotFound { .. }) => ErrorCode::NotFound,
        ExecuteError::Store(StoreError::Validation(_)) => ErrorCode::ValidationError,
        ExecuteError::Store(_) | ExecuteError::Effect(_) => ErrorCode::InternalError,
    }
}

/// Channel for a party with no referee on the other end.
pub struct DisconnectedChannel;

#[async_trait]
impl AuthorityChannel for DisconnectedChannel {
    async fn send(&self, _request: AuthorityRequest) -> Result<AuthorityAck, ChannelError> {
        Err(ChannelError::Unreachable)
    }
}
