// Port traits define the full contract - some methods are for future use
#![allow(dead_code)]

//! Authority channel port.

use async_trait::async_trait;
use rollgate_shared::{AuthorityAck, AuthorityRequest};

use super::error::ChannelError;

/// Transport carrying routed mutations from a player peer to the referee.
///
/// `send` never hangs: with no referee on the other end it fails with
/// `ChannelError::Unreachable`. The ack it returns is a receipt, not a
/// confirmation - callers that need to know the mutation landed wait for the
/// referee's applied broadcast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorityChannel: Send + Sync {
    async fn send(&self, request: AuthorityRequest) -> Result<AuthorityAck, ChannelError>;
}
