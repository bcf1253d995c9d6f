//! Rollgate Protocol - Shared types for referee-peer communication
//!
//! This crate contains the types that cross the wire inside a session:
//! - Authority operations and their receipts (AuthorityRequest, AuthorityAck)
//! - Session events fanned out to participants (SessionEvent)
//! - Correlation IDs linking a routed mutation to its confirmation
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and uuid (plus the
//!    domain crate for the vocabulary types the protocol carries)
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Forward compatible** - Unknown enum variants deserialize to `Unknown`

pub mod correlation;
pub mod messages;
pub mod responses;

// =============================================================================
// Correlation
// =============================================================================
pub use correlation::CorrelationId;

// =============================================================================
// Wire Message Types
// =============================================================================
pub use messages::{
    // Authority envelope and operations
    AuthorityAck,
    AuthorityOp,
    AuthorityRequest,
    ResourceDebit,
    // Session fan-out
    SessionEvent,
};

// =============================================================================
// Response Types
// =============================================================================
pub use responses::{ErrorCode, ResponseResult};
