//! Domain entities - Core business objects with identity

mod actor;
mod message;

pub use actor::{Actor, HP_RESOURCE, LUCK_RESOURCE};
pub use message::{MessagePatch, MessageSubtype, ResolutionMessage, Visibility};
