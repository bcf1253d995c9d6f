//! Testability ports for injecting time and randomness.
//!
//! Message timestamps come through [`ClockPort`]; die faces and generated
//! identifiers come through [`RandomPort`]. Production code wires the system
//! implementations, tests wire fixed ones.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Inclusive draw in `[min, max]`, the shape a die face needs.
    fn gen_range(&self, min: i32, max: i32) -> i32;
    fn gen_uuid(&self) -> Uuid;
}
