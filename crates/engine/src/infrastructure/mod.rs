//! Infrastructure implementations.
//!
//! Port traits and the adapters behind them: in-memory stores, in-process
//! authority channels, and the system clock/random/dice implementations.

pub mod loopback;
pub mod memory;
pub mod ports;
pub mod system;
