// Port traits define the full contract - some methods are for future use
#![allow(dead_code)]

//! Random draw provider port.

use rollgate_domain::{DomainError, Roll};

/// Draws a roll from dice notation (`"1d20 + 3"`).
///
/// Synchronous like the other randomness seams; the formula grammar is the
/// domain's `NdM + k` notation and anything else is a parse error.
#[cfg_attr(test, mockall::automock)]
pub trait DiceRoller: Send + Sync {
    fn roll(&self, formula: &str) -> Result<Roll, DomainError>;
}
