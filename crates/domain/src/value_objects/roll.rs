//! Rolls and their re-resolution options
//!
//! A `Roll` is an already-drawn die result plus the options bag that drives
//! re-resolution: difficulty, pending bonus, and the one-shot luck/opposed
//! flags. Clearing a flag permanently closes that path for the roll.

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;
use crate::value_objects::DiceRollResult;

/// Options carried by every roll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOptions {
    /// Flat bonus already folded into the total.
    #[serde(default)]
    pub bonus: i32,
    /// Difficulty to beat; `None` means unopposed (auto-success).
    #[serde(default)]
    pub difficulty: Option<i32>,
    /// Luck re-resolution still available.
    #[serde(default)]
    pub has_lucky_points: bool,
    /// Opposed re-resolution still available.
    #[serde(default)]
    pub opposite_roll: bool,
    /// The actor who made the roll.
    #[serde(default)]
    pub actor_id: Option<ActorId>,
}

/// A resolved die draw plus its re-resolution state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roll {
    /// Original dice notation ("1d20+3").
    pub formula: String,
    /// Raw die faces in draw order.
    pub faces: Vec<i32>,
    /// Total including modifier and bonus.
    pub total: i32,
    #[serde(default)]
    pub options: RollOptions,
}

impl Roll {
    pub fn new(formula: impl Into<String>, faces: Vec<i32>, total: i32) -> Self {
        Self {
            formula: formula.into(),
            faces,
            total,
            options: RollOptions::default(),
        }
    }

    /// Build a roll from a dice draw.
    pub fn from_result(result: &DiceRollResult) -> Self {
        Self {
            formula: result.formula.display(),
            faces: result.faces.clone(),
            total: result.total,
            options: RollOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RollOptions) -> Self {
        self.options = options;
        self
    }

    /// Fold a luck bonus into the roll and consume the luck flag.
    pub fn apply_luck_bonus(&mut self, amount: i32) {
        self.options.bonus += amount;
        self.total += amount;
        self.options.has_lucky_points = false;
    }

    /// Consume the luck flag without granting the bonus (resource exhausted).
    pub fn close_luck(&mut self) {
        self.options.has_lucky_points = false;
    }

    /// Record the counter roll's total as this roll's difficulty and consume
    /// the opposed flag.
    pub fn close_opposition(&mut self, counter_total: i32) {
        self.options.difficulty = Some(counter_total);
        self.options.opposite_roll = false;
    }
}
