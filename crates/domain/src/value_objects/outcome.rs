//! Outcome classification
//!
//! Turns a roll into an outcome: margin against difficulty decides
//! success/failure, and an injected rule over the raw die faces decides the
//! critical flag independently of the margin.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::Roll;

/// Classification of a single roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    success: bool,
    critical: bool,
    margin: i32,
}

impl Outcome {
    pub const fn new(success: bool, critical: bool, margin: i32) -> Self {
        Self {
            success,
            critical,
            margin,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Always the inverse of success; never stored separately.
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Distance from the difficulty: `total - difficulty`, or the raw total
    /// for unopposed rolls.
    pub fn margin(&self) -> i32 {
        self.margin
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match (self.success, self.critical) {
            (true, true) => "critical success",
            (true, false) => "success",
            (false, true) => "critical failure",
            (false, false) => "failure",
        };
        write!(f, "{} (margin {})", kind, self.margin)
    }
}

/// Policy deciding whether a die sequence counts as critical.
///
/// Injected into classification so table rules (natural 20, exploding dice,
/// house thresholds) stay out of the margin math.
pub trait CriticalRule: Send + Sync {
    fn is_critical(&self, faces: &[i32]) -> bool;
}

/// Critical on any face at or above a threshold. `NaturalFace::default()`
/// is the natural-20 rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalFace {
    pub threshold: i32,
}

impl Default for NaturalFace {
    fn default() -> Self {
        Self { threshold: 20 }
    }
}

impl CriticalRule for NaturalFace {
    fn is_critical(&self, faces: &[i32]) -> bool {
        faces.iter().any(|face| *face >= self.threshold)
    }
}

/// No roll is ever critical.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCritical;

impl CriticalRule for NeverCritical {
    fn is_critical(&self, _faces: &[i32]) -> bool {
        false
    }
}

/// Classify a roll against its difficulty.
///
/// With a difficulty, margin is `total - difficulty` and success means a
/// non-negative margin. Without one the roll succeeds outright and the margin
/// carries the raw total.
pub fn classify(roll: &Roll, critical: &dyn CriticalRule) -> Outcome {
    let critical_hit = critical.is_critical(&roll.faces);
    match roll.options.difficulty {
        Some(difficulty) => {
            let margin = roll.total - difficulty;
            Outcome::new(margin >= 0, critical_hit, margin)
        }
        None => Outcome::new(true, critical_hit, roll.total),
    }
}
