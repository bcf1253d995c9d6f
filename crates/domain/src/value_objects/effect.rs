//! Effect payloads
//!
//! `AdditionalEffect` is the gate the resolver evaluates after a roll is
//! re-resolved; `CustomEffect` is what actually lands on targets. The payload
//! is a closed struct with explicit optional fields so stores can validate it
//! instead of passing an untyped bag around.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::DiceFormula;

/// When a configured additional effect should be managed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyOn {
    #[default]
    Never,
    OnSuccess,
    OnFailure,
    OnCritical,
    Always,
}

/// Additional-effect configuration carried by a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalEffect {
    /// Master switch; nothing is managed while false.
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub apply_on: ApplyOn,
    /// Minimum margin for the `OnSuccess` arm, at least 1. Ignored
    /// everywhere else.
    #[serde(default)]
    pub success_threshold: Option<i32>,
}

impl AdditionalEffect {
    /// Checks the trigger rule is well-formed. Stores run this before
    /// accepting a message that carries one.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(threshold) = self.success_threshold {
            if threshold < 1 {
                return Err(DomainError::validation(
                    "success threshold must be positive",
                ));
            }
        }
        Ok(())
    }
}

/// Unit for timed effect durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationUnit {
    Rounds,
    Minutes,
    Hours,
    Days,
}

/// What an effect formula does to the target's hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormulaType {
    Damage,
    Healing,
}

/// A concrete effect to apply to target actors.
///
/// Statuses are granted as a set (re-application is a no-op); a formula, when
/// present, is rolled on every application and its delta is not idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEffect {
    pub name: String,
    #[serde(default)]
    pub statuses: BTreeSet<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub unit: Option<DurationUnit>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub formula_type: Option<FormulaType>,
    #[serde(default)]
    pub element_type: Option<String>,
}

impl CustomEffect {
    /// Checks the payload is well-formed. Stores run this before accepting a
    /// message that carries an effect.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("effect name cannot be empty"));
        }
        if self.statuses.is_empty() && self.formula.is_none() {
            return Err(DomainError::validation(
                "effect must grant a status or carry a formula",
            ));
        }
        if let Some(formula) = &self.formula {
            if self.formula_type.is_none() {
                return Err(DomainError::validation(
                    "effect formula requires a formula type",
                ));
            }
            DiceFormula::parse(formula)?;
        }
        if self.duration.is_some() && self.unit.is_none() {
            return Err(DomainError::validation(
                "effect duration requires a unit",
            ));
        }
        Ok(())
    }
}
