//! Value objects - Immutable objects defined by their attributes

mod dice;
mod effect;
mod outcome;
mod roll;

pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use effect::{AdditionalEffect, ApplyOn, CustomEffect, DurationUnit, FormulaType};
pub use outcome::{classify, CriticalRule, NaturalFace, NeverCritical, Outcome};
pub use roll::{Roll, RollOptions};
