//! Additional-effect resolution
//!
//! Decides, from a freshly classified outcome and the message's configured
//! additional effect, whether the effect should be managed at all. The
//! success threshold gates only the `OnSuccess` arm; every other arm ignores
//! it.

use crate::value_objects::{AdditionalEffect, ApplyOn, Outcome};

/// Decision table over `active` and `apply_on`.
pub fn should_manage_additional_effect(outcome: &Outcome, spec: &AdditionalEffect) -> bool {
    if !spec.active {
        return false;
    }
    match spec.apply_on {
        ApplyOn::Never => false,
        ApplyOn::Always => true,
        ApplyOn::OnSuccess => {
            outcome.is_success()
                && spec
                    .success_threshold
                    .map_or(true, |threshold| outcome.margin() >= threshold)
        }
        ApplyOn::OnFailure => outcome.is_failure(),
        ApplyOn::OnCritical => outcome.is_critical(),
    }
}
