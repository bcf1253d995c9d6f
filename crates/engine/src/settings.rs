//! Engine configuration.
//!
//! Session-level knobs read from the environment at startup. Every knob has
//! a default, so a bare environment composes a working engine.

use std::sync::Arc;
use std::time::Duration;

use rollgate_domain::{CriticalRule, NaturalFace};

/// Tunable session behavior.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Deliver linked damage on a successful luck spend. Off by default;
    /// opposed and save resolutions deliver regardless.
    pub combo_rolls: bool,
    /// How long a routed mutation waits for the referee's applied broadcast.
    pub confirm_timeout: Duration,
    /// Raw face at or above which a roll classifies as critical.
    pub critical_face: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            combo_rolls: false,
            confirm_timeout: Duration::from_secs(5),
            critical_face: 20,
        }
    }
}

impl EngineSettings {
    /// Read settings from `ROLLGATE_*` environment variables, falling back
    /// to the defaults for anything absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            combo_rolls: std::env::var("ROLLGATE_COMBO_ROLLS")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.combo_rolls),
            confirm_timeout: std::env::var("ROLLGATE_CONFIRM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.confirm_timeout),
            critical_face: std::env::var("ROLLGATE_CRITICAL_FACE")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.critical_face),
        }
    }

    /// The critical rule these settings configure.
    pub fn critical_rule(&self) -> Arc<dyn CriticalRule> {
        Arc::new(NaturalFace {
            threshold: self.critical_face,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
