//! Rollgate Engine library.
//!
//! Action resolution and authority arbitration for a dice session.
//!
//! ## Structure
//!
//! - `use_cases/` - Message intake, effect application, and the
//!   luck/opposed/save re-resolution transitions
//! - `authority/` - The router deciding who may write shared records, and
//!   the referee-side executor both paths end in
//! - `session` - Participant registry and event fan-out
//! - `stores/` - Per-message transition locks
//! - `infrastructure/` - Ports and adapters (in-memory stores, in-process
//!   channels, system clock/random/dice)
//! - `app` - Application composition per session participant

pub mod app;
pub mod authority;
pub mod infrastructure;
pub mod session;
pub mod settings;
pub mod stores;
pub mod use_cases;

pub use app::{App, Stores, UseCases};
pub use settings::EngineSettings;

/// Install the engine's tracing subscriber.
///
/// Reads `RUST_LOG` when set and defaults to engine-level debug otherwise.
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollgate_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
