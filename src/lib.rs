pub mod config;
pub mod models;
pub mod db;
pub mod store; // Storage collaborator seam
pub mod scheduling; // Frequency, slots, generation, outcomes, clock
pub mod engine; // Per-patient serialized operations
pub mod dashboard; // Read-only views

pub use engine::{CallEngine, GenerationSummary, Registration};
pub use scheduling::{Clock, FixedClock, ScheduleError, SystemClock};
pub use store::{CareStore, SqliteCareStore};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. Honors `RUST_LOG`; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
