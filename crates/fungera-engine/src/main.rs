//! Headless driver for the Fungera simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `fungera-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the starting state: snapshot per `world.state`, else a fresh
//!    grid seeded with the genome file
//! 4. Create operator state; Ctrl-C requests a clean stop
//! 5. Run the simulation loop
//! 6. Save a final snapshot and log the result

mod bootstrap;
mod error;
mod progress;

use std::path::Path;
use std::sync::Arc;

use fungera_core::config::SimulationConfig;
use fungera_core::operator::OperatorState;
use fungera_core::runner;
use fungera_core::snapshot::SnapshotRepository;
use fungera_store::FileSnapshotStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "fungera-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, state setup, or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        name = %config.world.name,
        seed = config.world.seed,
        memory_rows = config.world.memory_rows,
        memory_cols = config.world.memory_cols,
        state = %config.world.state,
        "fungera-engine starting"
    );

    // 3. Build the starting state.
    let store = FileSnapshotStore::new(&config.snapshots.directory);
    let operator = Arc::new(OperatorState::new(&config.simulation));
    let progress_every = config.logging.progress_interval_ticks;
    let mut state = bootstrap::initial_state(config, &store)?;
    info!(
        tick = state.clock.tick(),
        population = state.scheduler.len(),
        snapshot_dir = %store.directory().display(),
        "Simulation state assembled"
    );

    // 4. Stop cleanly on Ctrl-C.
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping");
                operator.request_stop();
            }
        });
    }

    // 5. Run the simulation.
    let mut callback = ProgressCallback::new(progress_every);
    let result = runner::run_simulation(&mut state, &operator, &store, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 6. Final snapshot and results.
    match store.save(&state.config.world.name, &state.snapshot()) {
        Ok(path) => info!(path = %path.display(), "final snapshot saved"),
        Err(error) => warn!(%error, "final snapshot failed"),
    }
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "fungera-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `fungera-config.yaml`.
///
/// Looks for the config file relative to the current working directory;
/// `FUNGERA_STATE` and `FUNGERA_NAME` override the file either way.
fn load_config() -> Result<SimulationConfig, EngineError> {
    Ok(SimulationConfig::load_or_default(Path::new(CONFIG_PATH))?)
}
