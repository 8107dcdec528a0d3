//! Building the initial simulation state.
//!
//! `world.state` picks the starting point. `new` seeds the ancestor genome
//! at the grid centre. `last` or an explicit path loads a snapshot, and a
//! load that finds nothing or fails falls back to a fresh seed.

use std::path::Path;

use fungera_core::config::SimulationConfig;
use fungera_core::runner;
use fungera_core::snapshot::{LoadSource, SnapshotRepository};
use fungera_core::tick::SimulationState;
use fungera_world::Genome;
use tracing::{info, warn};

use crate::error::EngineError;

/// Write the built-in seed genome to `path` if nothing is there yet.
pub fn ensure_genome_file(path: &Path) {
    if path.exists() {
        return;
    }
    match std::fs::write(path, Genome::seed().to_text()) {
        Ok(()) => info!(path = %path.display(), "seed genome written"),
        Err(error) => warn!(path = %path.display(), %error, "could not write seed genome"),
    }
}

/// Read the genome at `path`, falling back to the built-in seed genome.
pub fn load_genome(path: &Path) -> Genome {
    match Genome::from_file(path) {
        Ok(genome) => {
            info!(path = %path.display(), size = %genome.size(), "genome loaded");
            genome
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "genome unusable, using built-in seed genome");
            Genome::seed()
        }
    }
}

/// Create the state the run starts from.
///
/// # Errors
///
/// Returns [`EngineError::Tick`] if the grid cannot be created or not even
/// the built-in genome fits in it.
pub fn initial_state<R: SnapshotRepository>(
    config: SimulationConfig,
    repository: &R,
) -> Result<SimulationState, EngineError> {
    let source = LoadSource::from_setting(&config.world.state);
    let genome_path = config.world.genome_path.clone();
    let mut state = SimulationState::new(config)?;

    if source != LoadSource::Fresh {
        if runner::load_into(&mut state, repository, &source) {
            return Ok(state);
        }
        warn!(?source, "starting fresh instead");
    }

    ensure_genome_file(&genome_path);
    let genome = load_genome(&genome_path);
    if let Err(error) = state.seed(&genome) {
        warn!(%error, "genome does not fit, using built-in seed genome");
        state.seed(&Genome::seed())?;
    }
    Ok(state)
}
