//! The global tick: one step of the whole simulation.
//!
//! Each tick runs, in order:
//!
//! 1. **Cycle** -- every organism alive at the start of the tick executes
//!    one instruction ([`Scheduler::cycle_all`]).
//! 2. **Cosmic ray** -- on every `random_rate`-th tick one random cell is
//!    overwritten with a random opcode.
//! 3. **Purge** -- on every `cycle_gap`-th tick, if the allocated ratio
//!    exceeds `memory_full_ratio`, the worst organisms are culled.
//! 4. **Advance** -- the tick counter is incremented.
//!
//! Steps 2 and 3 test the tick counter as it was before step 4, so tick 0
//! is due for both. Given the same seed and the same operator intents, a
//! run is fully deterministic.

use fungera_organisms::{DeathCause, OrganismConfig, spawn};
use fungera_types::{OrganismId, PopulationView, Vec2};
use fungera_world::{Genome, Grid, WorldError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::clock::{ClockError, SimulationClock};
use crate::config::SimulationConfig;
use crate::scheduler::Scheduler;
use crate::snapshot::{Snapshot, SnapshotError};

/// Errors that can occur during tick execution or state setup.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick counter value this tick ran at.
    pub tick: u64,
    /// Organisms that executed an instruction.
    pub executed: usize,
    /// Children created this tick.
    pub births: Vec<OrganismId>,
    /// Organisms removed this tick, culled ones included.
    pub deaths: Vec<(OrganismId, DeathCause)>,
    /// Errors added across the roster.
    pub faults: u64,
    /// Cell hit by the cosmic ray, if one fired.
    pub mutated: Option<Vec2>,
    /// Organisms removed by the purge, worst first.
    pub culled: Vec<OrganismId>,
    /// Live organisms at the end of the tick.
    pub population: usize,
    /// Allocated fraction of the grid at the end of the tick.
    pub allocated_ratio: f64,
}

/// Everything a tick reads or writes.
///
/// Loading a snapshot replaces the contents of this handle in place; there
/// is no other shared state.
#[derive(Debug)]
pub struct SimulationState {
    /// Loaded configuration.
    pub config: SimulationConfig,
    /// Interpreter settings derived from `config.organisms`.
    pub organism_config: OrganismConfig,
    /// Tick and purge counters.
    pub clock: SimulationClock,
    /// Instruction memory and allocation bitmap.
    pub grid: Grid,
    /// Live roster, cursor, and archive.
    pub scheduler: Scheduler,
    /// Source of cosmic-ray mutations.
    pub rng: StdRng,
}

impl SimulationState {
    /// An empty grid of the configured size with no organisms, at tick 0.
    pub fn new(config: SimulationConfig) -> Result<Self, TickError> {
        let grid = Grid::new(config.world.memory_rows, config.world.memory_cols)?;
        let rng = StdRng::seed_from_u64(config.world.seed);
        Ok(Self {
            organism_config: config.organisms.to_organism_config(),
            clock: SimulationClock::new(),
            grid,
            scheduler: Scheduler::new(),
            rng,
            config,
        })
    }

    /// Write `genome` with its corner at the grid centre and spawn the
    /// organism that owns it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GenomeOutOfBounds`] if the genome does not fit;
    /// the grid is left untouched in that case.
    pub fn seed(&mut self, genome: &Genome) -> Result<OrganismId, TickError> {
        let dims = self.grid.dimensions();
        let centre = Vec2::new(dims.row / 2, dims.col / 2);
        self.grid.load_genome(genome, centre)?;
        let organism = spawn(&mut self.grid, centre, genome.size(), None);
        let id = organism.id;
        info!(organism_id = %id, start = %centre, size = %genome.size(), "seed organism placed");
        self.scheduler.add_organism(organism);
        Ok(id)
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.clock.tick(),
            purges: self.clock.purges(),
            grid: self.grid.clone(),
            scheduler: self.scheduler.clone(),
        }
    }

    /// Replace the running state with `snapshot`.
    ///
    /// The snapshot is validated first; on error nothing changes. The RNG
    /// is reseeded from the configured seed plus the restored tick.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), SnapshotError> {
        snapshot.validate()?;
        let Snapshot {
            tick,
            purges,
            grid,
            scheduler,
        } = snapshot;
        self.clock = SimulationClock::from_parts(tick, purges);
        self.grid = grid;
        self.scheduler = scheduler;
        self.rng = StdRng::seed_from_u64(self.config.world.seed.wrapping_add(tick));
        info!(
            tick,
            purges,
            population = self.scheduler.len(),
            "simulation state restored"
        );
        Ok(())
    }

    /// Read-only status for a presentation layer.
    pub fn population_view(&self) -> PopulationView {
        PopulationView {
            name: self.config.world.name.clone(),
            tick: self.clock.tick(),
            purges: self.clock.purges(),
            total: u64::try_from(self.scheduler.len()).unwrap_or(u64::MAX),
            selected_index: self
                .scheduler
                .selected_index()
                .and_then(|i| u64::try_from(i).ok()),
            selected: self
                .scheduler
                .selected_view(self.organism_config.stack_length),
        }
    }
}

/// Execute one complete tick of the simulation.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if a counter would overflow.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let tick = state.clock.tick();
    let population = &state.config.population;

    // --- Cycle ---
    let cycle = state
        .scheduler
        .cycle_all(&mut state.grid, &state.organism_config);

    // --- Cosmic ray ---
    let mutated = if state.clock.is_due(population.random_rate) {
        let pos = state.grid.mutate_random_cell(&mut state.rng);
        debug!(tick, %pos, "cosmic ray");
        Some(pos)
    } else {
        None
    };

    // --- Purge ---
    let mut culled = Vec::new();
    if state.clock.is_due(population.cycle_gap) {
        let ratio = state.grid.allocated_ratio();
        if ratio > population.memory_full_ratio {
            culled = state
                .scheduler
                .cull(&mut state.grid, population.kill_organisms_ratio);
            let purges = state.clock.record_purge()?;
            info!(
                tick,
                purges,
                culled = culled.len(),
                allocated_ratio = ratio,
                "population purged"
            );
        }
        debug!(
            tick,
            population = state.scheduler.len(),
            allocated_ratio = state.grid.allocated_ratio(),
            "population summary"
        );
    }

    // --- Advance ---
    state.clock.advance()?;

    let mut deaths = cycle.deaths;
    deaths.extend(culled.iter().map(|id| (*id, DeathCause::Culled)));

    Ok(TickSummary {
        tick,
        executed: cycle.executed,
        births: cycle.births,
        deaths,
        faults: cycle.faults,
        mutated,
        culled,
        population: state.scheduler.len(),
        allocated_ratio: state.grid.allocated_ratio(),
    })
}
