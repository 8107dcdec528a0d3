//! Tick callback that logs a progress line every few ticks.

use fungera_core::runner::TickCallback;
use fungera_core::tick::{SimulationState, TickSummary};
use tracing::info;

/// Accumulates births and deaths between progress lines.
#[derive(Debug)]
pub struct ProgressCallback {
    every: u64,
    births: usize,
    deaths: usize,
    faults: u64,
}

impl ProgressCallback {
    /// Log every `every` ticks; 0 never logs.
    pub const fn new(every: u64) -> Self {
        Self {
            every,
            births: 0,
            deaths: 0,
            faults: 0,
        }
    }

    /// Counts gathered since the last progress line.
    #[cfg(test)]
    const fn pending(&self) -> (usize, usize, u64) {
        (self.births, self.deaths, self.faults)
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, sim: &SimulationState) {
        self.births = self.births.saturating_add(summary.births.len());
        self.deaths = self.deaths.saturating_add(summary.deaths.len());
        self.faults = self.faults.saturating_add(summary.faults);

        let completed = sim.clock.tick();
        if completed.checked_rem(self.every) != Some(0) {
            return;
        }
        let view = sim.population_view();
        info!(
            tick = completed,
            population = view.total,
            purges = view.purges,
            births = self.births,
            deaths = self.deaths,
            faults = self.faults,
            allocated_ratio = summary.allocated_ratio,
            "progress"
        );
        self.births = 0;
        self.deaths = 0;
        self.faults = 0;
    }
}
