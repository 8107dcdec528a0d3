//! Simulation clock: the tick counter and the purge counter.
//!
//! The tick number is the source of truth for every periodic action
//! (mutation cadence, culling cadence). Both counters use checked
//! arithmetic; running out of `u64` is reported, never wrapped.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Purge counter would overflow.
    #[error("purge counter overflow")]
    PurgeOverflow,
}

/// Tick and purge counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationClock {
    /// Completed ticks. The tick in progress sees the pre-increment value.
    tick: u64,

    /// Culling passes performed so far.
    purges: u64,
}

impl SimulationClock {
    /// A clock at tick 0 with no purges.
    pub const fn new() -> Self {
        Self { tick: 0, purges: 0 }
    }

    /// Restore a clock from persisted counters.
    pub const fn from_parts(tick: u64, purges: u64) -> Self {
        Self { tick, purges }
    }

    /// Advance by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Count one culling pass.
    pub fn record_purge(&mut self) -> Result<u64, ClockError> {
        self.purges = self
            .purges
            .checked_add(1)
            .ok_or(ClockError::PurgeOverflow)?;
        Ok(self.purges)
    }

    /// Current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Culling passes performed.
    pub const fn purges(&self) -> u64 {
        self.purges
    }

    /// Whether the current tick falls on an `every`-tick cadence.
    /// A zero cadence never fires.
    pub const fn is_due(&self, every: u64) -> bool {
        match self.tick.checked_rem(every) {
            Some(rem) => rem == 0,
            None => false,
        }
    }
}
