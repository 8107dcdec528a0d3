//! Operator control state shared between the runner and whatever drives it.
//!
//! A front end (terminal UI, dashboard, signal handler) never touches the
//! simulation directly. It submits [`OperatorIntent`]s and requests a
//! stop; the runner drains the queue between ticks.
//!
//! # Architecture
//!
//! Flags are atomics so the tick loop can read them without locking. The
//! intent queue sits behind a [`tokio::sync::Mutex`] and a [`Notify`] wakes
//! a paused runner whenever something arrives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::RunConfig;
use crate::snapshot::LoadSource;

/// Reason why the simulation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// An operator issued a stop command.
    OperatorStop,
    /// The roster is empty.
    Extinction,
}

/// A request from the operator, applied between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorIntent {
    /// Run exactly one tick while paused.
    Step,
    /// Pause a running simulation or resume a paused one.
    ToggleRun,
    /// Move the selection cursor forward.
    SelectNext,
    /// Move the selection cursor back.
    SelectPrevious,
    /// Save a snapshot now.
    Save,
    /// Replace the running state with a stored snapshot.
    Load(LoadSource),
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the simulation is currently paused.
    paused: AtomicBool,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the runner when paused and something changes.
    wake: Notify,

    /// Pause between ticks in milliseconds.
    tick_interval_ms: AtomicU64,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Intents waiting for the next gap between ticks.
    intents: Mutex<VecDeque<OperatorIntent>>,

    /// Reason the simulation ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create operator state from the driver loop configuration.
    pub fn new(run: &RunConfig) -> Self {
        Self {
            paused: AtomicBool::new(run.start_paused),
            stop_requested: AtomicBool::new(false),
            wake: Notify::new(),
            tick_interval_ms: AtomicU64::new(run.tick_interval_ms),
            max_ticks: run.max_ticks,
            intents: Mutex::new(VecDeque::new()),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Flip between paused and running. Returns the new paused flag.
    pub fn toggle_run(&self) -> bool {
        let was_paused = self.paused.fetch_xor(true, Ordering::AcqRel);
        if was_paused {
            self.wake.notify_one();
        }
        !was_paused
    }

    /// Wait until a resume, stop, or new intent arrives.
    pub async fn wait_for_wake(&self) {
        self.wake.notified().await;
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean simulation stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the simulation ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the simulation ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Returns `true` if `max_ticks > 0` and this run has executed at least
    /// that many ticks.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_ticks > 0 && ticks_run >= self.max_ticks
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Queue an intent for the next gap between ticks.
    pub async fn submit(&self, intent: OperatorIntent) {
        self.intents.lock().await.push_back(intent);
        self.wake.notify_one();
    }

    /// Take every queued intent in submission order.
    pub async fn drain_intents(&self) -> Vec<OperatorIntent> {
        let mut queue = self.intents.lock().await;
        queue.drain(..).collect()
    }
}
