//! Simulation loop runner with operator controls.
//!
//! [`run_simulation`] drives [`run_tick`] and adds the control plane
//! around it:
//!
//! - **Intents**: queued operator requests are applied between ticks
//! - **Pause/step**: while paused, one tick runs per [`OperatorIntent::Step`]
//! - **Autosave**: a wall-clock timer whose interval grows after each save
//! - **Clean stop**: operator stop, `max_ticks`, or extinction
//!
//! Snapshot failures never end the run; they are logged and the running
//! state is left as it was.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::SnapshotConfig;
use crate::operator::{OperatorIntent, OperatorState, SimulationEndReason};
use crate::snapshot::{LoadSource, SnapshotRepository};
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Wall-clock autosave timer.
#[derive(Debug)]
struct Autosave {
    interval: Option<Duration>,
    growth: u32,
    due: Instant,
}

impl Autosave {
    fn new(config: &SnapshotConfig) -> Self {
        let interval = (config.autosave_interval_seconds > 0)
            .then(|| Duration::from_secs(config.autosave_interval_seconds));
        let now = Instant::now();
        Self {
            interval,
            growth: config.autosave_growth.max(1),
            due: interval.map_or(now, |i| now.checked_add(i).unwrap_or(now)),
        }
    }

    /// Whether a save is due now. Re-arms the timer with the grown interval.
    fn poll(&mut self) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let now = Instant::now();
        if now < self.due {
            return false;
        }
        let grown = interval.checked_mul(self.growth).unwrap_or(interval);
        self.interval = Some(grown);
        self.due = now.checked_add(grown).unwrap_or(now);
        true
    }
}

/// Save the current state, logging the outcome.
fn save_now<R: SnapshotRepository>(state: &SimulationState, repository: &R) {
    let snapshot = state.snapshot();
    match repository.save(&state.config.world.name, &snapshot) {
        Ok(path) => info!(tick = snapshot.tick, path = %path.display(), "snapshot saved"),
        Err(error) => warn!(tick = snapshot.tick, %error, "snapshot save failed"),
    }
}

/// Replace the running state with the snapshot `source` selects.
///
/// Any failure leaves the running state untouched.
pub fn load_into<R: SnapshotRepository>(
    state: &mut SimulationState,
    repository: &R,
    source: &LoadSource,
) -> bool {
    match repository.load(source) {
        Ok(Some(snapshot)) => match state.restore(snapshot) {
            Ok(()) => true,
            Err(error) => {
                warn!(?source, %error, "snapshot rejected");
                false
            }
        },
        Ok(None) => {
            info!(?source, "no snapshot to load");
            false
        }
        Err(error) => {
            warn!(?source, %error, "snapshot load failed");
            false
        }
    }
}

/// Counters and timers carried across ticks of one run.
#[derive(Debug)]
struct RunProgress {
    last_summary: Option<TickSummary>,
    total_ticks: u64,
    autosave: Autosave,
}

impl RunProgress {
    fn new(config: &SnapshotConfig) -> Self {
        Self {
            last_summary: None,
            total_ticks: 0,
            autosave: Autosave::new(config),
        }
    }
}

/// Execute one tick with its callback, autosave and end checks.
///
/// Returns the end reason once the run must stop.
fn tick_once<R: SnapshotRepository>(
    state: &mut SimulationState,
    operator: &OperatorState,
    repository: &R,
    callback: &mut dyn TickCallback,
    progress: &mut RunProgress,
) -> Result<Option<SimulationEndReason>, RunnerError> {
    // --- Execute tick ---
    let summary = tick::run_tick(state)?;
    progress.total_ticks = progress.total_ticks.saturating_add(1);

    // --- Notify callback ---
    callback.on_tick(&summary, state);

    if progress.autosave.poll() {
        save_now(state, repository);
    }

    let population = summary.population;
    let tick = summary.tick;
    progress.last_summary = Some(summary);

    // --- Check extinction ---
    if population == 0 {
        info!(tick, "All organisms dead -- extinction");
        return Ok(Some(SimulationEndReason::Extinction));
    }

    // --- Check tick limit (after tick) ---
    if operator.tick_limit_reached(progress.total_ticks) {
        info!(
            tick = state.clock.tick(),
            max_ticks = operator.max_ticks(),
            "Tick limit reached"
        );
        return Ok(Some(SimulationEndReason::MaxTicksReached));
    }

    Ok(None)
}

/// Apply queued intents in submission order.
///
/// A `Step` taken while paused runs its tick before the next intent is
/// applied. Continues with the number of ticks stepped, or breaks with
/// the end reason if a stepped tick ended the run.
async fn apply_intents<R: SnapshotRepository>(
    state: &mut SimulationState,
    operator: &OperatorState,
    repository: &R,
    callback: &mut dyn TickCallback,
    progress: &mut RunProgress,
) -> Result<ControlFlow<SimulationEndReason, u64>, RunnerError> {
    let mut steps = 0_u64;
    for intent in operator.drain_intents().await {
        match intent {
            OperatorIntent::Step => {
                if !operator.is_paused() {
                    continue;
                }
                if let Some(reason) = tick_once(state, operator, repository, callback, progress)? {
                    return Ok(ControlFlow::Break(reason));
                }
                steps = steps.saturating_add(1);
            }
            OperatorIntent::ToggleRun => {
                let paused = operator.toggle_run();
                info!(paused, tick = state.clock.tick(), "run toggled");
            }
            OperatorIntent::SelectNext => state.scheduler.select_next(),
            OperatorIntent::SelectPrevious => state.scheduler.select_previous(),
            OperatorIntent::Save => save_now(state, repository),
            OperatorIntent::Load(source) => {
                load_into(state, repository, &source);
            }
        }
    }
    Ok(ControlFlow::Continue(steps))
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation<R: SnapshotRepository>(
    state: &mut SimulationState,
    operator: &Arc<OperatorState>,
    repository: &R,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut progress = RunProgress::new(&state.config.snapshots);

    info!(
        name = %state.config.world.name,
        tick = state.clock.tick(),
        population = state.scheduler.len(),
        max_ticks = operator.max_ticks(),
        paused = operator.is_paused(),
        "Simulation starting"
    );

    loop {
        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return Ok(finish(operator, SimulationEndReason::OperatorStop, progress).await);
        }

        // --- Apply intents ---
        let steps = match apply_intents(state, operator, repository, callback, &mut progress)
            .await?
        {
            ControlFlow::Continue(steps) => steps,
            ControlFlow::Break(reason) => return Ok(finish(operator, reason, progress).await),
        };

        if operator.is_paused() {
            if steps == 0 {
                operator.wait_for_wake().await;
                continue;
            }
        } else if let Some(reason) =
            tick_once(state, operator, repository, callback, &mut progress)?
        {
            return Ok(finish(operator, reason, progress).await);
        }

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

async fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    progress: RunProgress,
) -> SimulationResult {
    operator.set_end_reason(reason.clone()).await;
    SimulationResult {
        end_reason: reason,
        final_summary: progress.last_summary,
        total_ticks: progress.total_ticks,
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_population = result.final_summary.as_ref().map(|s| s.population),
        "Simulation ended"
    );

    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use fungera_types::Opcode;
    use fungera_world::Genome;

    use super::*;
    use crate::config::{RunConfig, SimulationConfig};
    use crate::snapshot::{NoSnapshots, Snapshot};

    fn make_simulation_state() -> SimulationState {
        let mut config = SimulationConfig::default();
        config.world.memory_rows = 48;
        config.world.memory_cols = 48;
        config.snapshots.autosave_interval_seconds = 0;
        let mut state = SimulationState::new(config).unwrap();
        state.seed(&Genome::seed()).unwrap();
        state
    }

    fn operator(max_ticks: u64, start_paused: bool) -> Arc<OperatorState> {
        Arc::new(OperatorState::new(&RunConfig {
            max_ticks,
            tick_interval_ms: 0,
            start_paused,
        }))
    }

    /// Keeps saved snapshots in memory.
    #[derive(Default)]
    struct MemoryRepository {
        saved: Mutex<Vec<Snapshot>>,
    }

    impl SnapshotRepository for MemoryRepository {
        type Error = std::io::Error;

        fn save(&self, name: &str, snapshot: &Snapshot) -> Result<PathBuf, Self::Error> {
            self.saved.lock().unwrap().push(snapshot.clone());
            Ok(PathBuf::from(format!("{name}_cycle_{}", snapshot.tick)))
        }

        fn load(&self, source: &LoadSource) -> Result<Option<Snapshot>, Self::Error> {
            match source {
                LoadSource::Fresh => Ok(None),
                LoadSource::Latest => Ok(self.saved.lock().unwrap().last().cloned()),
                LoadSource::Path(_) => Err(std::io::Error::other("not found")),
            }
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = make_simulation_state();
        let op = operator(5, false);
        let result = run_simulation(&mut state, &op, &NoSnapshots, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(state.clock.tick(), 5);
        assert_eq!(op.end_reason().await, Some(SimulationEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn operator_stop() {
        let mut state = make_simulation_state();
        let op = operator(0, false);
        op.request_stop();
        let result = run_simulation(&mut state, &op, &NoSnapshots, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn extinction_stops_simulation() {
        let mut state = make_simulation_state();
        state.organism_config.organism_death_rate = 0;
        // Any fault now kills; `&` followed by `.` is a bad operand.
        let seed = state.scheduler.organisms().first().unwrap().clone();
        state.grid.write(seed.ip, Opcode::FindTemplate);
        state.grid.write(seed.ip_offset(1), Opcode::Dot);
        let op = operator(0, false);
        let result = run_simulation(&mut state, &op, &NoSnapshots, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::Extinction);
        assert_eq!(result.total_ticks, 1);
        assert_eq!(state.grid.allocated_count(), 0);
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountCallback {
            count: u64,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {
                self.count = self.count.saturating_add(1);
            }
        }

        let mut state = make_simulation_state();
        let op = operator(3, false);
        let mut cb = CountCallback { count: 0 };
        let _ = run_simulation(&mut state, &op, &NoSnapshots, &mut cb)
            .await
            .unwrap();

        assert_eq!(cb.count, 3);
    }

    #[tokio::test]
    async fn paused_runner_only_steps() {
        let mut state = make_simulation_state();
        let op = operator(0, true);
        op.submit(OperatorIntent::Step).await;
        op.submit(OperatorIntent::Step).await;
        let stopper = {
            let op = Arc::clone(&op);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                op.request_stop();
            })
        };
        let result = run_simulation(&mut state, &op, &NoSnapshots, &mut NoOpCallback)
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 2);
        assert_eq!(state.clock.tick(), 2);
    }

    #[tokio::test]
    async fn save_then_load_restores_state() {
        let mut state = make_simulation_state();
        let repo = MemoryRepository::default();
        let op = operator(0, true);
        let mut progress = RunProgress::new(&state.config.snapshots);
        tick::run_tick(&mut state).unwrap();
        tick::run_tick(&mut state).unwrap();

        op.submit(OperatorIntent::Save).await;
        let flow = apply_intents(&mut state, &op, &repo, &mut NoOpCallback, &mut progress)
            .await
            .unwrap();
        assert_eq!(flow, ControlFlow::Continue(0));
        let saved = repo.saved.lock().unwrap().last().cloned().unwrap();
        assert_eq!(saved.tick, 2);

        // The step runs first; the load then replaces its result.
        op.submit(OperatorIntent::Step).await;
        op.submit(OperatorIntent::Load(LoadSource::Latest)).await;
        let flow = apply_intents(&mut state, &op, &repo, &mut NoOpCallback, &mut progress)
            .await
            .unwrap();
        assert_eq!(flow, ControlFlow::Continue(1));
        assert_eq!(progress.total_ticks, 1);
        assert_eq!(state.clock.tick(), 2);
        assert_eq!(state.snapshot(), saved);
    }

    #[tokio::test]
    async fn step_then_save_saves_the_stepped_state() {
        let mut state = make_simulation_state();
        let repo = MemoryRepository::default();
        let op = operator(0, true);
        op.submit(OperatorIntent::Step).await;
        op.submit(OperatorIntent::Save).await;
        op.submit(OperatorIntent::Step).await;
        let stopper = {
            let op = Arc::clone(&op);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                op.request_stop();
            })
        };
        let result = run_simulation(&mut state, &op, &repo, &mut NoOpCallback)
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(result.total_ticks, 2);
        assert_eq!(state.clock.tick(), 2);
        let saved: Vec<u64> = repo.saved.lock().unwrap().iter().map(|s| s.tick).collect();
        assert_eq!(saved, vec![1]);
    }

    #[tokio::test]
    async fn step_is_ignored_while_running() {
        let mut state = make_simulation_state();
        let op = operator(0, false);
        let mut progress = RunProgress::new(&state.config.snapshots);
        op.submit(OperatorIntent::Step).await;
        let flow = apply_intents(&mut state, &op, &NoSnapshots, &mut NoOpCallback, &mut progress)
            .await
            .unwrap();
        assert_eq!(flow, ControlFlow::Continue(0));
        assert_eq!(state.clock.tick(), 0);
    }

    #[tokio::test]
    async fn stepped_tick_can_end_the_run() {
        let mut state = make_simulation_state();
        let op = operator(1, true);
        op.submit(OperatorIntent::Step).await;
        op.submit(OperatorIntent::Step).await;
        let result = run_simulation(&mut state, &op, &NoSnapshots, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 1);
        assert_eq!(result.final_summary.map(|s| s.tick), Some(0));
    }

    #[tokio::test]
    async fn failed_load_keeps_running_state() {
        let mut state = make_simulation_state();
        let before = state.snapshot();
        let repo = MemoryRepository::default();
        assert!(!load_into(&mut state, &repo, &LoadSource::Path(PathBuf::from("missing"))));
        assert!(!load_into(&mut state, &repo, &LoadSource::Latest));
        assert_eq!(state.snapshot(), before);
    }

    #[tokio::test]
    async fn cursor_intents_move_selection() {
        let mut state = make_simulation_state();
        let op = operator(0, true);
        op.submit(OperatorIntent::SelectNext).await;
        op.submit(OperatorIntent::SelectPrevious).await;
        op.submit(OperatorIntent::ToggleRun).await;
        let mut progress = RunProgress::new(&state.config.snapshots);
        apply_intents(&mut state, &op, &NoSnapshots, &mut NoOpCallback, &mut progress)
            .await
            .unwrap();
        assert_eq!(state.scheduler.selected_index(), Some(0));
        assert!(!op.is_paused());
    }

    #[test]
    fn autosave_disabled_never_fires() {
        let mut autosave = Autosave::new(&SnapshotConfig {
            autosave_interval_seconds: 0,
            ..SnapshotConfig::default()
        });
        assert!(!autosave.poll());
    }
}
