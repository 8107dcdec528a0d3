//! End-to-end runs of the global tick.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::collections::HashSet;

use fungera_core::clock::SimulationClock;
use fungera_core::config::SimulationConfig;
use fungera_core::tick::{SimulationState, run_tick};
use fungera_organisms::spawn;
use fungera_types::{Opcode, Vec2};
use fungera_world::Genome;

/// One row, read left to right:
///
/// ```text
/// 1a     a = (1, 1)
/// -a     a = (2, 2)
/// @ab    stage a 2x2 child, b = its corner
/// Lcd    d = vector of the cell at c (0, 0)
/// Wbd    write d at b
/// -yb    b moves one column right
/// -yc    c moves one column right
/// Lcd    d = vector of the cell at c (0, 1)
/// Wbd    write d at b
/// $      split
/// ```
const REPLICATOR: &str = "1a-a@abLcdWbd-yb-ycLcdWbd$";

fn state(rows: usize, cols: usize) -> SimulationState {
    let mut config = SimulationConfig::default();
    config.world.memory_rows = rows;
    config.world.memory_cols = cols;
    config.population.random_rate = u64::MAX;
    SimulationState::new(config).unwrap()
}

#[test]
fn parent_stages_writes_and_splits_a_child() {
    let mut state = state(20, 40);
    let genome = Genome::parse(REPLICATOR).unwrap();
    state.grid.load_genome(&genome, Vec2::ZERO).unwrap();
    let parent = spawn(&mut state.grid, Vec2::ZERO, genome.size(), None);
    let parent_id = parent.id;
    state.scheduler.add_organism(parent);
    // Skip tick 0 so no cosmic ray fires during the scenario.
    state.clock = SimulationClock::from_parts(1, 0);

    let mut births = Vec::new();
    for _ in 0..REPLICATOR.len() {
        let summary = run_tick(&mut state).unwrap();
        assert_eq!(summary.faults, 0);
        births.extend(summary.births);
    }

    assert_eq!(births.len(), 1);
    assert_eq!(state.scheduler.len(), 2);
    let parent = &state.scheduler.organisms()[0];
    let child = &state.scheduler.organisms()[1];
    assert_eq!(parent.id, parent_id);
    assert_eq!(parent.children, 1);
    assert!(!parent.has_staged_child());
    assert_eq!(child.parent, Some(parent_id));
    assert_eq!(child.id, births[0]);

    // The first free 2x2 region along the row starts just past the parent.
    assert_eq!(child.start, Vec2::new(0, 26));
    assert_eq!(child.size, Vec2::new(2, 2));
    assert_eq!(child.ip, child.start);

    let copied = |source: Opcode| Opcode::from_vector(source.vector());
    assert_eq!(state.grid.read(Vec2::new(0, 26)), copied(Opcode::One));
    assert_eq!(state.grid.read(Vec2::new(0, 27)), copied(Opcode::RegA));
    assert_eq!(state.grid.allocated_count(), 26 + 4);
    assert_eq!(state.scheduler.archive().len(), 2);
}

#[test]
fn allocation_always_matches_live_regions() {
    let mut state = state(64, 64);
    state.config.population.random_rate = 7;
    state.seed(&Genome::seed()).unwrap();

    for _ in 0..1500 {
        run_tick(&mut state).unwrap();

        let mut expected = HashSet::new();
        for org in state.scheduler.organisms() {
            let mut regions = vec![(org.start, org.size)];
            if org.has_staged_child() {
                regions.push((org.child_start, org.child_size));
            }
            for (start, size) in regions {
                for r in 0..size.row {
                    for c in 0..size.col {
                        expected.insert((start.row + r, start.col + c));
                    }
                }
            }
        }
        assert_eq!(state.grid.allocated_count(), expected.len());
        for (row, col) in expected {
            assert!(state.grid.is_allocated(Vec2::new(row, col)));
        }
        if state.scheduler.is_empty() {
            break;
        }
    }
}
