//! The population queue: live roster, selection cursor, lineage archive.
//!
//! # Ordering
//!
//! The roster is kept in creation order; children are appended at the end.
//! [`Scheduler::cycle_all`] fixes the number of organisms to run before it
//! starts, so children born during a pass wait for the next tick, and
//! organisms that die mid-pass are removed in place and never revisited.
//!
//! # Culling
//!
//! [`Scheduler::cull`] stable-sorts the roster worst-first by error count
//! and kills `max(1, floor(n * ratio))` organisms from the front. Ties keep
//! their roster order. Survivors stay in the sorted order.

use fungera_organisms::{DeathCause, OrganismConfig, cycle, release};
use fungera_types::{Organism, OrganismId, OrganismView};
use fungera_world::Grid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What one pass over the roster did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Organisms that executed an instruction.
    pub executed: usize,
    /// Children created, in creation order.
    pub births: Vec<OrganismId>,
    /// Organisms that died, with their cause.
    pub deaths: Vec<(OrganismId, DeathCause)>,
    /// Errors added across the roster.
    pub faults: u64,
}

/// Live organisms plus selection cursor and lineage archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    organisms: Vec<Organism>,
    selected: Option<usize>,
    archive: Vec<Organism>,
}

impl Scheduler {
    /// An empty roster.
    pub const fn new() -> Self {
        Self {
            organisms: Vec::new(),
            selected: None,
            archive: Vec::new(),
        }
    }

    /// Append a newly created organism and record it in the archive.
    ///
    /// The first organism added to an empty roster becomes selected.
    pub fn add_organism(&mut self, organism: Organism) {
        self.organisms.push(organism);
        if self.selected.is_none() {
            self.sync_selection(Some(0));
        }
        if let Some(added) = self.organisms.last() {
            self.archive.push(added.clone());
        }
    }

    /// Live organisms in roster order.
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    /// Every organism ever created fresh, captured at creation.
    pub fn archive(&self) -> &[Organism] {
        &self.archive
    }

    /// Number of live organisms.
    pub const fn len(&self) -> usize {
        self.organisms.len()
    }

    /// Whether the roster is empty.
    pub const fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Cursor position.
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// The organism under the cursor.
    pub fn selected(&self) -> Option<&Organism> {
        self.selected.and_then(|i| self.organisms.get(i))
    }

    /// Presentation view of the selected organism.
    pub fn selected_view(&self, stack_capacity: usize) -> Option<OrganismView> {
        self.selected()
            .map(|organism| OrganismView::new(organism, stack_capacity))
    }

    /// Move the cursor one organism forward, if there is one.
    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            let next = i.saturating_add(1);
            if next < self.organisms.len() {
                self.sync_selection(Some(next));
            }
        }
    }

    /// Move the cursor one organism back, if there is one.
    pub fn select_previous(&mut self) {
        if let Some(previous) = self.selected.and_then(|i| i.checked_sub(1)) {
            self.sync_selection(Some(previous));
        }
    }

    /// Clamp the cursor to the roster and make `is_selected` agree with it.
    fn sync_selection(&mut self, desired: Option<usize>) {
        let last = self.organisms.len().checked_sub(1);
        self.selected = match (desired, last) {
            (Some(i), Some(last)) => Some(i.min(last)),
            _ => None,
        };
        for (i, organism) in self.organisms.iter_mut().enumerate() {
            organism.is_selected = Some(i) == self.selected;
        }
    }

    /// Remove the organism at `index`, keeping the cursor on the same
    /// survivor where possible.
    fn remove_at(&mut self, index: usize) -> Option<Organism> {
        if index >= self.organisms.len() {
            return None;
        }
        let removed = self.organisms.remove(index);
        let desired = self
            .selected
            .map(|s| if s > index { s.saturating_sub(1) } else { s });
        self.sync_selection(desired);
        Some(removed)
    }

    /// Run one instruction for every organism alive at the start of the pass.
    pub fn cycle_all(&mut self, grid: &mut Grid, config: &OrganismConfig) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let mut remaining = self.organisms.len();
        let mut index = 0_usize;

        while remaining > 0 {
            remaining = remaining.saturating_sub(1);
            let Some(organism) = self.organisms.get_mut(index) else {
                break;
            };
            let id = organism.id;
            let report = cycle(organism, grid, config);
            summary.executed = summary.executed.saturating_add(1);
            summary.faults = summary.faults.saturating_add(report.faults());

            if let Some(child) = report.child {
                debug!(
                    parent_id = %id,
                    child_id = %child.id,
                    start = %child.start,
                    size = %child.size,
                    "organism born"
                );
                summary.births.push(child.id);
                self.add_organism(child);
            }

            if let Some(cause) = report.death {
                debug!(organism_id = %id, %cause, "organism died");
                summary.deaths.push((id, cause));
                self.remove_at(index);
            } else {
                index = index.saturating_add(1);
            }
        }
        summary
    }

    /// Kill the worst `max(1, floor(n * ratio))` organisms by error count.
    ///
    /// Returns the ids of the killed organisms, worst first.
    pub fn cull(&mut self, grid: &mut Grid, ratio: f64) -> Vec<OrganismId> {
        if self.organisms.is_empty() {
            return Vec::new();
        }
        let selected_id = self.selected().map(|o| o.id);
        self.organisms.sort_by(|a, b| b.errors.cmp(&a.errors));

        let count = cull_count(self.organisms.len(), ratio);
        let mut killed = Vec::with_capacity(count);
        for mut organism in self.organisms.drain(..count) {
            release(&mut organism, grid);
            killed.push(organism.id);
        }

        let desired = selected_id
            .and_then(|id| self.organisms.iter().position(|o| o.id == id))
            .or(self.selected);
        self.sync_selection(desired);
        killed
    }
}

/// `max(1, floor(n * ratio))`, never more than `n`.
fn cull_count(n: usize, ratio: f64) -> usize {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::arithmetic_side_effects
    )]
    let scaled = (n as f64 * ratio.clamp(0.0, 1.0)).floor() as usize;
    scaled.clamp(1, n.max(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use fungera_organisms::spawn;
    use fungera_types::{Opcode, Vec2};

    use super::*;

    fn grid() -> Grid {
        Grid::new(40, 40).unwrap()
    }

    /// Spawn `n` 1x2 organisms on row `2 * i`, with `errors[i]` errors.
    fn populated(grid: &mut Grid, errors: &[u64]) -> Scheduler {
        let mut scheduler = Scheduler::new();
        for (i, e) in errors.iter().enumerate() {
            let row = i64::try_from(i).unwrap() * 2;
            let mut org = spawn(grid, Vec2::new(row, 0), Vec2::new(1, 2), None);
            org.errors = *e;
            scheduler.add_organism(org);
        }
        scheduler
    }

    #[test]
    fn first_organism_is_selected_and_archived() {
        let mut g = grid();
        let s = populated(&mut g, &[0, 0, 0]);
        assert_eq!(s.selected_index(), Some(0));
        assert!(s.organisms()[0].is_selected);
        assert!(!s.organisms()[1].is_selected);
        assert_eq!(s.archive().len(), 3);
    }

    #[test]
    fn cursor_moves_within_bounds() {
        let mut g = grid();
        let mut s = populated(&mut g, &[0, 0]);
        s.select_previous();
        assert_eq!(s.selected_index(), Some(0));
        s.select_next();
        assert_eq!(s.selected_index(), Some(1));
        assert!(s.organisms()[1].is_selected && !s.organisms()[0].is_selected);
        s.select_next();
        assert_eq!(s.selected_index(), Some(1));
        s.select_previous();
        assert_eq!(s.selected_index(), Some(0));
    }

    #[test]
    fn cursor_on_empty_roster_is_none() {
        let mut s = Scheduler::new();
        s.select_next();
        s.select_previous();
        assert_eq!(s.selected_index(), None);
        assert!(s.selected().is_none());
    }

    #[test]
    fn cull_removes_worst_with_stable_ties() {
        let mut g = grid();
        let mut s = populated(&mut g, &[1, 5, 3, 5, 0, 2, 0, 0, 0, 0]);
        let ids: Vec<OrganismId> = s.organisms().iter().map(|o| o.id).collect();

        let killed = s.cull(&mut g, 0.3);
        // floor(10 * 0.3) = 3: both 5s in roster order, then the 3.
        assert_eq!(killed, vec![ids[1], ids[3], ids[2]]);
        assert_eq!(s.len(), 7);
        let errors: Vec<u64> = s.organisms().iter().map(|o| o.errors).collect();
        assert_eq!(errors, vec![2, 1, 0, 0, 0, 0, 0]);
        assert_eq!(g.allocated_count(), 7 * 2);
    }

    #[test]
    fn cull_kills_at_least_one() {
        let mut g = grid();
        let mut s = populated(&mut g, &[0, 4]);
        let killed = s.cull(&mut g, 0.3);
        assert_eq!(killed.len(), 1);
        assert_eq!(s.organisms()[0].errors, 0);
    }

    #[test]
    fn cull_clamps_cursor() {
        let mut g = grid();
        let mut s = populated(&mut g, &[9, 9, 9]);
        s.select_next();
        s.select_next();
        s.cull(&mut g, 1.0);
        assert!(s.is_empty());
        assert_eq!(s.selected_index(), None);

        let mut s = populated(&mut g, &[0, 0, 7]);
        s.select_next();
        s.select_next();
        s.cull(&mut g, 0.3);
        assert_eq!(s.selected_index(), Some(1));
        assert!(s.organisms()[1].is_selected);
    }

    #[test]
    fn cull_count_rounds_down_with_floor_of_one() {
        assert_eq!(cull_count(10, 0.3), 3);
        assert_eq!(cull_count(3, 0.3), 1);
        assert_eq!(cull_count(1, 0.0), 1);
        assert_eq!(cull_count(7, 1.0), 7);
    }

    #[test]
    fn children_do_not_run_in_their_birth_tick() {
        let mut g = grid();
        let mut s = Scheduler::new();
        g.write(Vec2::new(0, 0), Opcode::SplitChild);
        let mut parent = spawn(&mut g, Vec2::ZERO, Vec2::new(1, 1), None);
        parent.child_start = Vec2::new(10, 10);
        parent.child_size = Vec2::new(1, 1);
        g.allocate(parent.child_start, parent.child_size);
        // The child's own cell would turn it downward if it ran.
        g.write(Vec2::new(10, 10), Opcode::MoveDown);
        s.add_organism(parent);

        let summary = s.cycle_all(&mut g, &OrganismConfig::default());
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.births.len(), 1);
        assert_eq!(s.len(), 2);
        let child = &s.organisms()[1];
        assert_eq!(child.ip, Vec2::new(10, 10));
        assert_eq!(child.stagnation, 0);

        let summary = s.cycle_all(&mut g, &OrganismConfig::default());
        assert_eq!(summary.executed, 2);
        assert_eq!(s.organisms()[1].ip, Vec2::new(11, 10));
    }

    #[test]
    fn dead_organisms_leave_the_roster_mid_pass() {
        let mut g = grid();
        let mut s = populated(&mut g, &[0, 500, 0]);
        let ids: Vec<OrganismId> = s.organisms().iter().map(|o| o.id).collect();
        s.select_next();
        s.select_next();

        let summary = s.cycle_all(&mut g, &OrganismConfig::default());
        assert_eq!(summary.executed, 3);
        assert_eq!(summary.deaths, vec![(ids[1], DeathCause::Errors)]);
        assert_eq!(s.len(), 2);
        assert_eq!(g.allocated_count(), 4);
        // The cursor follows the organism it was on.
        assert_eq!(s.selected().map(|o| o.id), Some(ids[2]));
    }

    #[test]
    fn allocation_matches_live_regions() {
        let mut g = grid();
        let mut s = populated(&mut g, &[0, 0, 0, 0]);
        s.cull(&mut g, 0.5);
        let expected: usize = s
            .organisms()
            .iter()
            .map(|o| usize::try_from(o.size.row * o.size.col).unwrap())
            .sum();
        assert_eq!(g.allocated_count(), expected);
    }

    #[test]
    fn scheduler_serde_roundtrip() {
        let mut g = grid();
        let mut s = populated(&mut g, &[1, 2]);
        s.select_next();
        let json = serde_json::to_string(&s).unwrap();
        let back: Scheduler = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
