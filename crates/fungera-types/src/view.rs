//! Read-only presentation views.
//!
//! A renderer or dashboard never touches [`Organism`] directly; it receives
//! these snapshots, which are exported to `TypeScript` through `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::OrganismId;
use crate::organism::Organism;
use crate::registers::Registers;
use crate::vector::Vec2;

/// Summary of one organism, suitable for an info panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OrganismView {
    /// Organism identifier.
    pub id: OrganismId,
    /// Parent identifier, absent for the seed organism.
    pub parent: Option<OrganismId>,
    /// Fault count.
    pub errors: u64,
    /// Instruction pointer.
    pub ip: Vec2,
    /// Direction unit vector.
    pub delta: Vec2,
    /// Register values.
    pub registers: Registers,
    /// Stack slots bottom first, padded with `None` up to capacity.
    pub stack: Vec<Option<Vec2>>,
    /// Children produced so far.
    pub children: u64,
    /// Owned region corner.
    pub start: Vec2,
    /// Owned region extent.
    pub size: Vec2,
    /// Staged child corner.
    pub child_start: Vec2,
    /// Staged child extent.
    pub child_size: Vec2,
}

impl OrganismView {
    /// Build a view of `organism` with its stack padded to `stack_capacity`.
    pub fn new(organism: &Organism, stack_capacity: usize) -> Self {
        let padded = stack_capacity.max(organism.stack.len());
        let stack = organism
            .stack
            .iter()
            .copied()
            .map(Some)
            .chain(core::iter::repeat(None))
            .take(padded)
            .collect();
        Self {
            id: organism.id,
            parent: organism.parent,
            errors: organism.errors,
            ip: organism.ip,
            delta: organism.delta(),
            registers: organism.registers,
            stack,
            children: organism.children,
            start: organism.start,
            size: organism.size,
            child_start: organism.child_start,
            child_size: organism.child_size,
        }
    }
}

/// Population-level status line plus the selected organism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopulationView {
    /// Simulation name.
    pub name: String,
    /// Completed ticks.
    pub tick: u64,
    /// Culling passes performed.
    pub purges: u64,
    /// Live organisms.
    pub total: u64,
    /// Position of the selection cursor in the roster.
    pub selected_index: Option<u64>,
    /// The organism under the cursor.
    pub selected: Option<OrganismView>,
}
