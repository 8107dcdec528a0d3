//! The organism state record.
//!
//! This is the one and only representation of an organism. It is plain
//! data: the interpreter in `fungera-organisms` mutates it, the scheduler
//! in `fungera-core` owns it, and presentation code reads it through
//! [`crate::view::OrganismView`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::OrganismId;
use crate::registers::Registers;
use crate::vector::{Direction, Vec2};

/// One execution context on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Organism {
    /// Unique identifier.
    pub id: OrganismId,
    /// The organism whose `split_child` created this one.
    pub parent: Option<OrganismId>,
    /// Top-left corner of the owned region.
    pub start: Vec2,
    /// Extent of the owned region. Zeroed once the organism is released.
    pub size: Vec2,
    /// Instruction pointer.
    pub ip: Vec2,
    /// Current movement direction.
    pub direction: Direction,
    /// General-purpose registers.
    pub registers: Registers,
    /// Bounded value stack, bottom first.
    pub stack: Vec<Vec2>,
    /// Faults counted so far.
    pub errors: u64,
    /// Ticks since the last successful reproduction.
    pub stagnation: u64,
    /// Successful `split_child` calls.
    pub children: u64,
    /// Top-left corner of the staged child region.
    pub child_start: Vec2,
    /// Extent of the staged child region; zero when nothing is staged.
    pub child_size: Vec2,
    /// Presentation-only selection flag.
    pub is_selected: bool,
}

impl Organism {
    /// Create a fresh organism owning the region at `start` with extent `size`.
    ///
    /// The instruction pointer starts at `start`, moving right, with zeroed
    /// registers and an empty stack. Allocation of the region on the grid is
    /// the caller's job.
    pub fn new(start: Vec2, size: Vec2, parent: Option<OrganismId>) -> Self {
        Self {
            id: OrganismId::new(),
            parent,
            start,
            size,
            ip: start,
            direction: Direction::default(),
            registers: Registers::default(),
            stack: Vec::new(),
            errors: 0,
            stagnation: 0,
            children: 0,
            child_start: Vec2::ZERO,
            child_size: Vec2::ZERO,
            is_selected: false,
        }
    }

    /// Whether a child region is currently reserved.
    pub const fn has_staged_child(&self) -> bool {
        !self.child_size.is_zero()
    }

    /// The unit vector of the current direction.
    pub const fn delta(&self) -> Vec2 {
        self.direction.delta()
    }

    /// The address `offset` cells ahead of `ip` along the current direction.
    pub const fn ip_offset(&self, offset: i64) -> Vec2 {
        self.ip.offset(self.direction.delta(), offset)
    }

    /// Forget the staged child region without touching the grid.
    pub const fn clear_staged_child(&mut self) {
        self.child_start = Vec2::ZERO;
        self.child_size = Vec2::ZERO;
    }
}
