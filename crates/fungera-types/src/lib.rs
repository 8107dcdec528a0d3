//! Shared type definitions for the Fungera simulation.
//!
//! This crate is the single source of truth for the values that flow
//! between the grid, the interpreter, the scheduler and any presentation
//! surface. Types that a dashboard consumes are exported to `TypeScript`
//! via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`vector`] -- `[row, column]` vectors and cardinal directions
//! - [`instruction`] -- The fixed 25-opcode instruction table
//! - [`registers`] -- The four named registers
//! - [`organism`] -- The organism state record
//! - [`view`] -- Read-only presentation views

pub mod ids;
pub mod instruction;
pub mod organism;
pub mod registers;
pub mod vector;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use ids::OrganismId;
pub use instruction::{ALPHABET_SIZE, Opcode, Operation, UnknownOpcode};
pub use organism::Organism;
pub use registers::{Register, Registers};
pub use vector::{Component, Direction, Vec2};
pub use view::{OrganismView, PopulationView};
