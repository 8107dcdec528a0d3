//! Organism execution and lifecycle for the Fungera simulation.
//!
//! This crate is the logic layer for organisms: everything that operates on
//! an [`Organism`] and the [`Grid`] without touching the roster, the clock,
//! or I/O. It sits between `fungera-types`/`fungera-world` and the core
//! scheduler.
//!
//! # Modules
//!
//! - [`config`] -- Interpreter and death-threshold parameters ([`OrganismConfig`])
//! - [`death`] -- Death conditions ([`DeathCause`])
//! - [`fault`] -- Per-instruction faults and outcomes ([`Fault`], [`Outcome`])
//! - [`interpreter`] -- One-instruction-per-tick execution ([`cycle`])
//! - [`lifecycle`] -- Spawning and releasing organisms on the grid
//!
//! [`Organism`]: fungera_types::Organism
//! [`Grid`]: fungera_world::Grid

pub mod config;
pub mod death;
pub mod fault;
pub mod interpreter;
pub mod lifecycle;

pub use config::OrganismConfig;
pub use death::{DeathCause, check_death};
pub use fault::{Fault, Outcome};
pub use interpreter::{CycleReport, cycle};
pub use lifecycle::{release, spawn};
