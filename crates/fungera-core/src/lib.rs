//! Simulation clock, scheduler, global tick, and orchestration for Fungera.
//!
//! This crate owns the population queue and the global tick that drives
//! the simulation: cycle every organism, fire the cosmic ray, purge a
//! crowded grid, advance the clock.
//!
//! # Modules
//!
//! - [`clock`] -- Tick and purge counters with checked arithmetic.
//! - [`config`] -- Configuration loading from `fungera-config.yaml` into
//!   strongly-typed structs.
//! - [`operator`] -- Shared pause/stop flags and the operator intent queue.
//! - [`runner`] -- The async loop around [`tick::run_tick`].
//! - [`scheduler`] -- Live roster, selection cursor, culling.
//! - [`snapshot`] -- Snapshot shape and the [`SnapshotRepository`] trait.
//! - [`tick`] -- [`SimulationState`] and the global tick.
//!
//! [`SnapshotRepository`]: snapshot::SnapshotRepository
//! [`SimulationState`]: tick::SimulationState

pub mod clock;
pub mod config;
pub mod operator;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod tick;
