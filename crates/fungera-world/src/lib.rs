//! Shared memory for the Fungera simulation.
//!
//! This crate models the physical substrate organisms live in: a bounded
//! two-dimensional grid of opcodes with a parallel allocation bitmap, and
//! the genome files used to seed it.
//!
//! # Modules
//!
//! - [`grid`] -- [`Grid`]: cell reads/writes, region allocation, cosmic-ray
//!   mutation, and the compact serialized form used by snapshots.
//! - [`genome`] -- [`Genome`]: genome text parsing and the built-in seed.
//! - [`error`] -- Error types for bootstrapping world state.

pub mod error;
pub mod genome;
pub mod grid;

pub use error::WorldError;
pub use genome::{Genome, SEED_GENOME};
pub use grid::Grid;
