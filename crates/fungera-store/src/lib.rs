//! Snapshot persistence for the Fungera simulation.
//!
//! Implements [`SnapshotRepository`] over a directory of JSON files. The
//! core decides when to save and what to load; this crate only knows file
//! names, encoding, and which file is newest.
//!
//! # Modules
//!
//! - [`file_store`] -- [`FileSnapshotStore`] and the on-disk envelope
//! - [`error`] -- Shared error types
//!
//! [`SnapshotRepository`]: fungera_core::snapshot::SnapshotRepository

pub mod error;
pub mod file_store;

pub use error::StoreError;
pub use file_store::{FileSnapshotStore, SNAPSHOT_EXTENSION, SnapshotEnvelope};
