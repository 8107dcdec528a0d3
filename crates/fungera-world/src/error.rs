//! Error types for the `fungera-world` crate.
//!
//! Grid memory operations themselves never fail: out-of-bounds reads and
//! writes are defined no-ops. Errors only arise when bootstrapping the grid
//! from external input (genome files, persisted grids).

use fungera_types::Vec2;

/// Errors that can occur while building or loading world state.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A genome or grid row contains a character outside the opcode alphabet.
    #[error("unknown opcode {symbol:?} at line {line}, column {column}")]
    UnknownOpcode {
        /// The offending character.
        symbol: char,
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        column: usize,
    },

    /// The genome text contains no non-blank lines.
    #[error("genome is empty")]
    EmptyGenome,

    /// The genome does not fit inside the grid at the requested address.
    #[error("genome of size {size} does not fit at {address}")]
    GenomeOutOfBounds {
        /// Requested top-left corner.
        address: Vec2,
        /// Genome extent.
        size: Vec2,
    },

    /// A persisted grid has inconsistent dimensions.
    #[error("malformed grid: {0}")]
    MalformedGrid(String),

    /// Grid dimensions must both be positive.
    #[error("invalid grid dimensions {rows}x{cols}")]
    InvalidDimensions {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// Reading a genome file failed.
    #[error("failed to read genome file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
