//! Tunable parameters for organism execution and lifecycle.
//!
//! The core crate builds an [`OrganismConfig`] from the `organisms` section
//! of `fungera-config.yaml`; tests construct it directly.

/// Hard cap on how far `find_template` and `allocate_child` scan ahead.
pub const DEFAULT_SEARCH_LIMIT: i64 = 100;

/// Configuration for the interpreter and the death checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganismConfig {
    /// Stack capacity per organism (default: 8).
    pub stack_length: usize,

    /// An organism whose error count exceeds this dies (default: 100).
    pub organism_death_rate: u64,

    /// An organism that has not reproduced for more than this many ticks
    /// dies (default: 25000).
    pub kill_if_no_child: u64,

    /// Distance from its own `start` beyond which executing unallocated
    /// code counts as a fault. Zero disables the penalty (default: 100).
    pub penalize_parasitism: u64,

    /// Upper bound on scan offsets (default: 100).
    pub search_limit: i64,
}

impl Default for OrganismConfig {
    fn default() -> Self {
        Self {
            stack_length: 8,
            organism_death_rate: 100,
            kill_if_no_child: 25_000,
            penalize_parasitism: 100,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}
