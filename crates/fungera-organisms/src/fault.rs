//! Per-instruction faults and the tri-state instruction outcome.
//!
//! Faults are ordinary values. They never abort a tick; the interpreter
//! turns each one into a single increment of the organism's error counter.

use fungera_types::Opcode;

/// Why an instruction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// An operand cell did not hold the kind of opcode the instruction needs.
    #[error("operand at offset {offset} is {found}, expected a register")]
    InvalidOperand {
        /// Offset from `ip` along the current direction.
        offset: i64,
        /// What was found there.
        found: Opcode,
    },

    /// `allocate_child` found no free region within its search range.
    #[error("no free region for a child")]
    NoSpace,

    /// `push` on a full stack.
    #[error("stack overflow (capacity {capacity})")]
    StackOverflow {
        /// Configured stack capacity.
        capacity: usize,
    },

    /// `pop` on an empty stack.
    #[error("stack underflow")]
    StackUnderflow,
}

/// Result of dispatching one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instruction took effect.
    Executed,
    /// The instruction had nothing to do (markers, unmatched templates,
    /// no staged child, a child size that is not positive).
    Idle,
    /// The instruction failed.
    Fault(Fault),
}

impl Outcome {
    /// Whether this outcome counts as an error.
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}
