//! The instruction table: opcode characters, opcode vectors, and operations.
//!
//! The alphabet is closed: exactly [`ALPHABET_SIZE`] opcodes exist, listed
//! in [`Opcode::ALL`] in their fixed enumeration order. That order matters
//! because writes into the grid reduce an arbitrary vector to an opcode by
//! indexing the alphabet with `vector.row mod ALPHABET_SIZE`.
//!
//! Every opcode carries a 2-component opcode vector. The vector is what an
//! organism sees when it loads code as data (`L`). Writing (`W`) keeps only
//! the first component, so a copied cell becomes the opcode at
//! `row mod ALPHABET_SIZE`: `L` loads `(7, 0)` and is written back as `y`.
//!
//! | Opcode | Vector | Operation        |
//! |--------|--------|------------------|
//! | `.`    | 0,0    | `no_operation`   |
//! | `:`    | 0,1    | `no_operation`   |
//! | `a`    | 1,0    | `no_operation`   |
//! | `b`    | 1,1    | `no_operation`   |
//! | `c`    | 1,2    | `no_operation`   |
//! | `d`    | 1,3    | `no_operation`   |
//! | `x`    | 2,0    | `no_operation`   |
//! | `y`    | 2,1    | `no_operation`   |
//! | `^`    | 3,0    | `move_up`        |
//! | `v`    | 3,1    | `move_down`      |
//! | `>`    | 3,2    | `move_right`     |
//! | `<`    | 3,3    | `move_left`      |
//! | `&`    | 4,0    | `find_template`  |
//! | `?`    | 5,0    | `if_not_zero`    |
//! | `1`    | 6,0    | `one`            |
//! | `0`    | 6,1    | `zero`           |
//! | `-`    | 6,2    | `increment`      |
//! | `+`    | 6,3    | `decrement`      |
//! | `~`    | 6,4    | `subtract`       |
//! | `L`    | 7,0    | `load_inst`      |
//! | `W`    | 7,1    | `write_inst`     |
//! | `@`    | 7,2    | `allocate_child` |
//! | `$`    | 7,3    | `split_child`    |
//! | `S`    | 8,0    | `push`           |
//! | `P`    | 8,1    | `pop`            |

use serde::{Deserialize, Serialize};

use crate::registers::Register;
use crate::vector::{Component, Vec2};

/// Number of opcodes in the closed alphabet.
pub const ALPHABET_SIZE: usize = 25;

/// A character that is not part of the opcode alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown opcode character {0:?}")]
pub struct UnknownOpcode(pub char);

/// One cell of instruction memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Opcode {
    /// `.` -- template marker, also the value of empty memory.
    #[default]
    Dot,
    /// `:` -- template marker.
    Colon,
    /// `a` -- names register `a`.
    RegA,
    /// `b` -- names register `b`.
    RegB,
    /// `c` -- names register `c`.
    RegC,
    /// `d` -- names register `d`.
    RegD,
    /// `x` -- selects the first vector component.
    SelectX,
    /// `y` -- selects the second vector component.
    SelectY,
    /// `^`
    MoveUp,
    /// `v`
    MoveDown,
    /// `>`
    MoveRight,
    /// `<`
    MoveLeft,
    /// `&`
    FindTemplate,
    /// `?`
    IfNotZero,
    /// `1`
    One,
    /// `0`
    Zero,
    /// `-`
    Increment,
    /// `+`
    Decrement,
    /// `~`
    Subtract,
    /// `L`
    LoadInst,
    /// `W`
    WriteInst,
    /// `@`
    AllocateChild,
    /// `$`
    SplitChild,
    /// `S`
    Push,
    /// `P`
    Pop,
}

/// The semantic operation an opcode dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Does nothing (markers, register names, selectors).
    NoOperation,
    /// Set direction to up.
    MoveUp,
    /// Set direction to down.
    MoveDown,
    /// Set direction to right.
    MoveRight,
    /// Set direction to left.
    MoveLeft,
    /// Complementary-marker address search.
    FindTemplate,
    /// Conditional one-or-two-cell skip.
    IfNotZero,
    /// Set a register to `(1, 1)`.
    One,
    /// Set a register to `(0, 0)`.
    Zero,
    /// Add one to a register or component.
    Increment,
    /// Subtract one from a register or component.
    Decrement,
    /// `reg3 := reg1 - reg2`.
    Subtract,
    /// Read an opcode vector from memory into a register.
    LoadInst,
    /// Write a register as an opcode into memory.
    WriteInst,
    /// Reserve a region for a child.
    AllocateChild,
    /// Turn the reserved region into a new organism.
    SplitChild,
    /// Push a register onto the stack.
    Push,
    /// Pop the stack into a register.
    Pop,
}

impl Opcode {
    /// Every opcode in the fixed enumeration order.
    pub const ALL: [Self; ALPHABET_SIZE] = [
        Self::Dot,
        Self::Colon,
        Self::RegA,
        Self::RegB,
        Self::RegC,
        Self::RegD,
        Self::SelectX,
        Self::SelectY,
        Self::MoveUp,
        Self::MoveDown,
        Self::MoveRight,
        Self::MoveLeft,
        Self::FindTemplate,
        Self::IfNotZero,
        Self::One,
        Self::Zero,
        Self::Increment,
        Self::Decrement,
        Self::Subtract,
        Self::LoadInst,
        Self::WriteInst,
        Self::AllocateChild,
        Self::SplitChild,
        Self::Push,
        Self::Pop,
    ];

    /// The opcode stored in memory that has never been written.
    pub const EMPTY: Self = Self::Dot;

    /// The character this opcode is written as.
    pub const fn symbol(self) -> char {
        match self {
            Self::Dot => '.',
            Self::Colon => ':',
            Self::RegA => 'a',
            Self::RegB => 'b',
            Self::RegC => 'c',
            Self::RegD => 'd',
            Self::SelectX => 'x',
            Self::SelectY => 'y',
            Self::MoveUp => '^',
            Self::MoveDown => 'v',
            Self::MoveRight => '>',
            Self::MoveLeft => '<',
            Self::FindTemplate => '&',
            Self::IfNotZero => '?',
            Self::One => '1',
            Self::Zero => '0',
            Self::Increment => '-',
            Self::Decrement => '+',
            Self::Subtract => '~',
            Self::LoadInst => 'L',
            Self::WriteInst => 'W',
            Self::AllocateChild => '@',
            Self::SplitChild => '$',
            Self::Push => 'S',
            Self::Pop => 'P',
        }
    }

    /// Parse an opcode character.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        let op = match symbol {
            '.' => Self::Dot,
            ':' => Self::Colon,
            'a' => Self::RegA,
            'b' => Self::RegB,
            'c' => Self::RegC,
            'd' => Self::RegD,
            'x' => Self::SelectX,
            'y' => Self::SelectY,
            '^' => Self::MoveUp,
            'v' => Self::MoveDown,
            '>' => Self::MoveRight,
            '<' => Self::MoveLeft,
            '&' => Self::FindTemplate,
            '?' => Self::IfNotZero,
            '1' => Self::One,
            '0' => Self::Zero,
            '-' => Self::Increment,
            '+' => Self::Decrement,
            '~' => Self::Subtract,
            'L' => Self::LoadInst,
            'W' => Self::WriteInst,
            '@' => Self::AllocateChild,
            '$' => Self::SplitChild,
            'S' => Self::Push,
            'P' => Self::Pop,
            _ => return None,
        };
        Some(op)
    }

    /// The opcode vector: what `load_inst` places into a register.
    pub const fn vector(self) -> Vec2 {
        let (row, col) = match self {
            Self::Dot => (0, 0),
            Self::Colon => (0, 1),
            Self::RegA => (1, 0),
            Self::RegB => (1, 1),
            Self::RegC => (1, 2),
            Self::RegD => (1, 3),
            Self::SelectX => (2, 0),
            Self::SelectY => (2, 1),
            Self::MoveUp => (3, 0),
            Self::MoveDown => (3, 1),
            Self::MoveRight => (3, 2),
            Self::MoveLeft => (3, 3),
            Self::FindTemplate => (4, 0),
            Self::IfNotZero => (5, 0),
            Self::One => (6, 0),
            Self::Zero => (6, 1),
            Self::Increment => (6, 2),
            Self::Decrement => (6, 3),
            Self::Subtract => (6, 4),
            Self::LoadInst => (7, 0),
            Self::WriteInst => (7, 1),
            Self::AllocateChild => (7, 2),
            Self::SplitChild => (7, 3),
            Self::Push => (8, 0),
            Self::Pop => (8, 1),
        };
        Vec2::new(row, col)
    }

    /// The operation this opcode dispatches to.
    pub const fn operation(self) -> Operation {
        match self {
            Self::Dot
            | Self::Colon
            | Self::RegA
            | Self::RegB
            | Self::RegC
            | Self::RegD
            | Self::SelectX
            | Self::SelectY => Operation::NoOperation,
            Self::MoveUp => Operation::MoveUp,
            Self::MoveDown => Operation::MoveDown,
            Self::MoveRight => Operation::MoveRight,
            Self::MoveLeft => Operation::MoveLeft,
            Self::FindTemplate => Operation::FindTemplate,
            Self::IfNotZero => Operation::IfNotZero,
            Self::One => Operation::One,
            Self::Zero => Operation::Zero,
            Self::Increment => Operation::Increment,
            Self::Decrement => Operation::Decrement,
            Self::Subtract => Operation::Subtract,
            Self::LoadInst => Operation::LoadInst,
            Self::WriteInst => Operation::WriteInst,
            Self::AllocateChild => Operation::AllocateChild,
            Self::SplitChild => Operation::SplitChild,
            Self::Push => Operation::Push,
            Self::Pop => Operation::Pop,
        }
    }

    /// Reduce an arbitrary vector to an opcode: `vector.row mod ALPHABET_SIZE`
    /// indexes [`Opcode::ALL`]. Negative values wrap to the positive range.
    pub fn from_vector(vector: Vec2) -> Self {
        let size = i64::try_from(ALPHABET_SIZE).unwrap_or(i64::MAX);
        let index = usize::try_from(vector.row.rem_euclid(size)).unwrap_or(0);
        Self::ALL.get(index).copied().unwrap_or(Self::EMPTY)
    }

    /// Whether this is one of the two template markers (`.` or `:`).
    pub const fn is_marker(self) -> bool {
        matches!(self, Self::Dot | Self::Colon)
    }

    /// The complementary marker: `.` <-> `:`. `None` for non-markers.
    pub const fn complement(self) -> Option<Self> {
        match self {
            Self::Dot => Some(Self::Colon),
            Self::Colon => Some(Self::Dot),
            _ => None,
        }
    }

    /// The register this opcode names, if any.
    pub const fn register(self) -> Option<Register> {
        match self {
            Self::RegA => Some(Register::A),
            Self::RegB => Some(Register::B),
            Self::RegC => Some(Register::C),
            Self::RegD => Some(Register::D),
            _ => None,
        }
    }

    /// The vector component this opcode selects, if any.
    pub const fn component(self) -> Option<Component> {
        match self {
            Self::SelectX => Some(Component::First),
            Self::SelectY => Some(Component::Second),
            _ => None,
        }
    }
}

impl From<Opcode> for char {
    fn from(op: Opcode) -> Self {
        op.symbol()
    }
}

impl TryFrom<char> for Opcode {
    type Error = UnknownOpcode;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        Self::from_symbol(symbol).ok_or(UnknownOpcode(symbol))
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Operation {
    /// The snake-case operation name used in the instruction table.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoOperation => "no_operation",
            Self::MoveUp => "move_up",
            Self::MoveDown => "move_down",
            Self::MoveRight => "move_right",
            Self::MoveLeft => "move_left",
            Self::FindTemplate => "find_template",
            Self::IfNotZero => "if_not_zero",
            Self::One => "one",
            Self::Zero => "zero",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Subtract => "subtract",
            Self::LoadInst => "load_inst",
            Self::WriteInst => "write_inst",
            Self::AllocateChild => "allocate_child",
            Self::SplitChild => "split_child",
            Self::Push => "push",
            Self::Pop => "pop",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn symbols_round_trip_and_are_unique() {
        let mut seen = BTreeSet::new();
        for op in Opcode::ALL {
            assert!(seen.insert(op.symbol()), "duplicate symbol {}", op.symbol());
            assert_eq!(Opcode::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(seen.len(), ALPHABET_SIZE);
    }

    #[test]
    fn vectors_are_unique() {
        let vectors: BTreeSet<Vec2> = Opcode::ALL.iter().map(|op| op.vector()).collect();
        assert_eq!(vectors.len(), ALPHABET_SIZE);
    }

    #[test]
    fn increment_and_decrement_keep_table_pairing() {
        assert_eq!(Opcode::from_symbol('-').map(Opcode::operation), Some(Operation::Increment));
        assert_eq!(Opcode::from_symbol('+').map(Opcode::operation), Some(Operation::Decrement));
        assert_eq!(Opcode::Increment.vector(), Vec2::new(6, 2));
        assert_eq!(Opcode::Decrement.vector(), Vec2::new(6, 3));
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        assert_eq!(Opcode::from_symbol('z'), None);
        assert_eq!(Opcode::try_from('#'), Err(UnknownOpcode('#')));
    }

    #[test]
    fn from_vector_uses_first_component_modulo_alphabet() {
        assert_eq!(Opcode::from_vector(Vec2::new(0, 9)), Opcode::Dot);
        assert_eq!(Opcode::from_vector(Vec2::new(12, 0)), Opcode::FindTemplate);
        assert_eq!(Opcode::from_vector(Vec2::new(25, 0)), Opcode::Dot);
        assert_eq!(Opcode::from_vector(Vec2::new(-1, 0)), Opcode::Pop);
    }

    #[test]
    fn markers_complement_each_other() {
        assert_eq!(Opcode::Dot.complement(), Some(Opcode::Colon));
        assert_eq!(Opcode::Colon.complement(), Some(Opcode::Dot));
        assert_eq!(Opcode::RegA.complement(), None);
        assert!(Opcode::Colon.is_marker());
        assert!(!Opcode::Push.is_marker());
    }

    #[test]
    fn opcode_serializes_as_its_symbol() {
        let json = serde_json::to_string(&Opcode::AllocateChild).unwrap_or_default();
        assert_eq!(json, "\"@\"");
        let back: Result<Opcode, _> = serde_json::from_str("\"$\"");
        assert_eq!(back.ok(), Some(Opcode::SplitChild));
        let bad: Result<Opcode, _> = serde_json::from_str("\"#\"");
        assert!(bad.is_err());
    }

    #[test]
    fn from_vector_follows_enumeration_order() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(Opcode::from_vector(Vec2::new(i64::try_from(i).unwrap_or(0), 0)), *op);
        }
    }
}
