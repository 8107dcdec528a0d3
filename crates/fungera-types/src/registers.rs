//! The four named general-purpose registers.
//!
//! Register names arrive as opcodes read from memory. [`Register::from_opcode`]
//! is the only way to turn memory content into a register handle, and it
//! fails closed: anything other than `a`, `b`, `c`, `d` yields `None`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::instruction::Opcode;
use crate::vector::Vec2;

/// A register name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Register {
    /// Register `a`.
    A,
    /// Register `b`.
    B,
    /// Register `c`.
    C,
    /// Register `d`.
    D,
}

impl Register {
    /// All registers in display order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Resolve a register-name opcode.
    pub const fn from_opcode(op: Opcode) -> Option<Self> {
        op.register()
    }

    /// The single-character register name.
    pub const fn name(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
            Self::C => 'c',
            Self::D => 'd',
        }
    }
}

/// The register file of one organism: exactly four vector slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Registers {
    /// Register `a`.
    pub a: Vec2,
    /// Register `b`.
    pub b: Vec2,
    /// Register `c`.
    pub c: Vec2,
    /// Register `d`.
    pub d: Vec2,
}

impl Registers {
    /// Read a register.
    pub const fn get(&self, register: Register) -> Vec2 {
        match register {
            Register::A => self.a,
            Register::B => self.b,
            Register::C => self.c,
            Register::D => self.d,
        }
    }

    /// Mutable access to a register.
    pub const fn get_mut(&mut self, register: Register) -> &mut Vec2 {
        match register {
            Register::A => &mut self.a,
            Register::B => &mut self.b,
            Register::C => &mut self.c,
            Register::D => &mut self.d,
        }
    }

    /// Overwrite a register.
    pub const fn set(&mut self, register: Register, value: Vec2) {
        *self.get_mut(register) = value;
    }

    /// `(register, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, Vec2)> + '_ {
        Register::ALL.into_iter().map(|r| (r, self.get(r)))
    }
}
