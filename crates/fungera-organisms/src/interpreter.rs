//! The one-instruction-per-tick organism interpreter.
//!
//! [`cycle`] fetches the opcode under `ip`, dispatches it, applies the
//! parasitism penalty, and then runs the end-of-tick sequence:
//!
//! 1. the error counter grows by one per fault (operation and parasitism
//!    are counted separately, so a tick can cost two errors),
//! 2. the stagnation counter grows by one,
//! 3. an organism past a death threshold releases its memory and stops,
//! 4. otherwise `ip` advances one cell along the current direction, unless
//!    that would leave the grid, in which case it stays where it is.
//!
//! Operands are read relative to `ip`: `inst(k)` is the cell `k` steps
//! ahead along the current direction.

use fungera_types::{Component, Direction, Opcode, Operation, Organism, Register, Registers, Vec2};
use fungera_world::Grid;

use crate::config::OrganismConfig;
use crate::death::{self, DeathCause};
use crate::fault::{Fault, Outcome};
use crate::lifecycle;

/// Everything one call to [`cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The opcode that was under `ip` at fetch time.
    pub opcode: Opcode,
    /// The operation it dispatched to.
    pub operation: Operation,
    /// How the operation went.
    pub outcome: Outcome,
    /// Distance from `start` when the parasitism penalty fired.
    pub parasitism: Option<u64>,
    /// A newly split child, to be appended to the roster.
    pub child: Option<Organism>,
    /// Set when the organism died this tick; its memory is already released.
    pub death: Option<DeathCause>,
}

impl CycleReport {
    /// Errors added to the organism this tick.
    pub fn faults(&self) -> u64 {
        u64::from(self.outcome.is_fault()).saturating_add(u64::from(self.parasitism.is_some()))
    }
}

/// Execute exactly one instruction for `organism`.
pub fn cycle(organism: &mut Organism, grid: &mut Grid, config: &OrganismConfig) -> CycleReport {
    let opcode = grid.read(organism.ip);
    let operation = opcode.operation();

    let (outcome, child) = {
        let mut exec = Executor {
            organism: &mut *organism,
            grid: &mut *grid,
            config,
            child: None,
        };
        let outcome = match exec.dispatch(operation) {
            Ok(Effect::Executed) => Outcome::Executed,
            Ok(Effect::Idle) => Outcome::Idle,
            Err(fault) => Outcome::Fault(fault),
        };
        (outcome, exec.child)
    };

    let parasitism = parasitism_distance(organism, grid, config);
    let mut report = CycleReport {
        opcode,
        operation,
        outcome,
        parasitism,
        child,
        death: None,
    };

    let faults = report.faults();
    if faults > 0 {
        organism.errors = organism.errors.saturating_add(faults);
        tracing::trace!(
            organism_id = %organism.id,
            %opcode,
            ?outcome,
            ?parasitism,
            errors = organism.errors,
            "fault"
        );
    }

    let new_ip = organism.ip.wrapping_add(organism.delta());
    organism.stagnation = organism.stagnation.saturating_add(1);

    report.death = death::check_death(organism, config);
    if report.death.is_some() {
        lifecycle::release(organism, grid);
    } else if grid.contains(new_ip) {
        organism.ip = new_ip;
    }

    report
}

/// Maximum-axis distance from `start` when `ip` sits on unallocated memory
/// farther away than the configured threshold.
fn parasitism_distance(organism: &Organism, grid: &Grid, config: &OrganismConfig) -> Option<u64> {
    if config.penalize_parasitism == 0 || grid.is_allocated(organism.ip) {
        return None;
    }
    let distance = organism.ip.wrapping_sub(organism.start).chebyshev_norm();
    (distance > config.penalize_parasitism).then_some(distance)
}

/// Non-fault result of an operation.
enum Effect {
    Executed,
    Idle,
}

type OpResult = Result<Effect, Fault>;

/// What the component-selector-or-register addressing mode resolved to.
#[derive(Clone, Copy)]
enum Target {
    Whole(Register),
    Part(Register, Component),
}

impl Target {
    const fn is_zero(self, registers: &Registers) -> bool {
        match self {
            Self::Whole(r) => registers.get(r).is_zero(),
            Self::Part(r, c) => registers.get(r).component(c) == 0,
        }
    }

    const fn shift(self, registers: &mut Registers, step: i64) {
        match self {
            Self::Whole(r) => {
                let value = registers.get(r).wrapping_add(Vec2::splat(step));
                registers.set(r, value);
            }
            Self::Part(r, c) => {
                let slot = registers.get_mut(r).component_mut(c);
                *slot = slot.wrapping_add(step);
            }
        }
    }
}

struct Executor<'a> {
    organism: &'a mut Organism,
    grid: &'a mut Grid,
    config: &'a OrganismConfig,
    child: Option<Organism>,
}

impl Executor<'_> {
    fn inst(&self, offset: i64) -> Opcode {
        self.grid.read(self.organism.ip_offset(offset))
    }

    fn register(&self, offset: i64) -> Result<Register, Fault> {
        let found = self.inst(offset);
        Register::from_opcode(found).ok_or(Fault::InvalidOperand { offset, found })
    }

    /// Resolve `x|y reg` or `reg` at offset 1. The second value is how many
    /// extra operand cells the selector consumed.
    fn target(&self) -> Result<(Target, i64), Fault> {
        match self.inst(1).component() {
            Some(component) => Ok((Target::Part(self.register(2)?, component), 1)),
            None => Ok((Target::Whole(self.register(1)?), 0)),
        }
    }

    const fn regs(&mut self) -> &mut Registers {
        &mut self.organism.registers
    }

    fn dispatch(&mut self, operation: Operation) -> OpResult {
        match operation {
            Operation::NoOperation => Ok(Effect::Idle),
            Operation::MoveUp => Ok(self.turn(Direction::Up)),
            Operation::MoveDown => Ok(self.turn(Direction::Down)),
            Operation::MoveRight => Ok(self.turn(Direction::Right)),
            Operation::MoveLeft => Ok(self.turn(Direction::Left)),
            Operation::FindTemplate => self.find_template(),
            Operation::IfNotZero => self.if_not_zero(),
            Operation::One => self.set_constant(Vec2::splat(1)),
            Operation::Zero => self.set_constant(Vec2::ZERO),
            Operation::Increment => self.adjust(1),
            Operation::Decrement => self.adjust(-1),
            Operation::Subtract => self.subtract(),
            Operation::LoadInst => self.load_inst(),
            Operation::WriteInst => self.write_inst(),
            Operation::AllocateChild => self.allocate_child(),
            Operation::SplitChild => Ok(self.split_child()),
            Operation::Push => self.push(),
            Operation::Pop => self.pop(),
        }
    }

    const fn turn(&mut self, direction: Direction) -> Effect {
        self.organism.direction = direction;
        Effect::Executed
    }

    fn find_template(&mut self) -> OpResult {
        let destination = self.register(1)?;
        let limit = self
            .organism
            .size
            .max_component()
            .min(self.config.search_limit);

        let mut template = Vec::new();
        let mut stop = 2;
        for i in 2..limit {
            stop = i;
            match self.inst(i).complement() {
                Some(marker) => template.push(marker),
                None => break,
            }
        }
        if template.is_empty() {
            return Ok(Effect::Idle);
        }

        let mut matched = 0_usize;
        for i in stop..limit {
            if template.get(matched) == Some(&self.inst(i)) {
                matched = matched.saturating_add(1);
            } else {
                matched = 0;
            }
            if matched == template.len() {
                let address = self.organism.ip_offset(i);
                self.regs().set(destination, address);
                return Ok(Effect::Executed);
            }
        }
        Ok(Effect::Idle)
    }

    fn if_not_zero(&mut self) -> OpResult {
        let (target, consumed) = self.target()?;
        let skip = if target.is_zero(&self.organism.registers) {
            consumed.saturating_add(1)
        } else {
            consumed.saturating_add(2)
        };
        self.organism.ip = self.organism.ip_offset(skip);
        Ok(Effect::Executed)
    }

    fn set_constant(&mut self, value: Vec2) -> OpResult {
        let register = self.register(1)?;
        self.regs().set(register, value);
        Ok(Effect::Executed)
    }

    fn adjust(&mut self, step: i64) -> OpResult {
        let (target, _) = self.target()?;
        target.shift(self.regs(), step);
        Ok(Effect::Executed)
    }

    fn subtract(&mut self) -> OpResult {
        let lhs = self.register(1)?;
        let rhs = self.register(2)?;
        let out = self.register(3)?;
        let regs = self.regs();
        let value = regs.get(lhs).wrapping_sub(regs.get(rhs));
        regs.set(out, value);
        Ok(Effect::Executed)
    }

    fn load_inst(&mut self) -> OpResult {
        let address = self.register(1)?;
        let destination = self.register(2)?;
        let vector = self.grid.read(self.organism.registers.get(address)).vector();
        self.regs().set(destination, vector);
        Ok(Effect::Executed)
    }

    fn write_inst(&mut self) -> OpResult {
        if !self.organism.has_staged_child() {
            return Ok(Effect::Idle);
        }
        let address = self.register(1)?;
        let source = self.register(2)?;
        let regs = self.organism.registers;
        self.grid
            .write_opcode_from_vector(regs.get(address), regs.get(source));
        Ok(Effect::Executed)
    }

    fn allocate_child(&mut self) -> OpResult {
        let size_register = self.register(1)?;
        let destination = self.register(2)?;
        let size = self.organism.registers.get(size_register);
        if size.has_non_positive() {
            return Ok(Effect::Idle);
        }

        let limit = self
            .grid
            .dimensions()
            .max_component()
            .min(self.config.search_limit);
        for i in 2..limit {
            let candidate = self.organism.ip_offset(i);
            match self.grid.is_allocated_region(candidate, size) {
                None => break,
                Some(true) => {}
                Some(false) => {
                    if self.organism.has_staged_child() {
                        self.grid
                            .deallocate(self.organism.child_start, self.organism.child_size);
                    }
                    self.organism.child_start = candidate;
                    self.organism.child_size = size;
                    self.regs().set(destination, candidate);
                    self.grid.allocate(candidate, size);
                    return Ok(Effect::Executed);
                }
            }
        }
        Err(Fault::NoSpace)
    }

    fn split_child(&mut self) -> Effect {
        if !self.organism.has_staged_child() {
            self.organism.clear_staged_child();
            return Effect::Idle;
        }
        let start = self.organism.child_start;
        let size = self.organism.child_size;
        self.grid.deallocate(start, size);
        let child = lifecycle::spawn(self.grid, start, size, Some(self.organism.id));
        self.child = Some(child);
        self.organism.children = self.organism.children.saturating_add(1);
        self.organism.stagnation = 0;
        self.organism.clear_staged_child();
        Effect::Executed
    }

    fn push(&mut self) -> OpResult {
        let register = self.register(1)?;
        let capacity = self.config.stack_length;
        if self.organism.stack.len() >= capacity {
            return Err(Fault::StackOverflow { capacity });
        }
        let value = self.organism.registers.get(register);
        self.organism.stack.push(value);
        Ok(Effect::Executed)
    }

    fn pop(&mut self) -> OpResult {
        let register = self.register(1)?;
        let value = self.organism.stack.pop().ok_or(Fault::StackUnderflow)?;
        self.regs().set(register, value);
        Ok(Effect::Executed)
    }
}
