//! Execution engine.
//!
//! The [`VM`] owns the register file and memory bank, fetches lines from its
//! [`Program`] through the program counter `P`, decodes them and dispatches each
//! [`Instruction`] with an exhaustive match.
//!
//! # Step
//!
//! While running, every step:
//! 1. faults if `P` is outside `0..PROGRAM_COUNTER_LIMIT`
//! 2. faults if the step counter `X` is past the configured step limit
//! 3. completes normally if `P` is past the last line
//! 4. fetches, decodes and executes the line at `P`
//! 5. on success adds one to both `P` and `X`
//!
//! Step 5 also follows jumps, so a jump lands one line past its raw offset. A
//! faulting instruction skips step 5 entirely. Once the machine has halted, no
//! further instruction is dispatched.

mod memory;
mod profile;
mod registers;

pub use memory::Memory;
pub use profile::{ExecProfile, format_with_commas, render_profile};
pub use registers::Registers;

use crate::virtual_machine::config::{MachineConfig, PROGRAM_COUNTER_LIMIT, UnknownOpcodePolicy};
use crate::virtual_machine::decoder::{Instruction, decode};
use crate::virtual_machine::errors::{DecodeError, Fault};
use crate::virtual_machine::isa::Register;
use crate::virtual_machine::program::Program;
use crate::{debug, info};
use registers::check_magnitude;
use std::io::Write;

/// Diagnostic line written when a run ends in a fault.
pub const FAULT_MESSAGE: &str = "I'm afraid I can't do that";

/// Diagnostic line written when a run ends on `HALT`.
pub const HALT_MESSAGE: &str = "Execution halted";

/// Machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// `P` moved past the end of the program.
    HaltedNormal,
    /// A fault or an explicit `HALT`.
    HaltedError,
}

/// How a run ended when it did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The program counter ran off the end of the program.
    Completed,
    /// A `HALT` instruction stopped the run.
    Halted,
}

impl Outcome {
    /// Returns the line to write after the program's own output, if any.
    pub const fn diagnostic(&self) -> Option<&'static str> {
        match self {
            Outcome::Completed => None,
            Outcome::Halted => Some(HALT_MESSAGE),
        }
    }

    /// Process exit code reported for this outcome.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::Halted => 2,
        }
    }
}

/// Process exit code for a finished run.
pub fn exit_code(result: &Result<Outcome, Fault>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(fault) => fault.exit_code(),
    }
}

/// What the engine does after an instruction returns successfully.
enum Flow {
    Continue,
    Halt,
}

/// The machine: program, registers, memory and run status.
pub struct VM {
    /// Lines to execute.
    program: Program,
    /// Register file (A, B, C, D, P, X).
    registers: Registers,
    /// Memory bank.
    memory: Memory,
    config: MachineConfig,
    status: Status,
    /// Result of the run, recorded once the machine halts.
    termination: Option<Result<Outcome, Fault>>,
    /// Dispatch counts per opcode.
    profile: ExecProfile,
}

impl VM {
    /// Creates a machine for `program` with the default configuration.
    pub fn new(program: Program) -> Self {
        Self::with_config(program, MachineConfig::default())
    }

    /// Creates a machine for `program` with all registers and memory zeroed.
    pub fn with_config(program: Program, config: MachineConfig) -> Self {
        Self {
            program,
            registers: Registers::new(),
            memory: Memory::new(),
            config,
            status: Status::Running,
            termination: None,
            profile: ExecProfile::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn register(&self, reg: Register) -> i64 {
        self.registers.get(reg)
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn profile(&self) -> &ExecProfile {
        &self.profile
    }

    /// Runs until the machine halts, writing `PRINT` output to `out`.
    ///
    /// No diagnostic line is written; see [`VM::execute`] for that.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<Outcome, Fault> {
        loop {
            if let Some(outcome) = self.step(out)? {
                return Ok(outcome);
            }
        }
    }

    /// Runs until the machine halts, then writes the closing diagnostic line.
    ///
    /// Faults write [`FAULT_MESSAGE`] regardless of kind and `HALT` writes
    /// [`HALT_MESSAGE`]. A failing output stream is reported as-is without a
    /// diagnostic, since there is nowhere left to write it. On a machine that had
    /// already halted the recorded result is returned and nothing is written.
    pub fn execute<W: Write>(&mut self, out: &mut W) -> Result<Outcome, Fault> {
        if let Some(done) = &self.termination {
            return done.clone();
        }
        let result = self.run(out);
        let line = match &result {
            Ok(outcome) => outcome.diagnostic(),
            Err(Fault::Io(_)) => None,
            Err(_) => Some(FAULT_MESSAGE),
        };
        if let Some(line) = line {
            writeln!(out, "{line}")?;
        }
        result
    }

    /// Executes at most one instruction.
    ///
    /// Returns `Ok(None)` while the machine keeps running. Once it has halted, every
    /// call returns the recorded result without dispatching anything.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Option<Outcome>, Fault> {
        if let Some(done) = &self.termination {
            return done.clone().map(Some);
        }

        match self.advance(out) {
            Ok(None) => Ok(None),
            Ok(Some(outcome)) => {
                debug!(
                    "{:?} after {} step(s)",
                    outcome,
                    self.registers.get(Register::X)
                );
                self.terminate(Ok(outcome));
                Ok(Some(outcome))
            }
            Err(fault) => {
                info!(
                    "fault at P={} X={}: {}",
                    self.registers.get(Register::P),
                    self.registers.get(Register::X),
                    fault
                );
                self.terminate(Err(fault.clone()));
                Err(fault)
            }
        }
    }

    fn terminate(&mut self, result: Result<Outcome, Fault>) {
        self.status = match result {
            Ok(Outcome::Completed) => Status::HaltedNormal,
            Ok(Outcome::Halted) | Err(_) => Status::HaltedError,
        };
        self.termination = Some(result);
    }

    /// Guards, fetch, decode, dispatch and the trailing counter updates.
    fn advance<W: Write>(&mut self, out: &mut W) -> Result<Option<Outcome>, Fault> {
        let pc = self.registers.get(Register::P);
        if !(0..PROGRAM_COUNTER_LIMIT).contains(&pc) {
            return Err(Fault::ProgramCounterOutOfRange {
                pc,
                limit: PROGRAM_COUNTER_LIMIT,
            });
        }

        let steps = self.registers.get(Register::X);
        if u64::try_from(steps).is_ok_and(|s| s > self.config.step_limit) {
            return Err(Fault::StepLimitExceeded {
                limit: self.config.step_limit,
            });
        }

        let Some(line) = self.program.fetch(pc) else {
            return Ok(Some(Outcome::Completed));
        };

        match decode(line) {
            Ok(instruction) => {
                debug!("P={pc} X={steps} {instruction}");
                self.profile.record(instruction.opcode());
                if let Flow::Halt = self.exec(instruction, out)? {
                    return Ok(Some(Outcome::Halted));
                }
            }
            Err(Fault::Decode {
                reason: DecodeError::UnknownOpcode { mnemonic },
                ..
            }) if self.config.unknown_opcode == UnknownOpcodePolicy::Skip => {
                debug!("P={pc} X={steps} skipping unknown instruction '{mnemonic}'");
            }
            Err(fault) => return Err(fault),
        }

        let p = self.registers.get(Register::P);
        let x = self.registers.get(Register::X);
        self.registers.assign(Register::P, p.saturating_add(1));
        self.registers.assign(Register::X, x.saturating_add(1));
        Ok(None)
    }

    /// Executes a single decoded instruction.
    fn exec<W: Write>(&mut self, instruction: Instruction, out: &mut W) -> Result<Flow, Fault> {
        let instr = instruction.opcode().mnemonic();
        match instruction {
            // Memory
            Instruction::LoadA { rd, addr } => self.op_load_a(instr, rd, addr)?,
            Instruction::Load { rd } => self.op_load(instr, rd)?,
            Instruction::LoadI { rd, imm } => self.op_load_i(instr, rd, imm)?,
            Instruction::StoreA { rs, addr } => self.op_store_a(instr, rs, addr)?,
            Instruction::Store { rs } => self.op_store(instr, rs)?,
            Instruction::Move { rd, rs } => self.op_move(rd, rs),
            // Integer arithmetic
            Instruction::AddI { rd, imm } => self.op_add_i(instr, rd, imm)?,
            Instruction::Add { rd, rs } => self.op_arith(instr, rd, rs, i64::checked_add)?,
            Instruction::Sub { rd, rs } => self.op_arith(instr, rd, rs, i64::checked_sub)?,
            Instruction::Mul { rd, rs } => self.op_arith(instr, rd, rs, i64::checked_mul)?,
            Instruction::Div { rd, rs } => self.op_div(instr, rd, rs)?,
            // Control flow
            Instruction::J { offset } => self.op_jump(instr, offset)?,
            Instruction::Jr { rs } => self.op_jump(instr, self.registers.get(rs))?,
            Instruction::Jz { rs, offset } => {
                if self.registers.get(rs) == 0 {
                    self.op_jump(instr, offset)?;
                }
            }
            Instruction::Jlt { ra, rb, offset } => {
                if self.registers.get(ra) < self.registers.get(rb) {
                    self.op_jump(instr, offset)?;
                }
            }
            Instruction::Halt {} => return Ok(Flow::Halt),
            Instruction::Print { rs } => self.op_print(rs, out)?,
        }
        Ok(Flow::Continue)
    }

    fn op_load_a(&mut self, instr: &'static str, rd: Register, addr: i64) -> Result<(), Fault> {
        let v = self.memory.read(addr)?;
        self.registers.set(instr, rd, v)
    }

    fn op_load(&mut self, instr: &'static str, rd: Register) -> Result<(), Fault> {
        let addr = self.registers.get(Register::A);
        self.op_load_a(instr, rd, addr)
    }

    fn op_load_i(&mut self, instr: &'static str, rd: Register, imm: i64) -> Result<(), Fault> {
        self.registers.set(instr, rd, imm)
    }

    fn op_store_a(&mut self, instr: &'static str, rs: Register, addr: i64) -> Result<(), Fault> {
        let v = self.registers.get(rs);
        self.memory.write(instr, addr, v)
    }

    fn op_store(&mut self, instr: &'static str, rs: Register) -> Result<(), Fault> {
        let addr = self.registers.get(Register::A);
        self.op_store_a(instr, rs, addr)
    }

    fn op_move(&mut self, rd: Register, rs: Register) {
        let v = self.registers.get(rs);
        self.registers.assign(rd, v);
    }

    /// Checks the immediate, not the sum.
    fn op_add_i(&mut self, instr: &'static str, rd: Register, imm: i64) -> Result<(), Fault> {
        check_magnitude(instr, imm)?;
        let v = self
            .registers
            .get(rd)
            .checked_add(imm)
            .ok_or(Fault::ArithmeticOverflow { instruction: instr })?;
        self.registers.assign(rd, v);
        Ok(())
    }

    fn op_arith(
        &mut self,
        instr: &'static str,
        rd: Register,
        rs: Register,
        op: fn(i64, i64) -> Option<i64>,
    ) -> Result<(), Fault> {
        let a = self.registers.get(rd);
        let b = self.registers.get(rs);
        let v = op(a, b).ok_or(Fault::ArithmeticOverflow { instruction: instr })?;
        self.registers.set(instr, rd, v)
    }

    fn op_div(&mut self, instr: &'static str, rd: Register, rs: Register) -> Result<(), Fault> {
        let a = self.registers.get(rd);
        let b = self.registers.get(rs);
        if b == 0 {
            return Err(Fault::DivisionByZero);
        }
        let v = floor_div(a, b).ok_or(Fault::ArithmeticOverflow { instruction: instr })?;
        self.registers.set(instr, rd, v)
    }

    /// `P += offset`; the trailing step increment is applied afterwards as usual.
    ///
    /// The offset itself is uncapped, but the new `P` is held to the magnitude bound.
    fn op_jump(&mut self, instr: &'static str, offset: i64) -> Result<(), Fault> {
        let target = self.registers.get(Register::P).saturating_add(offset);
        check_magnitude(instr, target)?;
        self.registers.assign(Register::P, target);
        Ok(())
    }

    fn op_print<W: Write>(&mut self, rs: Register, out: &mut W) -> Result<(), Fault> {
        writeln!(out, "{}", self.registers.get(rs))?;
        Ok(())
    }
}

/// Integer division rounding toward negative infinity.
///
/// Returns `None` when the quotient does not fit (`i64::MIN / -1`) or `b == 0`.
pub(crate) fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}
