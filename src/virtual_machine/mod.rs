//! The LAH9000 register machine.
//!
//! Programs are plain text, one instruction per line, and are executed directly from
//! their source lines: the program counter indexes lines and each line is decoded
//! when it is reached.
//!
//! # Architecture
//!
//! - **Registers**: six signed registers `A B C D P X`; `P` is the program counter
//!   and `X` the step counter, both also usable as ordinary operands
//! - **Memory**: 2048 signed cells, zero-initialized
//! - **Magnitude bound**: values written through checked paths must stay within
//!   `±2^42`
//! - **Execution model**: loads and stores, integer arithmetic with floor division,
//!   relative jumps, `HALT` and `PRINT`
//! - **Step limit**: a run faults once `X` passes the configured ceiling
//!
//! # Modules
//!
//! - [`config`]: Machine constants and run configuration
//! - [`decoder`]: Line tokenizer, instruction decoder and static diagnostics
//! - [`errors`]: Decode and execution fault types
//! - [`isa`]: Instruction set definition, opcodes and registers
//! - [`program`]: Program text loading
//! - [`vm`]: Execution engine, register file, memory bank and profiling

pub mod config;
pub mod decoder;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod program;
pub mod vm;
