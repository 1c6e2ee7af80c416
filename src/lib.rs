//! LAH9000 library.
//!
//! Provides the LAH9000 register machine: instruction set, decoder, execution engine
//! and the logging used by the interpreter binary.

pub mod utils;
pub mod virtual_machine;
