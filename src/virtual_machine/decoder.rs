//! Instruction decoder and static program check.
//!
//! Turns one line of program text into an [`Instruction`] with typed operands. Uses
//! [`for_each_instruction!`](crate::for_each_instruction) to generate the
//! `Instruction` enum and its operand parsing, so every opcode is matched
//! exhaustively by the engine.
//!
//! # Syntax
//!
//! ```text
//! MNEMONIC operand1 operand2 ...
//! ```
//!
//! - Mnemonics and register names are upper-case and case-sensitive
//! - Operands are separated by whitespace
//! - Integers are decimal with an optional `+`/`-` sign; literals beyond the 64-bit
//!   range saturate so they still fail the machine's magnitude checks
//! - The number of operands must match the opcode exactly

use crate::for_each_instruction;
use crate::virtual_machine::config::UnknownOpcodePolicy;
use crate::virtual_machine::errors::{DecodeError, Fault};
use crate::virtual_machine::isa::{Opcode, Register};
use crate::virtual_machine::program::Program;
use std::fmt;
use std::fmt::Write;
use std::num::IntErrorKind;

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    /// 1-based column in the line.
    column: usize,
}

/// Splits a line on whitespace, remembering where each token starts.
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut out = Vec::with_capacity(4);
    let mut start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token {
                    text: &line[s..i],
                    column: s + 1,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        out.push(Token {
            text: &line[s..],
            column: s + 1,
        });
    }

    out
}

/// Parse a register token like `A` or `P`.
pub(crate) fn parse_register(tok: &str) -> Result<Register, DecodeError> {
    tok.parse::<Register>()
        .map_err(|_| DecodeError::InvalidRegister {
            token: tok.to_string(),
        })
}

/// Parse a signed decimal immediate, saturating at the `i64` bounds.
///
/// Single underscores may separate digits (`1_000`); leading, trailing or doubled
/// underscores are rejected.
pub(crate) fn parse_immediate(tok: &str) -> Result<i64, DecodeError> {
    let invalid = || DecodeError::InvalidInteger {
        token: tok.to_string(),
    };

    let digits = tok.strip_prefix(['+', '-']).unwrap_or(tok);
    let well_formed = digits
        .split('_')
        .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(invalid());
    }

    let sign = &tok[..tok.len() - digits.len()];
    let cleaned = format!("{sign}{}", digits.replace('_', ""));
    match cleaned.parse::<i64>() {
        Ok(v) => Ok(v),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(invalid()),
        },
    }
}

macro_rules! define_instruction_decoder {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ]
        ),* $(,)?
    ) => {
        /// A decoded instruction: one variant per opcode with its typed operands.
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name {
                    $( $field: define_instruction_decoder!(@ty $kind) ),*
                },
            )*
        }

        impl Instruction {
            /// Returns the operand-less opcode of this instruction.
            pub const fn opcode(&self) -> Opcode {
                match self {
                    $( Instruction::$name { .. } => Opcode::$name, )*
                }
            }
        }

        impl fmt::Display for Instruction {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(
                        Instruction::$name { $( $field ),* } => {
                            f.write_str($mnemonic)?;
                            $( write!(f, " {}", $field)?; )*
                            Ok(())
                        }
                    )*
                }
            }
        }

        /// Decodes tokenized operands for `opcode`.
        ///
        /// `end` is the column just past the line, reported when operands are missing.
        fn decode_operands(
            opcode: Opcode,
            operands: &[Token<'_>],
            end: usize,
        ) -> Result<Instruction, (usize, DecodeError)> {
            let mismatch = || DecodeError::ArityMismatch {
                instruction: opcode.mnemonic(),
                expected: opcode.arity(),
                actual: operands.len(),
            };

            match opcode {
                $(
                    Opcode::$name => {
                        #[allow(unused_mut)]
                        let mut it = operands.iter();
                        let instr = Instruction::$name {
                            $(
                                $field: define_instruction_decoder!(@operand $kind, it, end, mismatch)?,
                            )*
                        };
                        match it.next() {
                            Some(extra) => Err((extra.column, mismatch())),
                            None => Ok(instr),
                        }
                    }
                )*
            }
        }
    };

    // ---------- types ----------
    (@ty Reg) => { Register };
    (@ty Imm) => { i64 };

    // ---------- parsing ----------
    (@parse Reg, $text:expr) => { parse_register($text) };
    (@parse Imm, $text:expr) => { parse_immediate($text) };

    (@operand $kind:ident, $it:ident, $end:ident, $mismatch:ident) => {
        match $it.next() {
            Some(tok) => define_instruction_decoder!(@parse $kind, tok.text)
                .map_err(|reason| (tok.column, reason)),
            None => Err(($end, $mismatch())),
        }
    };
}

for_each_instruction!(define_instruction_decoder);

/// Decodes one line of program text.
///
/// Has no side effects. Failures carry the 1-based column of the offending token.
pub fn decode(line: &str) -> Result<Instruction, Fault> {
    let tokens = tokenize(line);
    let end = line.len() + 1;

    let result = match tokens.split_first() {
        None => Err((1, DecodeError::MissingOpcode)),
        Some((head, operands)) => match Opcode::from_mnemonic(head.text) {
            Some(opcode) => decode_operands(opcode, operands, end),
            None => Err((
                head.column,
                DecodeError::UnknownOpcode {
                    mnemonic: head.text.to_string(),
                },
            )),
        },
    };

    result.map_err(|(column, reason)| Fault::Decode { column, reason })
}

/// A decode problem found ahead of execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line in the program.
    pub line: usize,
    /// 1-based column in that line.
    pub column: usize,
    pub message: String,
}

/// Decodes every line of `program` without executing anything.
///
/// Unknown mnemonics are not reported under [`UnknownOpcodePolicy::Skip`], since the
/// engine would step over them.
pub fn check_program(program: &Program, policy: UnknownOpcodePolicy) -> Vec<Diagnostic> {
    program
        .lines()
        .iter()
        .enumerate()
        .filter_map(|(i, line)| match decode(line) {
            Ok(_) => None,
            Err(Fault::Decode {
                reason: DecodeError::UnknownOpcode { .. },
                ..
            }) if policy == UnknownOpcodePolicy::Skip => None,
            Err(Fault::Decode { column, reason }) => Some(Diagnostic {
                line: i + 1,
                column,
                message: reason.to_string(),
            }),
            Err(other) => Some(Diagnostic {
                line: i + 1,
                column: 1,
                message: other.to_string(),
            }),
        })
        .collect()
}

/// Formats a compiler-style diagnostic with the offending line and a caret.
pub fn render_diagnostic(file: &str, program: &Program, diag: &Diagnostic) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "error: {}", diag.message);
    let _ = writeln!(out, " --> {}:{}:{}", file, diag.line, diag.column);

    if let Some(text) = program.fetch(diag.line as i64 - 1) {
        let underline = " ".repeat(diag.column.saturating_sub(1));
        let _ = writeln!(out, "     |");
        let _ = writeln!(out, "{:>4} | {}", diag.line, text);
        let _ = writeln!(out, "     | {}^", underline);
    }

    out
}
