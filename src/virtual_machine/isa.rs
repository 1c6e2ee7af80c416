//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the canonical
//! instruction list and hands it to a callback macro, so the opcode table, the decoder
//! and the ISA fingerprint test are all generated from one definition.
//!
//! This module generates the fieldless [`Opcode`] enum and defines the [`Register`]
//! names. See [`decoder`](super::decoder) for the operand-carrying `Instruction` type.
//!
//! # Text format
//!
//! One instruction per line, operands separated by whitespace:
//!
//! ```text
//! LOADI A 5
//! PRINT A
//! ```
//!
//! Operand kinds:
//! - `Reg`: one of `A B C D P X`
//! - `Imm`: signed decimal integer

use std::fmt;
use std::str::FromStr;

/// Invokes a callback macro with the complete instruction definition list.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Memory
            // =========================
            /// LOADA rd addr ; rd = memory[addr]
            LoadA = "LOADA" => [rd: Reg, addr: Imm],
            /// LOAD rd ; rd = memory[A]
            Load = "LOAD" => [rd: Reg],
            /// LOADI rd imm ; rd = imm
            LoadI = "LOADI" => [rd: Reg, imm: Imm],
            /// STOREA rs addr ; memory[addr] = rs
            StoreA = "STOREA" => [rs: Reg, addr: Imm],
            /// STORE rs ; memory[A] = rs
            Store = "STORE" => [rs: Reg],
            /// MOVE rd rs ; rd = rs
            Move = "MOVE" => [rd: Reg, rs: Reg],
            // =========================
            // Integer arithmetic
            // =========================
            /// ADDI rd imm ; rd = rd + imm
            AddI = "ADDI" => [rd: Reg, imm: Imm],
            /// ADD rd rs ; rd = rd + rs
            Add = "ADD" => [rd: Reg, rs: Reg],
            /// SUB rd rs ; rd = rd - rs
            Sub = "SUB" => [rd: Reg, rs: Reg],
            /// MUL rd rs ; rd = rd * rs
            Mul = "MUL" => [rd: Reg, rs: Reg],
            /// DIV rd rs ; rd = floor(rd / rs) (trap on division by zero)
            Div = "DIV" => [rd: Reg, rs: Reg],
            // =========================
            // Control flow
            // =========================
            /// J offset ; P += offset
            J = "J" => [offset: Imm],
            /// JR rs ; P += rs
            Jr = "JR" => [rs: Reg],
            /// JZ rs offset ; if rs == 0 then P += offset
            Jz = "JZ" => [rs: Reg, offset: Imm],
            /// JLT ra rb offset ; if ra < rb then P += offset
            Jlt = "JLT" => [ra: Reg, rb: Reg, offset: Imm],
            /// HALT ; stop execution
            Halt = "HALT" => [],
            /// PRINT rs ; write rs to the output stream
            Print = "PRINT" => [rs: Reg],
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ]
        ),* $(,)?
    ) => {
        /// Instruction kind tag, without operands.
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl Opcode {
            /// All opcodes in discriminant order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Number of opcodes.
            pub const COUNT: usize = Self::ALL.len();

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the number of operands this opcode takes.
            pub const fn arity(&self) -> usize {
                match self {
                    $( Opcode::$name => <[&str]>::len(&[ $( stringify!($field) ),* ]), )*
                }
            }

            /// Looks up an opcode by its exact (case-sensitive) mnemonic.
            pub fn from_mnemonic(name: &str) -> Option<Opcode> {
                match name {
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_instruction!(define_opcodes);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One of the six machine registers.
///
/// `P` is the program counter and `X` the step counter; both are also addressable
/// as ordinary operands.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    A,
    B,
    C,
    D,
    P,
    X,
}

impl Register {
    /// All registers in storage order.
    pub const ALL: [Register; 6] = [
        Register::A,
        Register::B,
        Register::C,
        Register::D,
        Register::P,
        Register::X,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::P => "P",
            Register::X => "X",
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Register::A),
            "B" => Ok(Register::B),
            "C" => Ok(Register::C),
            "D" => Ok(Register::D),
            "P" => Ok(Register::P),
            "X" => Ok(Register::X),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
