use lah_derive::Error;

/// Reasons a line of program text cannot be decoded into an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The line holds no tokens at all.
    #[error("missing opcode")]
    MissingOpcode,
    /// The first token is not a known mnemonic.
    #[error("unknown instruction '{mnemonic}'")]
    UnknownOpcode { mnemonic: String },
    /// Wrong number of operands for an instruction.
    #[error("{instruction} expects {expected} operand(s), got {actual}")]
    ArityMismatch {
        instruction: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Expected one of `A B C D P X`.
    #[error("expected register, got '{token}'")]
    InvalidRegister { token: String },
    /// Expected a signed decimal integer.
    #[error("expected integer, got '{token}'")]
    InvalidInteger { token: String },
}

/// Faults that end a run.
///
/// All of them are reported to the user with the same diagnostic line; the variant
/// (and [`Fault::kind`]) keeps the cause distinguishable for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Memory index outside the bank.
    #[error("memory address {index} out of range (size {size})")]
    #[exit_code(10)]
    AddressOutOfRange { index: i64, size: usize },
    /// Program counter outside the addressable program range.
    #[error("program counter {pc} out of range (limit {limit})")]
    #[exit_code(10)]
    ProgramCounterOutOfRange { pc: i64, limit: i64 },
    /// A value's magnitude exceeds the machine bound.
    #[error("{instruction}: value {value} exceeds magnitude limit {limit}")]
    #[exit_code(11)]
    Overflow {
        instruction: &'static str,
        value: i64,
        limit: i64,
    },
    /// Arithmetic left the 64-bit range before the magnitude check could run.
    #[error("{instruction}: arithmetic overflow")]
    #[exit_code(11)]
    ArithmeticOverflow { instruction: &'static str },
    /// Division by a zero register.
    #[error("division by zero")]
    #[exit_code(12)]
    DivisionByZero,
    /// The step counter passed the configured ceiling.
    #[error("step limit of {limit} exceeded")]
    #[exit_code(13)]
    StepLimitExceeded { limit: u64 },
    /// The instruction at the program counter could not be decoded.
    #[error("column {column}: {reason}")]
    #[exit_code(14)]
    Decode { column: usize, reason: DecodeError },
    /// Writing to the output stream failed.
    #[error("output error: {0}")]
    #[exit_code(1)]
    Io(String),
}

/// Coarse fault taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Address,
    Overflow,
    Division,
    StepLimit,
    Decode,
    Io,
}

impl Fault {
    /// Returns the taxonomy bucket of this fault.
    pub const fn kind(&self) -> FaultKind {
        match self {
            Fault::AddressOutOfRange { .. } | Fault::ProgramCounterOutOfRange { .. } => {
                FaultKind::Address
            }
            Fault::Overflow { .. } | Fault::ArithmeticOverflow { .. } => FaultKind::Overflow,
            Fault::DivisionByZero => FaultKind::Division,
            Fault::StepLimitExceeded { .. } => FaultKind::StepLimit,
            Fault::Decode { .. } => FaultKind::Decode,
            Fault::Io(_) => FaultKind::Io,
        }
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Fault::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let fault = Fault::AddressOutOfRange {
            index: 2048,
            size: 2048,
        };
        assert_eq!(fault.to_string(), "memory address 2048 out of range (size 2048)");

        let fault = Fault::Decode {
            column: 7,
            reason: DecodeError::InvalidRegister {
                token: "Q".to_string(),
            },
        };
        assert_eq!(fault.to_string(), "column 7: expected register, got 'Q'");
    }

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(Fault::DivisionByZero.exit_code(), 12);
        assert_eq!(Fault::StepLimitExceeded { limit: 1 }.exit_code(), 13);
        assert_eq!(Fault::Io("closed".into()).exit_code(), 1);
        assert_eq!(
            Fault::ProgramCounterOutOfRange { pc: -1, limit: 10 }.exit_code(),
            Fault::AddressOutOfRange { index: -1, size: 1 }.exit_code()
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(
            Fault::ArithmeticOverflow { instruction: "MUL" }.kind(),
            FaultKind::Overflow
        );
        assert_eq!(
            Fault::Decode {
                column: 1,
                reason: DecodeError::MissingOpcode
            }
            .kind(),
            FaultKind::Decode
        );
    }
}
