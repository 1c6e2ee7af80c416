//! Machine geometry and run-time configuration.

/// Number of memory cells.
pub const MEMORY_SIZE: usize = 2048;

/// Exclusive upper bound of a valid program counter.
pub const PROGRAM_COUNTER_LIMIT: i64 = 10_000;

/// Largest magnitude a checked register or memory write may hold (2^42).
pub const MAGNITUDE_LIMIT: i64 = 1 << 42;

/// Default ceiling for the step counter `X`.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// What the engine does with a line whose mnemonic it does not recognise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownOpcodePolicy {
    /// Stop with a decode fault.
    #[default]
    Fault,
    /// Change nothing, but still advance `P` and `X` as if the line had run.
    Skip,
}

/// Run-time knobs for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// The run faults once `X` exceeds this value.
    pub step_limit: u64,
    pub unknown_opcode: UnknownOpcodePolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            unknown_opcode: UnknownOpcodePolicy::default(),
        }
    }
}

impl MachineConfig {
    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_unknown_opcode(mut self, policy: UnknownOpcodePolicy) -> Self {
        self.unknown_opcode = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.step_limit, 1_000_000);
        assert_eq!(config.unknown_opcode, UnknownOpcodePolicy::Fault);
        assert_eq!(MAGNITUDE_LIMIT, 4_398_046_511_104);
    }

    #[test]
    fn builders() {
        let config = MachineConfig::default()
            .with_step_limit(5)
            .with_unknown_opcode(UnknownOpcodePolicy::Skip);
        assert_eq!(config.step_limit, 5);
        assert_eq!(config.unknown_opcode, UnknownOpcodePolicy::Skip);
    }
}
