use crate::virtual_machine::config::MAGNITUDE_LIMIT;
use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::isa::Register;

/// Register file holding the six machine registers.
///
/// Backed by a fixed array indexed by the [`Register`] discriminant. All registers
/// start at zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    regs: [i64; Register::ALL.len()],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value held in `reg`.
    pub fn get(&self, reg: Register) -> i64 {
        self.regs[reg as usize]
    }

    /// Stores `value` into `reg` after checking the magnitude bound.
    ///
    /// Returns [`Fault::Overflow`] and leaves the register untouched if
    /// `|value| > 2^42`.
    pub fn set(&mut self, instr: &'static str, reg: Register, value: i64) -> Result<(), Fault> {
        check_magnitude(instr, value)?;
        self.regs[reg as usize] = value;
        Ok(())
    }

    /// Stores `value` into `reg` without any bound check.
    ///
    /// Used where the machine deliberately does not cap values: `MOVE`, the `ADDI`
    /// result and the per-step counter updates. Jumps check their target first.
    pub fn assign(&mut self, reg: Register, value: i64) {
        self.regs[reg as usize] = value;
    }
}

/// Rejects values whose magnitude exceeds [`MAGNITUDE_LIMIT`].
pub(crate) fn check_magnitude(instr: &'static str, value: i64) -> Result<(), Fault> {
    if value.unsigned_abs() > MAGNITUDE_LIMIT as u64 {
        return Err(Fault::Overflow {
            instruction: instr,
            value,
            limit: MAGNITUDE_LIMIT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let regs = Registers::new();
        assert!(Register::ALL.into_iter().all(|r| regs.get(r) == 0));
    }

    #[test]
    fn set_accepts_bound() {
        let mut regs = Registers::new();
        regs.set("LOADI", Register::A, MAGNITUDE_LIMIT).unwrap();
        regs.set("LOADI", Register::B, -MAGNITUDE_LIMIT).unwrap();
        assert_eq!(regs.get(Register::A), MAGNITUDE_LIMIT);
        assert_eq!(regs.get(Register::B), -MAGNITUDE_LIMIT);
    }

    #[test]
    fn set_rejects_past_bound_without_writing() {
        let mut regs = Registers::new();
        regs.assign(Register::C, 7);
        let err = regs
            .set("LOADI", Register::C, MAGNITUDE_LIMIT + 1)
            .unwrap_err();
        assert!(matches!(
            err,
            Fault::Overflow {
                instruction: "LOADI",
                value,
                ..
            } if value == MAGNITUDE_LIMIT + 1
        ));
        assert_eq!(regs.get(Register::C), 7);
    }

    #[test]
    fn extreme_values_do_not_panic() {
        assert!(check_magnitude("ADD", i64::MIN).is_err());
        assert!(check_magnitude("ADD", i64::MAX).is_err());
    }

    #[test]
    fn assign_is_unchecked() {
        let mut regs = Registers::new();
        regs.assign(Register::P, i64::MAX);
        assert_eq!(regs.get(Register::P), i64::MAX);
    }
}
