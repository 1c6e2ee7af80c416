use super::registers::check_magnitude;
use crate::virtual_machine::config::MEMORY_SIZE;
use crate::virtual_machine::errors::Fault;

/// Fixed-size bank of bounded integer cells.
///
/// Addresses are plain `i64` values as they come out of registers or immediates;
/// anything outside `0..MEMORY_SIZE` is an addressing fault. There is no wraparound
/// and no resizing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    cells: Box<[i64]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Creates a zeroed bank of [`MEMORY_SIZE`] cells.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Converts `index` to a slot, or returns [`Fault::AddressOutOfRange`].
    fn slot(&self, index: i64) -> Result<usize, Fault> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.cells.len())
            .ok_or(Fault::AddressOutOfRange {
                index,
                size: self.cells.len(),
            })
    }

    /// Reads the cell at `index`.
    pub fn read(&self, index: i64) -> Result<i64, Fault> {
        let slot = self.slot(index)?;
        Ok(self.cells[slot])
    }

    /// Writes `value` at `index`.
    ///
    /// The magnitude of `value` is checked before the address, so an oversized value
    /// reports [`Fault::Overflow`] even when the address is also bad.
    pub fn write(&mut self, instr: &'static str, index: i64, value: i64) -> Result<(), Fault> {
        check_magnitude(instr, value)?;
        let slot = self.slot(index)?;
        self.cells[slot] = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the raw cells.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::config::MAGNITUDE_LIMIT;

    #[test]
    fn starts_zeroed() {
        let mem = Memory::new();
        assert_eq!(mem.len(), 2048);
        assert!(mem.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn last_cell_is_addressable() {
        let mut mem = Memory::new();
        mem.write("STOREA", 2047, 9).unwrap();
        assert_eq!(mem.read(2047).unwrap(), 9);
    }

    #[test]
    fn out_of_range_addresses() {
        let mut mem = Memory::new();
        assert_eq!(
            mem.write("STOREA", 2048, 1),
            Err(Fault::AddressOutOfRange {
                index: 2048,
                size: 2048
            })
        );
        assert_eq!(
            mem.read(-1),
            Err(Fault::AddressOutOfRange {
                index: -1,
                size: 2048
            })
        );
        assert!(mem.read(i64::MIN).is_err());
    }

    #[test]
    fn magnitude_checked_before_address() {
        let mut mem = Memory::new();
        let err = mem.write("STORE", -5, MAGNITUDE_LIMIT + 1).unwrap_err();
        assert!(matches!(err, Fault::Overflow { .. }));
        assert!(mem.cells().iter().all(|&c| c == 0));
    }
}
