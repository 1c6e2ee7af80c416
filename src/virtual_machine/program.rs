//! Program text storage and the sentinel-terminated loader.
//!
//! [`Program`] is the immutable line store the engine fetches from. Collecting lines
//! from a reader up to the `END` sentinel is the loader's job
//! ([`read_until_sentinel`]); the store itself never sees the sentinel.

use std::io::{self, BufRead};

/// Line that terminates program input. Not itself an instruction.
pub const SENTINEL: &str = "END";

/// Ordered, immutable sequence of raw instruction lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<String>,
}

impl Program {
    /// Builds a program from already-collected lines, trimming surrounding whitespace.
    pub fn load<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|line| line.as_ref().trim().to_string())
                .collect(),
        }
    }

    /// Returns the line at program counter `pc`, or `None` outside the program.
    pub fn fetch(&self, pc: i64) -> Option<&str> {
        usize::try_from(pc)
            .ok()
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Reads lines from `reader` until the [`SENTINEL`] line.
///
/// Returns the program and whether the sentinel was actually seen; end of input
/// without it still yields everything read so far.
pub fn read_until_sentinel<R: BufRead>(reader: R) -> io::Result<(Program, bool)> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim() == SENTINEL {
            return Ok((Program::load(lines), true));
        }
        lines.push(line);
    }
    Ok((Program::load(lines), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn load_trims_lines() {
        let program = Program::load(["  LOADI A 5 ", "\tPRINT A"]);
        assert_eq!(program.lines(), ["LOADI A 5", "PRINT A"]);
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn fetch_bounds() {
        let program = Program::load(["HALT"]);
        assert_eq!(program.fetch(0), Some("HALT"));
        assert_eq!(program.fetch(1), None);
        assert_eq!(program.fetch(-1), None);
    }

    #[test]
    fn reader_stops_at_sentinel() {
        let input = Cursor::new("LOADI A 1\nPRINT A\n END \nPRINT B\n");
        let (program, terminated) = read_until_sentinel(input).unwrap();
        assert!(terminated);
        assert_eq!(program.lines(), ["LOADI A 1", "PRINT A"]);
    }

    #[test]
    fn reader_accepts_missing_sentinel() {
        let (program, terminated) = read_until_sentinel(Cursor::new("PRINT A")).unwrap();
        assert!(!terminated);
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn sentinel_only_is_empty() {
        let (program, terminated) = read_until_sentinel(Cursor::new("END\n")).unwrap();
        assert!(terminated);
        assert!(program.is_empty());
    }
}
