use crate::virtual_machine::isa::Opcode;

/// Per-opcode count of dispatched instructions.
///
/// Backed by a flat array indexed by the [`Opcode`] discriminant, so recording a
/// step is a single increment on the hot path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecProfile {
    counts: [u64; Opcode::COUNT],
}

impl Default for ExecProfile {
    fn default() -> Self {
        Self {
            counts: [0; Opcode::COUNT],
        }
    }
}

impl ExecProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one dispatch of `opcode`.
    #[inline(always)]
    pub fn record(&mut self, opcode: Opcode) {
        let slot = &mut self.counts[opcode as usize];
        *slot = slot.saturating_add(1);
    }

    /// Returns how many times `opcode` was dispatched.
    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts[opcode as usize]
    }

    /// Returns the number of dispatches across all opcodes.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Returns an iterator over all opcodes and their counts.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u64)> + '_ {
        Opcode::ALL.iter().copied().zip(self.counts)
    }
}

/// Formats `n` with `,` between every group of three digits.
pub fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Renders the profile as an aligned table, skipping opcodes that never ran.
pub fn render_profile(profile: &ExecProfile) -> String {
    let total = profile.total();
    let name_w = 2 + profile
        .iter()
        .map(|(op, _)| op.mnemonic().len())
        .max()
        .unwrap_or(0)
        .max("total".len());
    let count_w = format_with_commas(total).len();
    let dash_w = name_w + 1 + count_w + 2 + "( 100.0%)".len();

    let mut out = String::new();
    out.push_str("Execution Profile:\n");
    out.push_str(&"-".repeat(dash_w));
    out.push('\n');

    for (opcode, count) in profile.iter().filter(|&(_, count)| count > 0) {
        let percent = (count as f64 / total as f64) * 100.0;
        out.push_str(&format!(
            "{:<name_w$} {:>count_w$} ({:>5.1}%)\n",
            opcode.mnemonic(),
            format_with_commas(count),
            percent,
        ));
    }

    out.push_str(&"-".repeat(dash_w));
    out.push('\n');
    out.push_str(&format!(
        "{:<name_w$} {:>count_w$} ({:>5.1}%)\n",
        "total",
        format_with_commas(total),
        100.0,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_total() {
        let mut profile = ExecProfile::new();
        profile.record(Opcode::Add);
        profile.record(Opcode::Add);
        profile.record(Opcode::Print);
        assert_eq!(profile.count(Opcode::Add), 2);
        assert_eq!(profile.count(Opcode::J), 0);
        assert_eq!(profile.total(), 3);
        assert_eq!(profile.iter().count(), Opcode::COUNT);
    }

    #[test]
    fn commas() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1000), "1,000");
        assert_eq!(format_with_commas(1_000_001), "1,000,001");
    }

    #[test]
    fn render_lists_only_used_opcodes() {
        let mut profile = ExecProfile::new();
        for _ in 0..3 {
            profile.record(Opcode::LoadI);
        }
        profile.record(Opcode::Print);
        let table = render_profile(&profile);
        assert!(table.starts_with("Execution Profile:\n"));
        assert!(table.contains("LOADI"));
        assert!(table.contains(" 75.0%"));
        assert!(table.contains(" 25.0%"));
        assert!(!table.contains("STOREA"));
        assert!(table.lines().last().unwrap().starts_with("total"));
    }

    #[test]
    fn render_empty_profile() {
        let table = render_profile(&ExecProfile::new());
        assert!(table.contains("total"));
    }
}
