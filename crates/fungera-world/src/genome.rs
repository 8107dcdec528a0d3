//! Genome text files and the built-in seed genome.
//!
//! A genome is a rectangular block of opcodes. On disk it is plain text,
//! one grid row per line. Leading and trailing whitespace is trimmed, blank
//! lines are skipped, and short rows are padded with `.` to the widest row.

use std::path::Path;

use fungera_types::{Opcode, Vec2};

use crate::error::WorldError;

/// The ancestor written to disk when no genome file exists.
///
/// Its copy loop counts with `-` as a decrement. With `-` incrementing, as
/// in this instruction table, it never completes a split on its own.
pub const SEED_GENOME: [&str; 17] = [
    "v$<...vdc@<>..@cd>Sb.v.",
    ">....v>Sbv^^b?bP<......",
    "..b......>...........v.",
    "va0aS<>....>..?d^>?avv.",
    ">1d::.^a-a-a-ax-..a&<..",
    ".v.<cS.dSaSbdWbaL<vc?<<",
    "..^..a+aPc0d0<>..^>..v.",
    ".>v.>..+yd?yc^^.>...v&.",
    "v<..^ay+cy-.aPdP..cP<b.",
    "@..^.bdWbaL....<^cx?<..",
    "c.>.+xa+xd-xc.......^:.",
    "d^<.vd0.....cab~b+by+<.",
    ">v.vb-b0bP<^b?b-..<.<..",
    "d..S>PbSb?b^>-b?bv^.^..",
    "c.^b.............<.....",
    "@>...................:^",
    "^..<...................",
];

/// A rectangular block of opcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    rows: Vec<Vec<Opcode>>,
    width: usize,
}

impl Genome {
    /// Parse genome text.
    pub fn parse(text: &str) -> Result<Self, WorldError> {
        let mut rows: Vec<Vec<Opcode>> = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let row = trimmed
                .chars()
                .enumerate()
                .map(|(col, symbol)| {
                    Opcode::from_symbol(symbol).ok_or(WorldError::UnknownOpcode {
                        symbol,
                        line: line_no.saturating_add(1),
                        column: col.saturating_add(1),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let width = rows.iter().map(Vec::len).max().ok_or(WorldError::EmptyGenome)?;
        for row in &mut rows {
            row.resize(width, Opcode::EMPTY);
        }
        Ok(Self { rows, width })
    }

    /// Read and parse a genome file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The built-in seed genome.
    pub fn seed() -> Self {
        let rows: Vec<Vec<Opcode>> = SEED_GENOME
            .iter()
            .map(|line| line.chars().filter_map(Opcode::from_symbol).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, width }
    }

    /// Rows of opcodes, all of equal width.
    pub fn rows(&self) -> &[Vec<Opcode>] {
        &self.rows
    }

    /// `[height, width]`.
    pub fn size(&self) -> Vec2 {
        Vec2::new(
            i64::try_from(self.rows.len()).unwrap_or(i64::MAX),
            i64::try_from(self.width).unwrap_or(i64::MAX),
        )
    }

    /// Render back to genome text, one line per row.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.extend(row.iter().map(|op| op.symbol()));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seed_genome_is_rectangular_and_complete() {
        let genome = Genome::seed();
        assert_eq!(genome.size(), Vec2::new(17, 23));
        assert!(genome.rows().iter().all(|r| r.len() == 23));
        assert_eq!(Genome::parse(&genome.to_text()).unwrap(), genome);
    }

    #[test]
    fn parse_trims_skips_blank_lines_and_pads() {
        let genome = Genome::parse("  ab  \n\n\n1\n   \n:.:\n").unwrap();
        assert_eq!(genome.size(), Vec2::new(3, 3));
        assert_eq!(genome.to_text(), "ab.\n1..\n:.:\n");
    }

    #[test]
    fn unknown_characters_report_their_position() {
        let err = Genome::parse("ab\nc#\n").unwrap_err();
        assert!(matches!(
            err,
            WorldError::UnknownOpcode { symbol: '#', line: 2, column: 2 }
        ));
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(matches!(Genome::parse("\n  \n"), Err(WorldError::EmptyGenome)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("fungera-no-such-genome.gen");
        assert!(matches!(Genome::from_file(path), Err(WorldError::Io { .. })));
    }
}
