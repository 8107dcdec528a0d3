//! The shared two-dimensional instruction memory.
//!
//! A [`Grid`] is a fixed `rows x cols` array of [`Opcode`] cells plus an
//! equally sized allocation bitmap. It owns no organisms; the bitmap is kept
//! consistent with the live roster by the organism lifecycle code.
//!
//! Coordinates are `[row, column]` and bounded: there is no wraparound.
//! Every operation has a defined out-of-bounds behaviour instead of an
//! error:
//!
//! - reads return [`Opcode::EMPTY`],
//! - writes and (de)allocations are silent no-ops,
//! - region queries return `None` so that scans know to stop.

use core::ops::Range;

use fungera_types::{ALPHABET_SIZE, Opcode, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::genome::Genome;

/// Shared instruction memory plus allocation bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "GridRepr", try_from = "GridRepr")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Opcode>,
    allocated: Vec<bool>,
}

/// A bounds-checked rectangle of cell coordinates.
#[derive(Debug, Clone)]
struct Region {
    rows: Range<usize>,
    cols: Range<usize>,
}

impl Grid {
    /// Create an empty, fully unallocated grid.
    pub fn new(rows: usize, cols: usize) -> Result<Self, WorldError> {
        let total = rows
            .checked_mul(cols)
            .filter(|total| *total > 0)
            .ok_or(WorldError::InvalidDimensions { rows, cols })?;
        Ok(Self {
            rows,
            cols,
            cells: vec![Opcode::EMPTY; total],
            allocated: vec![false; total],
        })
    }

    /// `[rows, cols]` as a vector.
    pub fn dimensions(&self) -> Vec2 {
        Vec2::new(to_coord(self.rows), to_coord(self.cols))
    }

    /// Total number of cells.
    pub const fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `pos` addresses a cell of this grid.
    pub fn contains(&self, pos: Vec2) -> bool {
        self.index(pos).is_some()
    }

    fn index(&self, pos: Vec2) -> Option<usize> {
        let row = usize::try_from(pos.row).ok()?;
        let col = usize::try_from(pos.col).ok()?;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.flat(row, col)
    }

    fn flat(&self, row: usize, col: usize) -> Option<usize> {
        row.checked_mul(self.cols)?.checked_add(col)
    }

    /// Resolve a region to cell ranges. `None` when any part of it falls
    /// outside the grid. Negative extents are treated as empty.
    fn region(&self, pos: Vec2, size: Vec2) -> Option<Region> {
        let row = usize::try_from(pos.row).ok()?;
        let col = usize::try_from(pos.col).ok()?;
        let height = usize::try_from(size.row.max(0)).ok()?;
        let width = usize::try_from(size.col.max(0)).ok()?;
        let row_end = row.checked_add(height)?;
        let col_end = col.checked_add(width)?;
        (row_end <= self.rows && col_end <= self.cols).then_some(Region {
            rows: row..row_end,
            cols: col..col_end,
        })
    }

    fn region_indices(&self, region: Region) -> impl Iterator<Item = usize> + '_ {
        let Region { rows, cols } = region;
        rows.flat_map(move |r| cols.clone().filter_map(move |c| self.flat(r, c)))
    }

    /// Whether the cell at `pos` is allocated. `false` when out of bounds.
    pub fn is_allocated(&self, pos: Vec2) -> bool {
        self.index(pos)
            .and_then(|i| self.allocated.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Whether any cell of the region is allocated.
    ///
    /// Returns `None` when the region is partially or fully out of bounds;
    /// callers scanning for space must stop at that point.
    pub fn is_allocated_region(&self, pos: Vec2, size: Vec2) -> Option<bool> {
        let region = self.region(pos, size)?;
        Some(
            self.region_indices(region)
                .any(|i| self.allocated.get(i).copied().unwrap_or(false)),
        )
    }

    /// Mark a region allocated. Silently ignored if out of bounds.
    pub fn allocate(&mut self, pos: Vec2, size: Vec2) {
        self.set_region(pos, size, true);
    }

    /// Clear a region's allocation. Silently ignored if out of bounds.
    pub fn deallocate(&mut self, pos: Vec2, size: Vec2) {
        self.set_region(pos, size, false);
    }

    fn set_region(&mut self, pos: Vec2, size: Vec2, value: bool) {
        let Some(region) = self.region(pos, size) else {
            return;
        };
        let indices: Vec<usize> = self.region_indices(region).collect();
        for i in indices {
            if let Some(slot) = self.allocated.get_mut(i) {
                *slot = value;
            }
        }
    }

    /// Read one cell. Out-of-bounds reads return [`Opcode::EMPTY`].
    pub fn read(&self, pos: Vec2) -> Opcode {
        self.index(pos)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(Opcode::EMPTY)
    }

    /// Write one cell. Silently ignored if out of bounds.
    pub fn write(&mut self, pos: Vec2, op: Opcode) {
        if let Some(cell) = self.index(pos).and_then(|i| self.cells.get_mut(i)) {
            *cell = op;
        }
    }

    /// Reduce `vector` to an opcode (first component modulo the alphabet
    /// size) and write it at `pos`.
    pub fn write_opcode_from_vector(&mut self, pos: Vec2, vector: Vec2) {
        self.write(pos, Opcode::from_vector(vector));
    }

    /// Overwrite one uniformly random cell with a uniformly random opcode,
    /// regardless of allocation. Returns the position that was hit.
    pub fn mutate_random_cell(&mut self, rng: &mut impl Rng) -> Vec2 {
        let row = rng.random_range(0..self.rows);
        let col = rng.random_range(0..self.cols);
        let op = Opcode::ALL
            .get(rng.random_range(0..ALPHABET_SIZE))
            .copied()
            .unwrap_or(Opcode::EMPTY);
        let pos = Vec2::new(to_coord(row), to_coord(col));
        self.write(pos, op);
        pos
    }

    /// First cell where the bitmap disagrees with `regions`, which should
    /// tile the allocated cells exactly.
    ///
    /// A region leaving the grid reports its start; a cell covered by two
    /// regions reports that cell.
    pub fn allocation_mismatch<I>(&self, regions: I) -> Option<Vec2>
    where
        I: IntoIterator<Item = (Vec2, Vec2)>,
    {
        let mut expected = vec![false; self.cell_count()];
        for (pos, size) in regions {
            let Some(region) = self.region(pos, size) else {
                return Some(pos);
            };
            for i in self.region_indices(region) {
                match expected.get_mut(i) {
                    Some(slot) if !*slot => *slot = true,
                    _ => return Some(self.position(i)),
                }
            }
        }
        self.allocated
            .iter()
            .zip(&expected)
            .position(|(actual, wanted)| actual != wanted)
            .map(|i| self.position(i))
    }

    fn position(&self, i: usize) -> Vec2 {
        let row = i.checked_div(self.cols).unwrap_or(0);
        let col = i.checked_rem(self.cols).unwrap_or(0);
        Vec2::new(to_coord(row), to_coord(col))
    }

    /// Number of allocated cells.
    pub fn allocated_count(&self) -> usize {
        self.allocated.iter().filter(|a| **a).count()
    }

    /// Fraction of cells currently allocated, in `[0, 1]`.
    pub fn allocated_ratio(&self) -> f64 {
        let total = self.cell_count();
        if total == 0 {
            return 0.0;
        }
        to_f64(self.allocated_count()) / to_f64(total)
    }

    /// Write a genome verbatim with its top-left corner at `address`.
    ///
    /// Nothing is written unless the whole genome fits. Allocation is left
    /// to the organism that will own the region.
    pub fn load_genome(&mut self, genome: &Genome, address: Vec2) -> Result<(), WorldError> {
        let size = genome.size();
        if self.region(address, size).is_none() {
            return Err(WorldError::GenomeOutOfBounds { address, size });
        }
        for (r, row) in genome.rows().iter().enumerate() {
            for (c, op) in row.iter().enumerate() {
                let pos = address.wrapping_add(Vec2::new(to_coord(r), to_coord(c)));
                self.write(pos, *op);
            }
        }
        tracing::debug!(%address, %size, "genome written to grid");
        Ok(())
    }

    /// One row of cells rendered as opcode characters.
    pub fn row_text(&self, row: usize) -> Option<String> {
        let start = self.flat(row, 0)?;
        let end = start.checked_add(self.cols)?;
        self.cells
            .get(start..end)
            .map(|cells| cells.iter().map(|op| op.symbol()).collect())
    }
}

/// Convert a grid index to a coordinate component.
fn to_coord(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Lossless for every realistic grid size.
fn to_f64(n: usize) -> f64 {
    u32::try_from(n).map_or(f64::from(u32::MAX), f64::from)
}

/// Compact on-disk form: one string per row for cells and for the bitmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GridRepr {
    rows: usize,
    cols: usize,
    cells: Vec<String>,
    allocated: Vec<String>,
}

impl From<Grid> for GridRepr {
    fn from(grid: Grid) -> Self {
        let cells = (0..grid.rows).filter_map(|r| grid.row_text(r)).collect();
        let allocated = grid
            .allocated
            .chunks(grid.cols.max(1))
            .map(|row| row.iter().map(|a| if *a { '1' } else { '0' }).collect())
            .collect();
        Self {
            rows: grid.rows,
            cols: grid.cols,
            cells,
            allocated,
        }
    }
}

impl TryFrom<GridRepr> for Grid {
    type Error = WorldError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let mut grid = Self::new(repr.rows, repr.cols)?;
        if repr.cells.len() != repr.rows || repr.allocated.len() != repr.rows {
            return Err(WorldError::MalformedGrid(format!(
                "expected {} rows, found {} cell rows and {} bitmap rows",
                repr.rows,
                repr.cells.len(),
                repr.allocated.len()
            )));
        }
        for (r, (cells, bits)) in repr.cells.iter().zip(&repr.allocated).enumerate() {
            if cells.chars().count() != repr.cols || bits.chars().count() != repr.cols {
                return Err(WorldError::MalformedGrid(format!(
                    "row {r} does not have {} columns",
                    repr.cols
                )));
            }
            for (c, (symbol, bit)) in cells.chars().zip(bits.chars()).enumerate() {
                let op = Opcode::from_symbol(symbol).ok_or(WorldError::UnknownOpcode {
                    symbol,
                    line: r.saturating_add(1),
                    column: c.saturating_add(1),
                })?;
                let i = grid
                    .flat(r, c)
                    .ok_or_else(|| WorldError::MalformedGrid(format!("cell {r},{c} overflows")))?;
                if let Some(cell) = grid.cells.get_mut(i) {
                    *cell = op;
                }
                if let Some(slot) = grid.allocated.get_mut(i) {
                    *slot = match bit {
                        '0' => false,
                        '1' => true,
                        other => {
                            return Err(WorldError::MalformedGrid(format!(
                                "bitmap cell {r},{c} is {other:?}"
                            )));
                        }
                    };
                }
            }
        }
        Ok(grid)
    }
}
