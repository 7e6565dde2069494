//! Identifier grid — one feature id per output cell.
//!
//! The grid starts as all water and only changes through `paint`, which
//! the rasterizer drives once per shape. Later paints replace earlier ones
//! cell by cell, so draw order decides which feature a cell reports.

use crate::error::GridError;
use crate::types::{Cell, FeatureId, GridSpace, WATER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierGrid {
    space: GridSpace,
    cells: Vec<FeatureId>,
}

impl IdentifierGrid {
    /// Allocate an all-water grid for `space`.
    pub fn new(space: GridSpace) -> Result<Self, GridError> {
        let len = space.cell_count();
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|e| GridError::Allocation(format!("grid of {len} cells: {e}")))?;
        cells.resize(len, WATER);
        Ok(Self { space, cells })
    }

    pub fn space(&self) -> GridSpace {
        self.space
    }

    pub fn cols(&self) -> u32 {
        self.space.cols
    }

    pub fn rows(&self) -> u32 {
        self.space.rows
    }

    /// Mark every cell in `cells` with `id`. Cells outside the grid are
    /// skipped. Returns how many cells were written.
    pub fn paint<I>(&mut self, cells: I, id: FeatureId) -> usize
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut painted = 0;
        let mut clipped = 0;
        for cell in cells {
            match self.index_of(cell) {
                Some(index) => {
                    self.cells[index] = id;
                    painted += 1;
                }
                None => clipped += 1,
            }
        }
        if clipped > 0 {
            log::warn!("feature {id}: {clipped} cells outside the grid were skipped");
        }
        painted
    }

    pub fn cell_at(&self, row: u32, col: u32) -> Option<FeatureId> {
        self.index_of(Cell::new(row, col)).map(|i| self.cells[i])
    }

    /// Row-major iteration, one slice per grid row.
    pub fn row_slices(&self) -> impl Iterator<Item = &[FeatureId]> {
        let cols = self.space.cols as usize;
        (0..self.space.rows as usize).map(move |row| &self.cells[row * cols..(row + 1) * cols])
    }

    pub fn has_water(&self) -> bool {
        self.cells.contains(&WATER)
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        self.space
            .contains(cell)
            .then(|| cell.row as usize * self.space.cols as usize + cell.col as usize)
    }
}
