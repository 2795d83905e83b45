//! # Spatial Position Broker
//!
//! Answers "who is near me" for many concurrent actors.
//!
//! The world is split into a uniform grid. Every sprite sits in exactly
//! one cell, picked from its last reported position. A proximity query
//! unions the cells overlapping the query square, so results are a
//! superset of the true circle: false positives yes, false negatives
//! never.

mod grid;

pub use grid::PositionBroker;

use serde::{Deserialize, Serialize};

/// Grid dimensions.
///
/// The grid is centred on the origin and spans
/// `[-cells_x * cell_size / 2, cells_x * cell_size / 2)` along X (and the
/// same along Y). Positions outside are clamped into the edge cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of cells along X.
    pub cells_x: usize,
    /// Number of cells along Y.
    pub cells_y: usize,
    /// Edge length of one cell in world units.
    pub cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cells_x: 1000,
            cells_y: 1000,
            cell_size: 20.0,
        }
    }
}

impl GridConfig {
    /// Largest grid a position broker will allocate.
    pub const MAX_CELLS: usize = 4_000_000;

    /// Total number of cells, or `None` if the product overflows.
    #[must_use]
    pub const fn cell_count(&self) -> Option<usize> {
        self.cells_x.checked_mul(self.cells_y)
    }

    /// Whether the grid has cells on both axes and at most
    /// [`GridConfig::MAX_CELLS`] in total.
    #[must_use]
    pub const fn fits(&self) -> bool {
        match self.cell_count() {
            Some(count) => count > 0 && count <= Self::MAX_CELLS,
            None => false,
        }
    }

    /// The nearest grid that [`fits`](Self::fits): each axis gets at
    /// least one cell, then Y shrinks until the total is within
    /// [`GridConfig::MAX_CELLS`].
    #[must_use]
    pub fn clamped(&self) -> Self {
        let cells_x = self.cells_x.clamp(1, Self::MAX_CELLS);
        Self {
            cells_x,
            cells_y: self.cells_y.clamp(1, Self::MAX_CELLS / cells_x),
            ..*self
        }
    }

    /// Column for a world X, clamped to the grid.
    #[inline]
    #[must_use]
    pub fn column(&self, x: f64) -> usize {
        Self::axis_index(x, self.cell_size, self.cells_x)
    }

    /// Row for a world Y, clamped to the grid.
    #[inline]
    #[must_use]
    pub fn row(&self, y: f64) -> usize {
        Self::axis_index(y, self.cell_size, self.cells_y)
    }

    /// Flat cell index for a world position.
    #[inline]
    #[must_use]
    pub fn cell_index(&self, x: f64, y: f64) -> usize {
        self.row(y) * self.cells_x + self.column(x)
    }

    fn axis_index(coord: f64, cell_size: f64, cells: usize) -> usize {
        let raw = (coord / cell_size + (cells / 2) as f64).floor();
        if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(cells.saturating_sub(1))
        }
    }
}
