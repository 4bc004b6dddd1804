// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The accumulator: a histogram of how many orbits passed through each
//! cell.  Counts only ever go up.

use crate::planes::Pixel;

/// A `width x height` matrix of visit counts, stored row-major with row
/// zero at the top of the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Grid {
    /// A grid with every count at zero.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![0 as u32; width * height],
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bump the count of the cell at `pixel`.  Returns false, and leaves
    /// the grid alone, when the pixel is off the grid.  Counts saturate
    /// rather than wrap.
    pub fn increment(&mut self, pixel: Pixel) -> bool {
        let Pixel(column, row) = pixel;
        if column >= self.width || row >= self.height {
            return false;
        }
        let cell = &mut self.cells[row * self.width + column];
        *cell = cell.saturating_add(1);
        true
    }

    /// The count at `column, row`, if that cell exists.
    pub fn get(&self, column: usize, row: usize) -> Option<u32> {
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(self.cells[row * self.width + column])
    }

    /// The largest count in the grid; zero for an empty histogram.
    pub fn max_value(&self) -> u32 {
        self.cells.iter().cloned().max().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// The rows of the grid, top first.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.width.max(1))
    }

    /// The raw counts, row-major.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}
