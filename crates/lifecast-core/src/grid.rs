//! Rectangular boolean matrix holding one generation of cells.
//!
//! The grid is stored row-major in a single flat vector. Access outside
//! the current bounds reads as dead and writes are refused, which is
//! exactly the finite-boundary rule the step engine needs: cells past the
//! edge never count as neighbours.

/// One generation of cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create an all-dead grid of the given size.
    ///
    /// Zero on either axis produces a degenerate grid with no cells.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows.checked_mul(cols).unwrap_or(0)],
        }
    }

    /// Build a grid from text rows where `#` marks a live cell.
    ///
    /// Any other character is dead. The column count is the longest row;
    /// shorter rows are padded with dead cells.
    pub fn from_pattern(rows: &[&str]) -> Self {
        let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(rows.len(), cols);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == '#' {
                    grid.set(row, col, true);
                }
            }
        }
        grid
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the grid has zero rows or zero columns.
    pub const fn is_degenerate(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        row.checked_mul(self.cols)?.checked_add(col)
    }

    /// Read a cell. Out-of-bounds coordinates read as dead.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.index(row, col)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Write a cell. Returns `false` (and changes nothing) when the
    /// coordinates are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, alive: bool) -> bool {
        let Some(i) = self.index(row, col) else {
            return false;
        };
        match self.cells.get_mut(i) {
            Some(cell) => {
                *cell = alive;
                true
            }
            None => false,
        }
    }

    /// Grow the grid so it has at least `rows` rows and `cols` columns.
    ///
    /// Existing cells keep their coordinates; new cells are dead. The grid
    /// never shrinks.
    pub fn extend_to(&mut self, rows: usize, cols: usize) {
        let new_rows = rows.max(self.rows);
        let new_cols = cols.max(self.cols);
        if new_rows == self.rows && new_cols == self.cols {
            return;
        }
        let mut grown = Self::new(new_rows, new_cols);
        for (row, col) in self.live_cells() {
            grown.set(row, col, true);
        }
        *self = grown;
    }

    /// Iterate over live cells as `(row, col)` in row-major order.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .filter_map(move |(i, _)| Some((i.checked_div(cols)?, i.checked_rem(cols)?)))
    }

    /// Number of live cells.
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Whether every cell is dead (trivially true for a degenerate grid).
    pub fn is_all_dead(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }
}
