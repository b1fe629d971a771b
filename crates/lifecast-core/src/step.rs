//! Next-generation computation for Conway's Game of Life.
//!
//! The board has a hard edge: there is no wraparound, and positions
//! outside the grid never count as live neighbours. A live cell survives
//! with two or three live neighbours, a dead cell is born with exactly
//! three, and every other cell is dead in the next generation.
//!
//! [`compute_next_generation`] is pure. It reads only its argument and
//! returns a fresh grid together with a [`Classification`] of the
//! transition, which the run loop uses to decide whether to keep going.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Relative offsets of the eight Moore neighbours.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Outcome of one transition.
///
/// [`Unchanged`](Self::Unchanged) and [`Extinct`](Self::Extinct) are both
/// terminal, but they are different facts about the board and callers must
/// be able to tell a stable configuration from a total die-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// At least one cell differs and at least one cell is alive.
    Changed,
    /// The next generation is identical to the current one.
    Unchanged,
    /// Every cell in the next generation is dead.
    Extinct,
}

impl Classification {
    /// Whether this outcome halts autonomous evolution.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Unchanged | Self::Extinct)
    }

    /// The reason string recorded on an instance that halts with this
    /// outcome.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Extinct => "extinct",
        }
    }
}

impl core::fmt::Display for Classification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count live neighbours of `(row, col)`, ignoring positions past the edge.
fn live_neighbours(grid: &Grid, row: usize, col: usize) -> u8 {
    let mut count: u8 = 0;
    for (dr, dc) in NEIGHBOURS {
        let (Some(r), Some(c)) = (row.checked_add_signed(dr), col.checked_add_signed(dc)) else {
            continue;
        };
        if grid.get(r, c) {
            count = count.saturating_add(1);
        }
    }
    count
}

/// Compute the generation after `current` and classify the transition.
///
/// A degenerate grid (zero rows or zero columns) has no cells to evolve
/// and is classified [`Classification::Extinct`] straight away.
///
/// When the board does not change the result is
/// [`Classification::Unchanged`] even if every cell is dead; extinction is
/// reported only on the step in which the last live cells die.
pub fn compute_next_generation(current: &Grid) -> (Grid, Classification) {
    if current.is_degenerate() {
        return (current.clone(), Classification::Extinct);
    }

    let rows = current.rows();
    let cols = current.cols();
    let mut next = Grid::new(rows, cols);
    let mut changed = false;
    let mut any_alive = false;

    for row in 0..rows {
        for col in 0..cols {
            let alive = current.get(row, col);
            let neighbours = live_neighbours(current, row, col);
            let alive_next = matches!((alive, neighbours), (true, 2 | 3) | (false, 3));
            if alive_next {
                next.set(row, col, true);
                any_alive = true;
            }
            if alive_next != alive {
                changed = true;
            }
        }
    }

    let classification = if !changed {
        Classification::Unchanged
    } else if !any_alive {
        Classification::Extinct
    } else {
        Classification::Changed
    };

    (next, classification)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glider() -> Grid {
        let mut grid = Grid::new(10, 10);
        for (r, c) in [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)] {
            grid.set(r, c, true);
        }
        grid
    }

    #[test]
    fn block_is_unchanged() {
        let block = Grid::from_pattern(&["....", ".##.", ".##.", "...."]);
        let (next, class) = compute_next_generation(&block);
        assert_eq!(class, Classification::Unchanged);
        assert_eq!(next, block);
    }

    #[test]
    fn lone_cell_goes_extinct() {
        let grid = Grid::from_pattern(&["...", ".#.", "..."]);
        let (next, class) = compute_next_generation(&grid);
        assert_eq!(class, Classification::Extinct);
        assert!(next.is_all_dead());
    }

    #[test]
    fn dead_board_is_unchanged_not_extinct() {
        let (_, class) = compute_next_generation(&Grid::new(4, 4));
        assert_eq!(class, Classification::Unchanged);
    }

    #[test]
    fn degenerate_grid_is_extinct() {
        assert_eq!(compute_next_generation(&Grid::new(0, 5)).1, Classification::Extinct);
        assert_eq!(compute_next_generation(&Grid::new(5, 0)).1, Classification::Extinct);
        assert_eq!(compute_next_generation(&Grid::default()).1, Classification::Extinct);
    }

    #[test]
    fn blinker_oscillates() {
        let horizontal = Grid::from_pattern(&[".....", ".....", ".###.", ".....", "....."]);
        let vertical = Grid::from_pattern(&[".....", "..#..", "..#..", "..#..", "....."]);
        let (next, class) = compute_next_generation(&horizontal);
        assert_eq!(class, Classification::Changed);
        assert_eq!(next, vertical);
        let (back, class) = compute_next_generation(&next);
        assert_eq!(class, Classification::Changed);
        assert_eq!(back, horizontal);
    }

    #[test]
    fn edge_does_not_wrap() {
        let grid = Grid::from_pattern(&["###", "...", "..."]);
        let (next, class) = compute_next_generation(&grid);
        assert_eq!(class, Classification::Changed);
        assert_eq!(next, Grid::from_pattern(&[".#.", ".#.", "..."]));
    }

    #[test]
    fn deterministic() {
        let grid = glider();
        let first = compute_next_generation(&grid);
        let second = compute_next_generation(&grid);
        assert_eq!(first, second);
    }

    #[test]
    fn glider_translates_diagonally_after_four_steps() {
        let start = glider();
        let mut grid = start.clone();
        for _ in 0..4 {
            let (next, class) = compute_next_generation(&grid);
            assert_eq!(class, Classification::Changed);
            grid = next;
        }
        let expected: Vec<_> = start.live_cells().map(|(r, c)| (r + 1, c + 1)).collect();
        let actual: Vec<_> = grid.live_cells().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn terminal_outcomes() {
        assert!(!Classification::Changed.is_terminal());
        assert!(Classification::Unchanged.is_terminal());
        assert!(Classification::Extinct.is_terminal());
        assert_ne!(Classification::Unchanged.as_str(), Classification::Extinct.as_str());
    }
}
