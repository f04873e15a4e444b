use serde::{Deserialize, Serialize};

use super::Direction;

/// A cell coordinate on the board.
///
/// Coordinates are signed so that a step off the edge of the board produces a
/// representable (out-of-bounds) position instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: isize,
    pub col: isize,
}

impl Position {
    #[must_use]
    pub const fn new(row: isize, col: isize) -> Self {
        Self { row, col }
    }

    /// Returns the position shifted by `(d_row, d_col)`.
    #[must_use]
    pub const fn offset(self, d_row: isize, d_col: isize) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// Returns the neighbouring position one cell away in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (d_row, d_col) = direction.offset();
        self.offset(d_row, d_col)
    }
}
