use std::ops::{Index, IndexMut};

use super::Position;

/// Contents of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::IsVariant)]
#[repr(u8)]
pub enum Cell {
    /// Nothing on this cell.
    #[default]
    Empty,
    /// A snake body segment (the head included).
    Snake,
    /// The apple.
    Apple,
}

/// Cell-by-cell board storage.
///
/// Cells are kept in one flat row-major buffer indexed by `row * cols + col`.
/// Indexing with a [`Position`] outside the board panics; callers check
/// [`Grid::contains`] first.
///
/// # Example
///
/// ```
/// use neurosnake_engine::{Cell, Grid, Position};
///
/// let mut grid = Grid::new(3, 4);
/// grid[Position::new(1, 2)] = Cell::Apple;
///
/// assert!(grid[Position::new(1, 2)].is_apple());
/// assert!(!grid.contains(Position::new(3, 0)));
/// assert_eq!(grid.empty_positions().count(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells (`rows * cols`).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.index_of(pos).is_some()
    }

    #[must_use]
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.index_of(pos).map(|i| self.cells[i])
    }

    /// Iterates over every empty cell in row-major order.
    pub fn empty_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(i, _)| self.position_of(i))
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        let row = usize::try_from(pos.row).ok()?;
        let col = usize::try_from(pos.col).ok()?;
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    #[expect(clippy::cast_possible_wrap)]
    fn position_of(&self, index: usize) -> Position {
        Position::new((index / self.cols) as isize, (index % self.cols) as isize)
    }
}

impl Index<Position> for Grid {
    type Output = Cell;

    fn index(&self, pos: Position) -> &Self::Output {
        let i = self
            .index_of(pos)
            .unwrap_or_else(|| panic!("position {pos:?} is outside the grid"));
        &self.cells[i]
    }
}

impl IndexMut<Position> for Grid {
    fn index_mut(&mut self, pos: Position) -> &mut Self::Output {
        let i = self
            .index_of(pos)
            .unwrap_or_else(|| panic!("position {pos:?} is outside the grid"));
        &mut self.cells[i]
    }
}
