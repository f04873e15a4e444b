//! Ray-cast perception of a [`Playboard`].
//!
//! Eight rays leave the head in compass order (N, NE, E, SE, S, SW, W, NW).
//! Each ray contributes three values:
//!
//! | value | formula | ray without hit |
//! |---|---|---|
//! | wall | `wall / (rows - 1)` | - |
//! | body | `body / (rows - 1)` | `1.0` |
//! | food | `(rows - food - 1) / (rows - 1)` | `0.0` |
//!
//! `wall` counts the cells between the head and the boundary; `body` and
//! `food` are zero-based step indexes of the first hit (the cell next to the
//! head is step 0). All three are normalised by the row count, also for
//! horizontal rays.
//!
//! The 24 ray values are followed by the one-hot movement direction in the
//! order up, right, down, left.

use arrayvec::ArrayVec;
use neurosnake_engine::{Cell, Playboard};

/// Ray offsets `(d_row, d_col)` in encoding order.
pub const RAY_OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Length of the perception vector.
pub const INPUT_WIDTH: usize = RAY_OFFSETS.len() * 3 + 4;

pub type Perception = ArrayVec<f64, INPUT_WIDTH>;

/// Raw distances found along one ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayHits {
    pub wall: usize,
    pub body: Option<usize>,
    pub food: Option<usize>,
}

/// Encodes what the snake on a board can see.
#[derive(Debug, Clone, Copy)]
pub struct PerceptionEncoder<'a> {
    board: &'a Playboard,
}

impl<'a> PerceptionEncoder<'a> {
    #[must_use]
    pub fn new(board: &'a Playboard) -> Self {
        Self { board }
    }

    /// Walks from the head in `(d_row, d_col)` steps until leaving the grid.
    #[must_use]
    pub fn cast(&self, (d_row, d_col): (isize, isize)) -> RayHits {
        let grid = self.board.grid();
        let mut hits = RayHits {
            wall: 0,
            body: None,
            food: None,
        };
        let mut pos = self.board.head().offset(d_row, d_col);
        let mut step = 0;
        while let Some(cell) = grid.get(pos) {
            match cell {
                Cell::Snake => {
                    hits.body.get_or_insert(step);
                }
                Cell::Apple => {
                    hits.food.get_or_insert(step);
                }
                Cell::Empty => {}
            }
            step += 1;
            pos = pos.offset(d_row, d_col);
        }
        hits.wall = step;
        hits
    }

    #[must_use]
    pub fn encode(&self) -> Perception {
        let mut out = Perception::new();
        #[expect(clippy::cast_precision_loss)]
        let rows = self.board.grid().rows() as f64;
        let scale = rows - 1.0;
        for offset in RAY_OFFSETS {
            let RayHits { wall, body, food } = self.cast(offset);
            #[expect(clippy::cast_precision_loss)]
            let values = [
                wall as f64 / scale,
                body.map_or(1.0, |b| b as f64 / scale),
                food.map_or(0.0, |f| (rows - f as f64 - 1.0) / scale),
            ];
            out.extend(values);
        }
        out.extend(self.board.direction().one_hot());
        out
    }
}

#[cfg(test)]
mod tests {
    use neurosnake_engine::{BoardSeed, Direction, EnvironmentConfig, Position};

    use super::*;

    fn board(body: &[(isize, isize)], direction: Direction, apple: (isize, isize)) -> Playboard {
        Playboard::from_parts(
            EnvironmentConfig::default(),
            body.iter().map(|&(r, c)| Position::new(r, c)),
            direction,
            Some(Position::new(apple.0, apple.1)),
            BoardSeed::from_u64(1),
        )
        .unwrap()
    }

    #[test]
    fn test_input_width() {
        assert_eq!(INPUT_WIDTH, 28);
        let b = board(&[(5, 5)], Direction::Up, (0, 0));
        assert_eq!(PerceptionEncoder::new(&b).encode().len(), 28);
    }

    #[test]
    fn test_wall_distances_from_corner() {
        let b = board(&[(0, 0)], Direction::Right, (9, 9));
        let enc = PerceptionEncoder::new(&b);
        assert_eq!(enc.cast((-1, 0)).wall, 0);
        assert_eq!(enc.cast((0, 1)).wall, 9);
        assert_eq!(enc.cast((1, 1)).wall, 9);
        assert_eq!(enc.cast((1, 0)).wall, 9);
        assert_eq!(enc.cast((1, -1)).wall, 0);
    }

    #[test]
    fn test_body_and_food_are_zero_based() {
        // head (5,5), body continues west; apple two cells north
        let b = board(&[(5, 5), (5, 4), (5, 3)], Direction::Right, (3, 5));
        let enc = PerceptionEncoder::new(&b);

        let west = enc.cast((0, -1));
        assert_eq!(west.body, Some(0));
        assert_eq!(west.food, None);
        assert_eq!(west.wall, 5);

        let north = enc.cast((-1, 0));
        assert_eq!(north.food, Some(1));
        assert_eq!(north.body, None);
        assert_eq!(north.wall, 5);
    }

    #[test]
    fn test_encoded_values() {
        let b = board(&[(5, 5), (5, 4), (5, 3)], Direction::Right, (3, 5));
        let v = PerceptionEncoder::new(&b).encode();

        // N: wall 5, no body, food at step 1
        assert_eq!(&v[0..3], &[5.0 / 9.0, 1.0, 8.0 / 9.0]);
        // E: wall 4, nothing seen
        assert_eq!(&v[6..9], &[4.0 / 9.0, 1.0, 0.0]);
        // W: wall 5, body at step 0
        assert_eq!(&v[18..21], &[5.0 / 9.0, 0.0, 0.0]);
        // one-hot direction: right
        assert_eq!(&v[24..28], &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_apple_adjacent_gives_full_food_value() {
        let b = board(&[(5, 5)], Direction::Up, (5, 6));
        let v = PerceptionEncoder::new(&b).encode();
        assert_eq!(v[8], 1.0);
    }
}
