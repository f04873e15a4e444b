use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Serialize};

/// Movement direction of the snake head.
///
/// The declaration order is the order used everywhere a direction is encoded
/// as a vector: network outputs and the one-hot perception suffix are both
/// `[up, right, down, left]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Direction {
    #[display("UP")]
    Up,
    #[display("RIGHT")]
    Right,
    #[display("DOWN")]
    Down,
    #[display("LEFT")]
    Left,
}

impl Direction {
    /// All directions in encoding order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Row/column offset of a single step.
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::Up => (-1, 0),
            Self::Right => (0, 1),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// One-hot encoding in `[up, right, down, left]` order.
    #[must_use]
    pub fn one_hot(self) -> [f64; 4] {
        let mut v = [0.0; 4];
        v[self.index()] = 1.0;
        v
    }
}

impl Distribution<Direction> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        Direction::ALL[rng.random_range(0..Direction::ALL.len())]
    }
}
