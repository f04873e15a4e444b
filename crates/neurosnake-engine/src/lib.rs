//! Grid world for the snake agents.
//!
//! The engine is the fitness oracle of the training system: it owns the board,
//! the snake body and the apple, and advances the simulation one cell at a time.
//! It knows nothing about neural networks; the caller chooses a direction and
//! calls [`Playboard::step`].
//!
//! - [`core`] - Value types shared by every layer (positions, directions, the cell grid)
//! - [`engine`] - The [`Playboard`] state machine, step counters and seeding
//!
//! # Example
//!
//! ```
//! use neurosnake_engine::{Direction, EnvironmentConfig, Playboard, Position, StepOutcome};
//!
//! let config = EnvironmentConfig::default();
//! let mut board = Playboard::from_parts(
//!     config,
//!     [Position::new(5, 5)],
//!     Direction::Right,
//!     Some(Position::new(5, 6)),
//!     rand::random(),
//! )
//! .unwrap();
//!
//! assert_eq!(board.step(), StepOutcome::Ate);
//! assert_eq!(board.score(), 1);
//! assert_eq!(board.len(), 2);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Rejected initial layout passed to [`Playboard::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum LayoutError {
    #[display("snake body must contain at least one cell")]
    EmptyBody,
    #[display("position ({}, {}) is outside the {rows}x{cols} grid", position.row, position.col)]
    OutOfBounds {
        position: Position,
        rows: usize,
        cols: usize,
    },
    #[display("snake body occupies ({}, {}) twice", _0.row, _0.col)]
    OverlappingBody(#[error(not(source))] Position),
    #[display("apple at ({}, {}) overlaps the snake body", _0.row, _0.col)]
    AppleOnBody(#[error(not(source))] Position),
}
