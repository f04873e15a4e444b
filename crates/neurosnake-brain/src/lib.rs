//! Neural-network inference and perception for snake agents.
//!
//! This crate turns a [`Playboard`](neurosnake_engine::Playboard) into a
//! movement decision:
//!
//! 1. **Perception** ([`vision`]) - Casts eight rays from the snake head and encodes
//!    wall, body and apple distances plus the current direction into 28 inputs.
//!
//! 2. **Inference** ([`network`]) - Propagates the inputs through a fixed-topology
//!    feed-forward network built on the [`matrix`] primitive.
//!
//! 3. **Decision** ([`snake_brain`]) - Picks the strongest of the four outputs as the
//!    next direction, and mutates the genome for the genetic algorithm.
//!
//! # Architecture
//!
//! ```text
//! Playboard (neurosnake-engine)
//!     ↓ observed by
//! PerceptionEncoder (28 inputs)
//!     ↓ fed into
//! NeuralNetwork (topology e.g. [28, 8, 4])
//!     ↓ read by
//! SnakeBrain::decide (up / right / down / left)
//! ```
//!
//! # Example
//!
//! ```
//! use neurosnake_brain::snake_brain::SnakeBrain;
//! use neurosnake_engine::{EnvironmentConfig, Playboard};
//!
//! let mut brain = SnakeBrain::new(&[28, 8, 4]).unwrap();
//! brain.randomize(&mut rand::rng());
//!
//! let board = Playboard::new(EnvironmentConfig::default());
//! // An untrained network may produce a degenerate output; both cases are valid.
//! let _ = brain.decide(&board);
//! ```

pub mod activation;
pub mod matrix;
pub mod mutation_table;
pub mod network;
pub mod snake_brain;
pub mod vision;
