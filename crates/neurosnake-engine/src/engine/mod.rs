//! Simulation logic on top of the [`core`](crate::core) value types.
//!
//! - [`Playboard`] - One snake, one apple and the grid they live on
//! - [`EnvironmentConfig`] - Board size and the wander rule
//! - [`SnakeStats`] - Score and step counters consumed by the fitness function
//! - [`BoardSeed`] - Seed for reproducible snake spawns and apple placement
//!
//! # Simulation Flow
//!
//! 1. Create a [`Playboard`] (the snake spawns and an apple is placed)
//! 2. Choose a direction with [`Playboard::set_direction`]
//! 3. Advance one cell with [`Playboard::step`]
//! 4. Apply [`Playboard::apply_wander_rule`] to bound aimless runs
//! 5. Repeat until [`Playboard::state`] is dead

pub use self::{board_seed::*, playboard::*, snake_stats::*};

mod board_seed;
mod playboard;
mod snake_stats;
