//! Genetic-algorithm training of snake brains.
//!
//! A [`Trainer`](trainer::Trainer) evolves a population of
//! [`SnakeBrain`](neurosnake_brain::snake_brain::SnakeBrain)s:
//!
//! 1. **Simulation** ([`agent`]) - Every agent plays one game on its own board,
//!    run in parallel on a [`WorkerPool`](worker_pool::WorkerPool).
//!
//! 2. **Ranking** ([`fitness`]) - Finished games are scored from apples eaten and
//!    steps taken.
//!
//! 3. **Reproduction** ([`genetic`]) - The best agents breed the next generation
//!    by roulette-wheel selection and uniform crossover, survive as elites and
//!    are mutated.
//!
//! 4. **Persistence** ([`checkpoint`]) - The best genomes of a generation are
//!    saved periodically so an interrupted task can resume.
//!
//! # Example
//!
//! ```no_run
//! use neurosnake_training::{config::TrainerConfig, trainer::Trainer};
//!
//! let config = TrainerConfig {
//!     max_generation: 10,
//!     ..TrainerConfig::default()
//! };
//! let mut trainer = Trainer::new(config)?;
//! trainer.run(|report| {
//!     println!("{}: {}", report.generation, report.best().score);
//!     Ok::<_, neurosnake_training::trainer::TrainingError>(())
//! })?;
//! # Ok::<(), neurosnake_training::trainer::TrainingError>(())
//! ```

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod fitness;
pub mod genetic;
pub mod trainer;
pub mod worker_pool;
