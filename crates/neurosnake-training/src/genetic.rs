//! Selection and crossover operators.
//!
//! # Algorithm Overview
//!
//! After ranking, the top `sample_size` agents of a generation become the
//! [`ParentPool`]. The next population is then built as:
//!
//! 1. **Roulette-wheel selection** - Two distinct parents are drawn with
//!    probability proportional to their fitness
//! 2. **Uniform crossover** - Every single weight of the child is copied from
//!    one of the two parents by an independent coin flip
//! 3. **Elitism** - Each parent is also copied verbatim into the next
//!    population, so the best genome never regresses before mutation
//!
//! Mutation is applied afterwards by the trainer (see
//! [`SnakeBrain::mutate`](neurosnake_brain::snake_brain::SnakeBrain::mutate)).
//!
//! # Design Decisions
//!
//! ## Blend-free crossover
//!
//! A child weight is always exactly one of the parents' values at that
//! position; weights are never interpolated.
//!
//! ## Degenerate fitness sums
//!
//! A non-positive or non-finite fitness sum falls back to uniform selection,
//! and the re-roll of the second parent gives up after
//! [`MAX_REROLLS`] attempts by picking any other parent uniformly.

use neurosnake_brain::network::NeuralNetwork;
use rand::Rng;

/// Attempts at drawing a second parent different from the first.
pub const MAX_REROLLS: usize = 64;

/// A ranked genome kept for breeding and checkpointing.
#[derive(Debug, Clone)]
pub struct Sample {
    pub network: NeuralNetwork,
    pub fitness: f64,
    pub score: usize,
    pub steps: usize,
}

/// Parents of the next generation, best first.
#[derive(Debug, Clone)]
pub struct ParentPool {
    samples: Vec<Sample>,
    fitness: Vec<f64>,
    total_fitness: f64,
}

impl ParentPool {
    /// # Panics
    ///
    /// Panics if fewer than two samples are given.
    #[must_use]
    pub fn new(samples: Vec<Sample>) -> Self {
        assert!(samples.len() >= 2, "a parent pool needs at least two samples");
        let fitness = samples.iter().map(|s| s.fitness).collect::<Vec<_>>();
        let total_fitness = fitness.iter().sum();
        Self {
            samples,
            fitness,
            total_fitness,
        }
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn total_fitness(&self) -> f64 {
        self.total_fitness
    }

    /// Picks the indexes of two distinct parents.
    pub fn select_pair<R>(&self, rng: &mut R) -> (usize, usize)
    where
        R: Rng + ?Sized,
    {
        let first = roulette_select(&self.fitness, self.total_fitness, rng);
        for _ in 0..MAX_REROLLS {
            let second = roulette_select(&self.fitness, self.total_fitness, rng);
            if second != first {
                return (first, second);
            }
        }
        let mut second = rng.random_range(0..self.fitness.len() - 1);
        if second >= first {
            second += 1;
        }
        (first, second)
    }

    /// Produces one child genome from two selected parents.
    pub fn breed<R>(&self, rng: &mut R) -> NeuralNetwork
    where
        R: Rng + ?Sized,
    {
        let (first, second) = self.select_pair(rng);
        crossover(&self.samples[first].network, &self.samples[second].network, rng)
    }

    /// Verbatim copies of every parent genome, best first.
    pub fn elites(&self) -> impl Iterator<Item = NeuralNetwork> + '_ {
        self.samples.iter().map(|s| s.network.clone())
    }
}

/// Fitness-proportional selection over `fitness` with precomputed `total`.
///
/// Returns the first index whose cumulative fitness exceeds a uniform draw
/// from `[0, total)`, or the last index if rounding leaves none.
///
/// # Panics
///
/// Panics if `fitness` is empty.
pub fn roulette_select<R>(fitness: &[f64], total: f64, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    assert!(!fitness.is_empty(), "cannot select from an empty population");
    if !(total.is_finite() && total > 0.0) {
        return rng.random_range(0..fitness.len());
    }

    let slice = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, f) in fitness.iter().enumerate() {
        cumulative += f;
        if cumulative > slice {
            return i;
        }
    }
    fitness.len() - 1
}

/// Builds a child whose every weight is taken from `first` or `second` with
/// equal probability.
///
/// The child has no description.
///
/// # Panics
///
/// Panics if the parents have different topologies.
pub fn crossover<R>(first: &NeuralNetwork, second: &NeuralNetwork, rng: &mut R) -> NeuralNetwork
where
    R: Rng + ?Sized,
{
    assert_eq!(
        first.topology(),
        second.topology(),
        "parents must share a topology"
    );
    let mut child = first.clone();
    child.description_mut().clear();
    for (child_m, second_m) in child.weights_mut().iter_mut().zip(second.weights()) {
        for (w, &other) in child_m.as_mut_slice().iter_mut().zip(second_m.as_slice()) {
            if rng.random::<f64>() <= 0.5 {
                *w = other;
            }
        }
    }
    child
}
