//! Fitness of a finished game.
//!
//! ```text
//! per_point = T / (S + 1)
//! explore   = S + 0.5 + 0.5 * (T - per_point) / (T + per_point)
//! exponent  = 1.9 - (S / 10) * 0.03     (integer division)
//! less_step = (1 / per_point) * (explore + 0.5) ^ exponent
//! fitness   = (explore + less_step) * 100000
//! ```
//!
//! `S` is the score and `T` the total step count. Among equal scores, fewer
//! steps per apple win. The exponent drops once per ten apples, so the
//! step-efficiency bonus shrinks in steps at scores 10, 20, ... The constants
//! are tuned for a 10×10 board and are not rescaled for other sizes.

/// Multiplier applied to the raw fitness.
pub const FITNESS_SCALE: f64 = 100_000.0;

const BASE_EXPONENT: f64 = 1.9;
const EXPONENT_DECAY: f64 = 0.03;

/// Computes the fitness of a game with `score` apples eaten in `steps` moves.
///
/// A game without any step has no step-efficiency term. The result is never
/// NaN and never exceeds [`f64::MAX`].
///
/// # Example
///
/// ```
/// use neurosnake_training::fitness::fitness;
///
/// assert!(fitness(3, 40) > fitness(2, 40));
/// assert!(fitness(3, 40) > fitness(3, 80));
/// assert_eq!(fitness(0, 0), 50_000.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn fitness(score: usize, steps: usize) -> f64 {
    let s = score as f64;
    let t = steps as f64;
    let per_point = t / (s + 1.0);

    let spread = if t + per_point > 0.0 {
        (t - per_point) / (t + per_point)
    } else {
        0.0
    };
    let explore = s + 0.5 + 0.5 * spread;
    let exponent = BASE_EXPONENT - (score / 10) as f64 * EXPONENT_DECAY;
    let less_step = if per_point > 0.0 {
        (1.0 / per_point) * (explore + 0.5).powf(exponent)
    } else {
        0.0
    };

    let rank = (explore + less_step) * FITNESS_SCALE;
    if rank.is_nan() { 0.0 } else { rank.min(f64::MAX) }
}
