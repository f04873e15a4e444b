//! Discrete perturbation values for weight mutation.

use rand::Rng;
use serde::{Deserialize, Serialize};

const MULTIPLE_TOLERANCE: f64 = 1e-9;

/// Range and resolution of mutation perturbations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationParams {
    pub range_low: f64,
    pub range_high: f64,
    pub step: f64,
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            range_low: -0.5,
            range_high: 0.5,
            step: 0.005,
        }
    }
}

impl MutationParams {
    /// Returns `true` if the parameters describe a non-empty finite table.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.range_low.is_finite()
            && self.range_high.is_finite()
            && self.step.is_finite()
            && self.step > 0.0
            && self.range_low <= self.range_high
    }
}

/// Ordered table of every multiple of `step` within `[range_low, range_high]`.
///
/// Values are computed as `k * step` for integer `k`, so a range symmetric
/// around zero yields a table that is exactly symmetric. Bounds that are not
/// multiples of `step` are never exceeded.
///
/// # Example
///
/// ```
/// use neurosnake_brain::mutation_table::{MutationParams, MutationTable};
///
/// let table = MutationTable::new(MutationParams::default()).unwrap();
/// assert_eq!(table.len(), 201);
/// assert_eq!(table.values()[0], -0.5);
/// assert_eq!(table.values()[100], 0.0);
/// assert_eq!(table.values()[200], 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MutationTable {
    values: Vec<f64>,
}

impl MutationTable {
    /// Builds the table, or returns `None` for invalid parameters.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn new(params: MutationParams) -> Option<Self> {
        if !params.is_valid() {
            return None;
        }
        // Bounds within `MULTIPLE_TOLERANCE` of a multiple of `step` count as that multiple.
        let low = (params.range_low / params.step - MULTIPLE_TOLERANCE).ceil() as i64;
        let high = (params.range_high / params.step + MULTIPLE_TOLERANCE).floor() as i64;
        let values = (low..=high).map(|k| k as f64 * params.step).collect::<Vec<_>>();
        (!values.is_empty()).then_some(Self { values })
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Draws one value uniformly.
    pub fn sample<R>(&self, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        self.values[rng.random_range(0..self.values.len())]
    }
}
