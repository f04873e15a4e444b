use serde::{Deserialize, Serialize};

/// Per-layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activation {
    /// `v`
    #[default]
    Identity,
    /// `max(0, v)`
    Relu,
    /// `v / (1 + |v|)`, bounded in `(-1, 1)`.
    ///
    /// This is the softsign curve, not the logistic sigmoid.
    SoftSign,
}

impl Activation {
    #[must_use]
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Self::Identity => v,
            Self::Relu => v.max(0.0),
            Self::SoftSign => v / (1.0 + v.abs()),
        }
    }
}
