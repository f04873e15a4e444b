//! Decision making and mutation for a single snake genome.
//!
//! [`SnakeBrain`] wraps a [`NeuralNetwork`] whose input layer matches the
//! [`PerceptionEncoder`] and whose output layer has one neuron per
//! [`Direction`]. Activations are fixed: identity on the input layer, ReLU on
//! hidden layers and softsign on the output layer.

use neurosnake_engine::{Direction, Playboard};
use rand::Rng;

use crate::{
    activation::Activation,
    mutation_table::MutationTable,
    network::{NetworkError, NeuralNetwork},
    vision::{INPUT_WIDTH, PerceptionEncoder},
};

/// Number of output neurons, one per direction.
pub const OUTPUT_WIDTH: usize = Direction::ALL.len();

/// The network produced all-zero or all-one outputs and cannot choose.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("degenerate network output {outputs:?}")]
pub struct DegenerateOutputError {
    pub outputs: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct SnakeBrain {
    network: NeuralNetwork,
}

impl SnakeBrain {
    /// Creates a brain with zero weights.
    pub fn new(topology: &[usize]) -> Result<Self, NetworkError> {
        Self::from_network(NeuralNetwork::new(topology)?)
    }

    /// Wraps an existing network, e.g. one loaded from a checkpoint.
    pub fn from_network(mut network: NeuralNetwork) -> Result<Self, NetworkError> {
        let topology = network.topology();
        if topology.first() != Some(&INPUT_WIDTH) || topology.last() != Some(&OUTPUT_WIDTH) {
            return Err(NetworkError::Interface {
                topology: topology.to_vec(),
                input: INPUT_WIDTH,
                output: OUTPUT_WIDTH,
            });
        }

        let last = topology.len() - 1;
        for layer in 0..=last {
            let activation = match layer {
                0 => Activation::Identity,
                l if l == last => Activation::SoftSign,
                _ => Activation::Relu,
            };
            network.set_activation(layer, activation);
        }
        Ok(Self { network })
    }

    #[must_use]
    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.network
    }

    #[must_use]
    pub fn into_network(self) -> NeuralNetwork {
        self.network
    }

    pub fn randomize<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.network.randomize(rng);
    }

    /// Activated output values from the last decision, `[up, right, down, left]`.
    #[must_use]
    pub fn outputs(&self) -> &[f64] {
        self.network.output()
    }

    /// Perceives the board and picks the next direction.
    ///
    /// The strongest output wins; on ties the later direction wins.
    pub fn decide(&mut self, board: &Playboard) -> Result<Direction, DegenerateOutputError> {
        let perception = PerceptionEncoder::new(board).encode();
        self.network
            .set_input(&perception)
            .expect("input layer width is checked on construction");
        self.network.feed_forward();
        choose_direction(self.network.output())
    }

    /// Perturbs the genome with values from `table`.
    ///
    /// Draws as many random weight indexes as there are weights; the same
    /// weight may be hit several times or not at all.
    pub fn mutate<R>(&mut self, table: &MutationTable, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let total = self.network.weight_count();
        for _ in 0..total {
            let index = rng.random_range(0..total);
            let delta = table.sample(rng);
            if let Some(w) = self.network.locate_weight(index) {
                self.network.weights_mut()[w.matrix][(w.row, w.col)] += delta;
            }
        }
    }
}

/// Maps output activations to a direction.
///
/// Scans left to right keeping the last index whose value is `>=` the running
/// maximum.
pub fn choose_direction(outputs: &[f64]) -> Result<Direction, DegenerateOutputError> {
    let degenerate = || DegenerateOutputError {
        outputs: outputs.to_vec(),
    };
    if outputs.iter().all(|&v| v == 0.0) || outputs.iter().all(|&v| v == 1.0) {
        return Err(degenerate());
    }

    let mut max = f64::MIN;
    let mut best = None;
    for (i, &v) in outputs.iter().enumerate() {
        if v >= max {
            max = v;
            best = Some(i);
        }
    }
    best.and_then(Direction::from_index).ok_or_else(degenerate)
}

#[cfg(test)]
mod tests {
    use neurosnake_engine::{BoardSeed, EnvironmentConfig, Position};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{matrix::Matrix, mutation_table::MutationParams};

    fn weights_of(brain: &SnakeBrain) -> Vec<f64> {
        brain
            .network()
            .weights()
            .iter()
            .flat_map(|m| m.as_slice().to_vec())
            .collect()
    }

    mod decision {
        use super::*;

        #[test]
        fn test_picks_maximum() {
            assert_eq!(choose_direction(&[0.1, 0.9, 0.3, 0.2]), Ok(Direction::Right));
            assert_eq!(choose_direction(&[-0.1, -0.9, -0.3, -0.2]), Ok(Direction::Up));
            assert_eq!(choose_direction(&[0.1, 0.2, 0.3, 0.4]), Ok(Direction::Left));
        }

        #[test]
        fn test_ties_go_to_later_index() {
            assert_eq!(choose_direction(&[0.5, 0.5, 0.1, 0.1]), Ok(Direction::Right));
            assert_eq!(choose_direction(&[0.7, 0.2, 0.7, 0.7]), Ok(Direction::Left));
        }

        #[test]
        fn test_degenerate_outputs() {
            assert!(choose_direction(&[0.0; 4]).is_err());
            assert!(choose_direction(&[1.0; 4]).is_err());
            assert!(choose_direction(&[f64::NAN; 4]).is_err());
            // mixed zeros and ones are a valid decision
            assert_eq!(choose_direction(&[0.0, 1.0, 0.0, 1.0]), Ok(Direction::Left));
        }

        #[test]
        fn test_zero_weight_network_decides_left() {
            // every output is softsign(1) = 0.5, the tie goes to the last index
            let mut brain = SnakeBrain::new(&[28, 8, 4]).unwrap();
            let board = Playboard::from_parts(
                EnvironmentConfig::default(),
                [Position::new(5, 5)],
                Direction::Up,
                Some(Position::new(0, 0)),
                BoardSeed::from_u64(0),
            )
            .unwrap();
            assert_eq!(brain.decide(&board), Ok(Direction::Left));
            assert_eq!(brain.outputs(), &[0.5; 4]);
        }

        #[test]
        fn test_decide_follows_output_weights() {
            let mut brain = SnakeBrain::new(&[28, 4]).unwrap();
            // Only the "down" neuron gets weight from the up-direction one-hot input.
            let mut w = Matrix::zeros(28, 4);
            w[(24, 2)] = 3.0;
            brain.network_mut().weights_mut()[0] = w;
            let board = Playboard::from_parts(
                EnvironmentConfig::default(),
                [Position::new(5, 5)],
                Direction::Up,
                Some(Position::new(0, 0)),
                BoardSeed::from_u64(0),
            )
            .unwrap();
            assert_eq!(brain.decide(&board), Ok(Direction::Down));
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn test_activations_are_fixed() {
            let brain = SnakeBrain::new(&[28, 8, 6, 4]).unwrap();
            let nn = brain.network();
            assert_eq!(nn.activation(0), Activation::Identity);
            assert_eq!(nn.activation(1), Activation::Relu);
            assert_eq!(nn.activation(2), Activation::Relu);
            assert_eq!(nn.activation(3), Activation::SoftSign);
        }

        #[test]
        fn test_rejects_wrong_interface() {
            assert!(matches!(
                SnakeBrain::new(&[27, 8, 4]),
                Err(NetworkError::Interface { .. })
            ));
            assert!(matches!(
                SnakeBrain::new(&[28, 8, 3]),
                Err(NetworkError::Interface { .. })
            ));
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn test_mutation_uses_table_values() {
            let table = MutationTable::new(MutationParams::default()).unwrap();
            let mut brain = SnakeBrain::new(&[28, 8, 4]).unwrap();
            let mut rng = Pcg32::seed_from_u64(5);
            brain.mutate(&table, &mut rng);

            let weights = weights_of(&brain);
            assert_eq!(weights.len(), 28 * 8 + 8 * 4);
            let changed = weights.iter().filter(|&&w| w != 0.0).count();
            assert!(changed > 0);
            // each weight absorbs at most a handful of perturbations of size <= 0.5
            assert!(weights.iter().all(|w| w.abs() <= 0.5 * 10.0));
        }

        #[test]
        fn test_single_value_table_shifts_by_multiples() {
            let table = MutationTable::new(MutationParams {
                range_low: 0.25,
                range_high: 0.25,
                step: 0.25,
            })
            .unwrap();
            let mut brain = SnakeBrain::new(&[28, 4]).unwrap();
            brain.mutate(&table, &mut Pcg32::seed_from_u64(9));

            let weights = weights_of(&brain);
            // exactly one perturbation per draw, so the sum counts the draws
            let total = weights.iter().sum::<f64>();
            assert_eq!(total, 0.25 * 112.0);
            assert!(weights.iter().all(|w| (w / 0.25).fract() == 0.0));
        }
    }
}
