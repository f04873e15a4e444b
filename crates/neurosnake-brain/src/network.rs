//! Fixed-topology feed-forward network.
//!
//! A network with topology `[n0, n1, ..., nk]` has `k + 1` layers and `k`
//! weight matrices; matrix `i` is `n_i × n_{i+1}`. Propagation adds a constant
//! bias of [`BIAS`] to every neuron after the matrix product.
//!
//! # File format
//!
//! ```json
//! {
//!   "topology": [28, 8, 4],
//!   "description": { "generation": 12, "fitness": 3.5 },
//!   "weights": [[[0.1, ...], ...], [[...], ...]]
//! }
//! ```
//!
//! `weights` is indexed matrix, row, column.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{activation::Activation, matrix::Matrix};

/// Bias added to every non-input neuron.
pub const BIAS: f64 = 1.0;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum NetworkError {
    #[display("topology must have at least two layers, got {layers}")]
    TopologyTooShort { layers: usize },
    #[display("layer {layer} has zero width")]
    EmptyLayer { layer: usize },
    #[display("expected {expected} weight matrices, got {actual}")]
    MatrixCount { expected: usize, actual: usize },
    #[display("weight matrix {index} does not have shape {rows}x{cols}")]
    MatrixShape {
        index: usize,
        rows: usize,
        cols: usize,
    },
    #[display("expected {expected} input values, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[display("topology {topology:?} must start with {input} inputs and end with {output} outputs")]
    Interface {
        topology: Vec<usize>,
        input: usize,
        output: usize,
    },
    #[display("failed to access network file {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to parse network file {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Location of one weight inside the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightIndex {
    pub matrix: usize,
    pub row: usize,
    pub col: usize,
}

/// On-disk representation of a [`NeuralNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFile {
    pub topology: Vec<usize>,
    #[serde(default)]
    pub description: Map<String, Value>,
    pub weights: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone)]
struct Layer {
    activation: Activation,
    values: Vec<f64>,
    activated: Vec<f64>,
}

impl Layer {
    fn new(width: usize) -> Self {
        Self {
            activation: Activation::Identity,
            values: vec![0.0; width],
            activated: vec![0.0; width],
        }
    }

    fn activate(&mut self) {
        for (a, v) in self.activated.iter_mut().zip(&self.values) {
            *a = self.activation.apply(*v);
        }
    }
}

/// Feed-forward network with one weight matrix per adjacent layer pair.
///
/// Weights start at zero. Every layer uses [`Activation::Identity`] until
/// [`NeuralNetwork::set_activation`] says otherwise.
///
/// # Example
///
/// ```
/// use neurosnake_brain::{activation::Activation, network::NeuralNetwork};
///
/// let mut nn = NeuralNetwork::new(&[2, 3, 1]).unwrap();
/// nn.set_activation(1, Activation::Relu);
/// nn.set_input(&[0.5, -0.5]).unwrap();
/// nn.feed_forward();
///
/// // zero weights: every hidden neuron is the bias, the output is 3 * 0 + bias
/// assert_eq!(nn.layer_activated(1), &[1.0, 1.0, 1.0]);
/// assert_eq!(nn.output(), &[1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    topology: Vec<usize>,
    layers: Vec<Layer>,
    weights: Vec<Matrix>,
    description: Map<String, Value>,
}

impl NeuralNetwork {
    pub fn new(topology: &[usize]) -> Result<Self, NetworkError> {
        if topology.len() < 2 {
            return Err(NetworkError::TopologyTooShort {
                layers: topology.len(),
            });
        }
        if let Some(layer) = topology.iter().position(|&w| w == 0) {
            return Err(NetworkError::EmptyLayer { layer });
        }

        Ok(Self {
            topology: topology.to_vec(),
            layers: topology.iter().map(|&w| Layer::new(w)).collect(),
            weights: topology
                .windows(2)
                .map(|pair| Matrix::zeros(pair[0], pair[1]))
                .collect(),
            description: Map::new(),
        })
    }

    /// Restores a network from its file representation.
    ///
    /// Activations are reset to [`Activation::Identity`].
    pub fn from_file(file: NetworkFile) -> Result<Self, NetworkError> {
        let mut nn = Self::new(&file.topology)?;
        if file.weights.len() != nn.weights.len() {
            return Err(NetworkError::MatrixCount {
                expected: nn.weights.len(),
                actual: file.weights.len(),
            });
        }
        for (index, (matrix, nested)) in nn.weights.iter_mut().zip(&file.weights).enumerate() {
            let (rows, cols) = (matrix.rows(), matrix.cols());
            *matrix = Matrix::from_nested(nested, rows, cols)
                .ok_or(NetworkError::MatrixShape { index, rows, cols })?;
        }
        nn.description = file.description;
        Ok(nn)
    }

    #[must_use]
    pub fn to_file(&self) -> NetworkFile {
        NetworkFile {
            topology: self.topology.clone(),
            description: self.description.clone(),
            weights: self.weights.iter().map(Matrix::to_nested).collect(),
        }
    }

    pub fn load<P>(path: P) -> Result<Self, NetworkError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| NetworkError::Io {
            path: path.to_owned(),
            source,
        })?;
        let file: NetworkFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| NetworkError::Json {
                path: path.to_owned(),
                source,
            })?;
        log::debug!("loaded network {:?} from {}", file.topology, path.display());
        Self::from_file(file)
    }

    /// Writes the network as pretty-printed JSON, replacing any existing file.
    pub fn save<P>(&self, path: P) -> Result<(), NetworkError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let io_error = |source| NetworkError::Io {
            path: path.to_owned(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
        serde_json::to_writer_pretty(&mut writer, &self.to_file()).map_err(|source| {
            NetworkError::Json {
                path: path.to_owned(),
                source,
            }
        })?;
        writeln!(writer).map_err(io_error)?;
        writer.flush().map_err(io_error)
    }

    #[must_use]
    pub fn topology(&self) -> &[usize] {
        &self.topology
    }

    #[must_use]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [Matrix] {
        &mut self.weights
    }

    /// Total number of weights across all matrices.
    #[must_use]
    pub fn weight_count(&self) -> usize {
        self.weights.iter().map(Matrix::len).sum()
    }

    /// Maps a global weight index to its matrix, row and column.
    ///
    /// Global indexes run through the matrices in order, each matrix
    /// row-major. Returns `None` past the last weight.
    #[must_use]
    pub fn locate_weight(&self, mut index: usize) -> Option<WeightIndex> {
        for (matrix, m) in self.weights.iter().enumerate() {
            if index < m.len() {
                return Some(WeightIndex {
                    matrix,
                    row: index / m.cols(),
                    col: index % m.cols(),
                });
            }
            index -= m.len();
        }
        None
    }

    /// Free-form metadata carried through save and load.
    #[must_use]
    pub fn description(&self) -> &Map<String, Value> {
        &self.description
    }

    pub fn description_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.description
    }

    #[must_use]
    pub fn activation(&self, layer: usize) -> Activation {
        self.layers[layer].activation
    }

    pub fn set_activation(&mut self, layer: usize, activation: Activation) {
        self.layers[layer].activation = activation;
    }

    /// Fills every weight uniformly from `[0, 1)`.
    pub fn randomize<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for w in self.weights.iter_mut().flat_map(Matrix::as_mut_slice) {
            *w = rng.random();
        }
    }

    /// Writes the input layer. The input layer is never activated on the way in.
    pub fn set_input(&mut self, input: &[f64]) -> Result<(), NetworkError> {
        let layer = &mut self.layers[0];
        if input.len() != layer.values.len() {
            return Err(NetworkError::InputLength {
                expected: layer.values.len(),
                actual: input.len(),
            });
        }
        layer.values.copy_from_slice(input);
        layer.activate();
        Ok(())
    }

    /// Propagates the input layer through every weight matrix.
    pub fn feed_forward(&mut self) {
        for (i, matrix) in self.weights.iter().enumerate() {
            let (done, rest) = self.layers.split_at_mut(i + 1);
            let source = &done[i];
            let input = if i == 0 {
                &source.values
            } else {
                &source.activated
            };
            let target = &mut rest[0];
            matrix.mul_add_vec(input, BIAS, &mut target.values);
            target.activate();
        }
    }

    /// Pre-activation values of a layer.
    #[must_use]
    pub fn layer_values(&self, layer: usize) -> &[f64] {
        &self.layers[layer].values
    }

    #[must_use]
    pub fn layer_activated(&self, layer: usize) -> &[f64] {
        &self.layers[layer].activated
    }

    /// Activated values of the last layer.
    #[must_use]
    pub fn output(&self) -> &[f64] {
        let last = self.layers.len() - 1;
        self.layer_activated(last)
    }
}
