//! Checkpoint files of a training task.
//!
//! Every saved generation gets its own directory holding one network file per
//! sample, best first:
//!
//! ```text
//! <training_data_path>/<task_name>/gen_0000100/nn_00000.json
//!                                             /nn_00001.json
//!                                             ...
//! ```
//!
//! The `description` object of each network file records where the sample
//! came from (see [`SampleDescription`]); its `fitness` is what a resumed run
//! uses for roulette-wheel selection.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use neurosnake_brain::network::{NetworkError, NeuralNetwork};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::genetic::Sample;

/// Timestamp format of [`SampleDescription::create`].
pub const CREATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CheckpointError {
    #[display("failed to create checkpoint directory {}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[display("failed to encode description of sample {index}")]
    EncodeDescription {
        index: usize,
        source: serde_json::Error,
    },
    #[display("failed to read or write a checkpoint network")]
    Network { source: NetworkError },
    #[display("invalid description in {}", path.display())]
    Description {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("{} has topology {found:?}, expected {expected:?}", path.display())]
    TopologyMismatch {
        path: PathBuf,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[display("checkpoint of generation {generation} is missing: {}", path.display())]
    MissingGeneration { generation: usize, path: PathBuf },
    #[display("generation {generation} has {found} samples, expected {expected}")]
    SampleCount {
        generation: usize,
        expected: usize,
        found: usize,
    },
}

/// Provenance stored in the `description` of every checkpoint network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDescription {
    pub generation: usize,
    pub population_size: usize,
    pub sample_size: usize,
    pub fitness: f64,
    pub score: usize,
    pub step_count: usize,
    /// Local time of the save, formatted with [`CREATE_FORMAT`].
    pub create: String,
}

/// A generation written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCheckpoint {
    pub generation: usize,
    pub directory: PathBuf,
    /// Network file of the best sample.
    pub best_network_path: PathBuf,
    /// Local save time, formatted with [`CREATE_FORMAT`].
    pub create: String,
}

/// Reads and writes the checkpoints below one task directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    task_dir: PathBuf,
}

impl CheckpointStore {
    #[must_use]
    pub fn new(task_dir: PathBuf) -> Self {
        Self { task_dir }
    }

    #[must_use]
    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }

    /// Returns `true` if the task directory exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.task_dir.is_dir()
    }

    #[must_use]
    pub fn generation_dir(&self, generation: usize) -> PathBuf {
        self.task_dir.join(format!("gen_{generation:07}"))
    }

    #[must_use]
    pub fn sample_path(&self, generation: usize, index: usize) -> PathBuf {
        self.generation_dir(generation)
            .join(format!("nn_{index:05}.json"))
    }

    /// Writes `samples` as generation `generation`.
    ///
    /// Existing files of the same generation are overwritten.
    pub fn save(
        &self,
        generation: usize,
        population_size: usize,
        samples: &[Sample],
    ) -> Result<SavedCheckpoint, CheckpointError> {
        let directory = self.generation_dir(generation);
        fs::create_dir_all(&directory).map_err(|source| CheckpointError::CreateDir {
            path: directory.clone(),
            source,
        })?;

        let create = chrono::Local::now().format(CREATE_FORMAT).to_string();
        for (index, sample) in samples.iter().enumerate() {
            let description = SampleDescription {
                generation,
                population_size,
                sample_size: samples.len(),
                fitness: sample.fitness,
                score: sample.score,
                step_count: sample.steps,
                create: create.clone(),
            };
            let Value::Object(description) = serde_json::to_value(&description)
                .map_err(|source| CheckpointError::EncodeDescription { index, source })?
            else {
                unreachable!("a struct always serializes to an object");
            };

            let mut network = sample.network.clone();
            *network.description_mut() = description;
            network
                .save(self.sample_path(generation, index))
                .map_err(|source| CheckpointError::Network { source })?;
        }

        log::info!(
            "saved {} samples of generation {generation} to {}",
            samples.len(),
            directory.display()
        );
        Ok(SavedCheckpoint {
            generation,
            best_network_path: self.sample_path(generation, 0),
            directory,
            create,
        })
    }

    /// Loads the `sample_size` samples of generation `generation`.
    ///
    /// Every sample must exist, carry a valid description and match
    /// `topology`.
    pub fn load(
        &self,
        generation: usize,
        sample_size: usize,
        topology: &[usize],
    ) -> Result<Vec<Sample>, CheckpointError> {
        let directory = self.generation_dir(generation);
        if !directory.is_dir() {
            return Err(CheckpointError::MissingGeneration {
                generation,
                path: directory,
            });
        }

        let mut samples = Vec::with_capacity(sample_size);
        for index in 0..sample_size {
            let path = self.sample_path(generation, index);
            if !path.is_file() {
                return Err(CheckpointError::SampleCount {
                    generation,
                    expected: sample_size,
                    found: index,
                });
            }
            let network =
                NeuralNetwork::load(&path).map_err(|source| CheckpointError::Network { source })?;
            if network.topology() != topology {
                return Err(CheckpointError::TopologyMismatch {
                    path,
                    expected: topology.to_vec(),
                    found: network.topology().to_vec(),
                });
            }
            let description: SampleDescription =
                serde_json::from_value(Value::Object(network.description().clone()))
                    .map_err(|source| CheckpointError::Description {
                        path: path.clone(),
                        source,
                    })?;
            samples.push(Sample {
                network,
                fitness: description.fitness,
                score: description.score,
                steps: description.step_count,
            });
        }
        log::info!(
            "loaded {} samples of generation {generation} from {}",
            samples.len(),
            directory.display()
        );
        Ok(samples)
    }
}
