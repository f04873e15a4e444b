//! Trainer configuration.
//!
//! [`TrainerConfig`] is read from the `training` node of the settings file
//! (camelCase keys) and handed to [`Trainer::new`](crate::trainer::Trainer::new)
//! by value. Missing keys fall back to [`TrainerConfig::default`].

use std::{num::NonZero, path::PathBuf, thread};

use neurosnake_brain::{
    mutation_table::{MutationParams, MutationTable},
    network::NetworkError,
    snake_brain::SnakeBrain,
};
use neurosnake_engine::EnvironmentConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("maxGeneration must be at least 1")]
    NoGenerations,
    #[display("populationSize must be at least 1")]
    EmptyPopulation,
    #[display("sampleSize {sample_size} must be between 2 and populationSize ({population_size})")]
    SampleSize {
        sample_size: usize,
        population_size: usize,
    },
    #[display("{name} must be at least 1")]
    ZeroFrequency { name: &'static str },
    #[display("board must be at least 2x2, got {rows}x{cols}")]
    BoardTooSmall { rows: usize, cols: usize },
    #[display("invalid topology")]
    Topology { source: NetworkError },
    #[display("invalid mutation range [{}, {}] with step {}", params.range_low, params.range_high, params.step)]
    MutationRange { params: MutationParams },
    #[display("taskName must not be empty")]
    EmptyTaskName,
}

/// Settings of one training task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainerConfig {
    /// Last generation to run, inclusive.
    pub max_generation: usize,
    pub population_size: usize,
    /// Number of top agents kept as parents and written to checkpoints.
    pub sample_size: usize,
    pub report_frequency: usize,
    pub save_frequency: usize,
    pub wander_threshold: usize,
    pub strict_wander: bool,
    pub topology: Vec<usize>,
    pub mutation: MutationParams,
    pub training_data_path: PathBuf,
    pub task_name: String,
    /// Generation of the newest checkpoint, `0` if none was written.
    pub latest_save_generation: usize,
    pub board_rows: usize,
    pub board_cols: usize,
    /// Whether elite copies are mutated along with the bred children.
    pub mutate_elites: bool,
    /// Worker thread count; `0` uses the available parallelism.
    pub worker_threads: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_generation: 100,
            population_size: 500,
            sample_size: 50,
            report_frequency: 100,
            save_frequency: 100,
            wander_threshold: 150,
            strict_wander: false,
            topology: vec![28, 8, 4],
            mutation: MutationParams::default(),
            training_data_path: PathBuf::from("training"),
            task_name: "happysnake".to_owned(),
            latest_save_generation: 0,
            board_rows: 10,
            board_cols: 10,
            mutate_elites: true,
            worker_threads: 0,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_generation == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if !(2..=self.population_size).contains(&self.sample_size) {
            return Err(ConfigError::SampleSize {
                sample_size: self.sample_size,
                population_size: self.population_size,
            });
        }
        if self.report_frequency == 0 {
            return Err(ConfigError::ZeroFrequency {
                name: "reportFrequency",
            });
        }
        if self.save_frequency == 0 {
            return Err(ConfigError::ZeroFrequency {
                name: "saveFrequency",
            });
        }
        if self.board_rows < 2 || self.board_cols < 2 {
            return Err(ConfigError::BoardTooSmall {
                rows: self.board_rows,
                cols: self.board_cols,
            });
        }
        SnakeBrain::new(&self.topology).map_err(|source| ConfigError::Topology { source })?;
        if MutationTable::new(self.mutation).is_none() {
            return Err(ConfigError::MutationRange {
                params: self.mutation,
            });
        }
        if self.task_name.is_empty() {
            return Err(ConfigError::EmptyTaskName);
        }
        Ok(())
    }

    #[must_use]
    pub fn environment(&self) -> EnvironmentConfig {
        EnvironmentConfig {
            rows: self.board_rows,
            cols: self.board_cols,
            wander_threshold: self.wander_threshold,
            strict_wander: self.strict_wander,
        }
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        thread::available_parallelism().map_or(1, NonZero::get)
    }

    /// Directory holding every checkpoint of this task.
    #[must_use]
    pub fn task_dir(&self) -> PathBuf {
        self.training_data_path.join(&self.task_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TrainerConfig {
        TrainerConfig {
            population_size: 10,
            sample_size: 4,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        TrainerConfig::default().validate().unwrap();
        small().validate().unwrap();
    }

    #[test]
    fn test_reads_camel_case_with_defaults() {
        let json = r#"{
            "maxGeneration": 7,
            "populationSize": 20,
            "sampleSize": 5,
            "strictWander": true,
            "mutation": { "rangeLow": -0.1, "rangeHigh": 0.1, "step": 0.01 },
            "taskName": "demo"
        }"#;
        let config: TrainerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_generation, 7);
        assert_eq!(config.population_size, 20);
        assert!(config.strict_wander);
        assert_eq!(config.mutation.step, 0.01);
        assert_eq!(config.task_name, "demo");
        assert_eq!(config.topology, vec![28, 8, 4]);
        assert_eq!(config.report_frequency, 100);
        assert_eq!(config.task_dir(), PathBuf::from("training").join("demo"));
    }

    #[test]
    fn test_rejects_bad_sample_size() {
        for sample_size in [0, 1, 11] {
            let config = TrainerConfig {
                sample_size,
                ..small()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::SampleSize { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_bad_topology() {
        for topology in [vec![28], vec![28, 0, 4], vec![10, 8, 4], vec![28, 8, 3]] {
            let config = TrainerConfig {
                topology,
                ..small()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Topology { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_other_fields() {
        let cases = [
            TrainerConfig {
                max_generation: 0,
                ..small()
            },
            TrainerConfig {
                population_size: 0,
                ..small()
            },
            TrainerConfig {
                save_frequency: 0,
                ..small()
            },
            TrainerConfig {
                board_rows: 1,
                ..small()
            },
            TrainerConfig {
                mutation: MutationParams {
                    step: 0.0,
                    ..MutationParams::default()
                },
                ..small()
            },
            TrainerConfig {
                mutation: MutationParams {
                    range_low: 0.01,
                    range_high: 0.04,
                    step: 0.05,
                },
                ..small()
            },
            TrainerConfig {
                task_name: String::new(),
                ..small()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_environment_mirrors_board_fields() {
        let config = TrainerConfig {
            board_rows: 12,
            board_cols: 8,
            wander_threshold: 40,
            strict_wander: true,
            ..small()
        };
        let env = config.environment();
        assert_eq!((env.rows, env.cols), (12, 8));
        assert_eq!(env.stuck_threshold(), 95);
    }
}
