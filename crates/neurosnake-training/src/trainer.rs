//! The generational training loop.
//!
//! Each call to [`Trainer::step`] runs one generation:
//!
//! 1. **Evaluate** - every agent plays one game on a worker thread
//! 2. **Rank** - fitness is computed and the population sorted best first
//! 3. **Save** - at `save_frequency` and at the last generation, the top
//!    `sample_size` genomes are written as a checkpoint
//! 4. **Report** - at `report_frequency`, fitness statistics and the top agents are logged
//! 5. **Breed** - unless this was the last generation, the top `sample_size`
//!    agents become parents; `population_size` children are bred on the
//!    workers and the parents are appended as elites
//! 6. **Mutate** - every new genome is mutated on the calling thread
//!    (elites only if `mutate_elites` is set)
//!
//! Construction resumes from the newest checkpoint when the task directory
//! already exists.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use neurosnake_brain::{
    mutation_table::MutationTable,
    network::{NetworkError, NeuralNetwork},
    snake_brain::SnakeBrain,
};
use neurosnake_engine::EnvironmentConfig;
use neurosnake_stats::descriptive::DescriptiveStats;

use crate::{
    agent::Agent,
    checkpoint::{CheckpointError, CheckpointStore, SavedCheckpoint},
    config::{ConfigError, TrainerConfig},
    genetic::{ParentPool, Sample},
    worker_pool::{PoolError, WorkerPool},
};

/// Number of agents listed in a generation report.
pub const TOP_AGENTS: usize = 3;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("invalid trainer configuration")]
    #[from]
    Config { source: ConfigError },
    #[display("checkpoint failure")]
    #[from]
    Checkpoint { source: CheckpointError },
    #[display("network failure")]
    #[from]
    Network { source: NetworkError },
    #[display("failed to start worker pool")]
    PoolSpawn { source: PoolError },
    #[display("worker job failed: {message}")]
    WorkerPanicked { message: String },
    #[display("worker pool is shut down")]
    PoolShutDown,
}

impl From<PoolError> for TrainingError {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::Spawn { .. } => Self::PoolSpawn { source: error },
            PoolError::ShutDown => Self::PoolShutDown,
            PoolError::JobPanicked { message } => Self::WorkerPanicked { message },
            PoolError::JobLost => Self::WorkerPanicked {
                message: error.to_string(),
            },
        }
    }
}

/// Fitness, score and steps of one ranked agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSummary {
    pub fitness: f64,
    pub score: usize,
    pub steps: usize,
}

/// What happened in one generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub generation: usize,
    /// Number of agents evaluated.
    pub population: usize,
    /// Best agents, best first.
    pub top: Vec<AgentSummary>,
    pub average_score: f64,
    pub fitness: DescriptiveStats,
    pub elapsed: Duration,
    pub saved: Option<SavedCheckpoint>,
}

impl GenerationReport {
    #[must_use]
    pub fn best(&self) -> AgentSummary {
        self.top[0]
    }
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub first_generation: usize,
    pub last_generation: usize,
    pub elapsed: Duration,
    pub final_checkpoint: Option<SavedCheckpoint>,
}

#[derive(Debug, Clone)]
pub enum TrainingOutcome {
    Completed(TrainingSummary),
    /// The newest checkpoint already is the last generation.
    AlreadyComplete { generation: usize },
}

#[derive(Debug)]
pub struct Trainer {
    config: TrainerConfig,
    environment: EnvironmentConfig,
    mutation_table: MutationTable,
    store: CheckpointStore,
    workers: WorkerPool,
    population: Vec<Agent>,
    generation: usize,
    first_generation: usize,
    last_checkpoint: Option<SavedCheckpoint>,
    finished: bool,
}

impl Trainer {
    /// Validates `config`, starts the workers and prepares the first
    /// generation to run.
    ///
    /// If the task directory exists and `latest_save_generation` names a
    /// checkpoint, the population is bred from that checkpoint and training
    /// continues with the following generation. A recorded checkpoint that
    /// cannot be read is an error. Without a task directory a random
    /// population is created.
    pub fn new(config: TrainerConfig) -> Result<Self, TrainingError> {
        config.validate()?;
        let mutation_table = MutationTable::new(config.mutation).ok_or(
            ConfigError::MutationRange {
                params: config.mutation,
            },
        )?;
        let workers = WorkerPool::new(config.worker_count())?;
        let mut trainer = Self {
            environment: config.environment(),
            store: CheckpointStore::new(config.task_dir()),
            mutation_table,
            workers,
            population: Vec::new(),
            generation: 1,
            first_generation: 1,
            last_checkpoint: None,
            finished: false,
            config,
        };

        let latest = trainer.config.latest_save_generation;
        if !trainer.store.exists() {
            if latest > 0 {
                log::warn!(
                    "generation {latest} is recorded as saved but {} does not exist, starting a new task",
                    trainer.store.task_dir().display()
                );
            }
            trainer.init_random()?;
        } else if latest >= trainer.config.max_generation {
            log::info!("training task already reached generation {latest}");
            trainer.generation = latest;
            trainer.finished = true;
        } else if latest == 0 {
            log::info!(
                "task directory {} has no recorded checkpoint, starting a new task",
                trainer.store.task_dir().display()
            );
            trainer.init_random()?;
        } else {
            trainer.restore(latest)?;
        }
        trainer.first_generation = trainer.generation;
        Ok(trainer)
    }

    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// The next generation to run, or the last one once finished.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn population(&self) -> &[Agent] {
        &self.population
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.size()
    }

    fn init_random(&mut self) -> Result<(), TrainingError> {
        log::info!(
            "initializing {} random agents with topology {:?}",
            self.config.population_size,
            self.config.topology
        );
        let mut rng = rand::rng();
        self.population = (0..self.config.population_size)
            .map(|_| {
                let mut brain = SnakeBrain::new(&self.config.topology)?;
                brain.randomize(&mut rng);
                Ok(Agent::new(brain, self.environment))
            })
            .collect::<Result<_, NetworkError>>()?;
        self.generation = 1;
        Ok(())
    }

    fn restore(&mut self, generation: usize) -> Result<(), TrainingError> {
        let samples = self
            .store
            .load(generation, self.config.sample_size, &self.config.topology)
            .inspect_err(|e| log::error!("cannot resume from generation {generation}: {e}"))?;
        self.breed(samples)?;
        self.generation = generation + 1;
        log::info!("resumed from generation {generation}");
        Ok(())
    }

    /// Runs one generation. Returns `None` once the last generation has run.
    ///
    /// A failed generation leaves the population incomplete, so the trainer
    /// stops: every later call returns `None`.
    pub fn step(&mut self) -> Result<Option<GenerationReport>, TrainingError> {
        if self.finished {
            return Ok(None);
        }
        let result = self.run_generation();
        if result.is_err() {
            self.finished = true;
        }
        result.map(Some)
    }

    fn run_generation(&mut self) -> Result<GenerationReport, TrainingError> {
        let started = Instant::now();
        let generation = self.generation;
        let is_last = generation >= self.config.max_generation;

        self.evaluate()?;
        self.rank();

        let samples = self.top_samples();
        let saved = if generation % self.config.save_frequency == 0 || is_last {
            let saved = timed("save", || {
                self.store
                    .save(generation, self.config.population_size, &samples)
            })?;
            self.last_checkpoint = Some(saved.clone());
            Some(saved)
        } else {
            None
        };

        let report = self.summarize(generation, started, saved);
        if generation % self.config.report_frequency == 0 {
            log_report(&report);
        }

        if is_last {
            self.finished = true;
        } else {
            self.breed(samples)?;
            self.generation += 1;
        }

        let report = GenerationReport {
            elapsed: started.elapsed(),
            ..report
        };
        log::info!(
            "generation {generation}: best fitness {:.3}, score {}, steps {}, average score {:.2} ({:.2?})",
            report.best().fitness,
            report.best().score,
            report.best().steps,
            report.average_score,
            report.elapsed
        );
        Ok(report)
    }

    /// Runs every remaining generation, passing each report to `on_generation`.
    ///
    /// Stops at the first error, whether from training or from `on_generation`.
    pub fn run<F, E>(&mut self, mut on_generation: F) -> Result<TrainingOutcome, E>
    where
        F: FnMut(&GenerationReport) -> Result<(), E>,
        E: From<TrainingError>,
    {
        if self.finished {
            return Ok(TrainingOutcome::AlreadyComplete {
                generation: self.generation,
            });
        }

        log::info!(
            "training generations {}..={} with population {} and {} samples on {} workers",
            self.generation,
            self.config.max_generation,
            self.config.population_size,
            self.config.sample_size,
            self.workers.size()
        );
        let started = Instant::now();
        let mut last_generation = self.generation;
        while let Some(report) = self.step()? {
            last_generation = report.generation;
            on_generation(&report)?;
        }

        Ok(TrainingOutcome::Completed(TrainingSummary {
            first_generation: self.first_generation,
            last_generation,
            elapsed: started.elapsed(),
            final_checkpoint: self.last_checkpoint.clone(),
        }))
    }

    fn evaluate(&mut self) -> Result<(), TrainingError> {
        timed("evaluate", || -> Result<(), TrainingError> {
            let handles = self
                .population
                .drain(..)
                .map(|mut agent| {
                    self.workers.submit(move || {
                        agent.run();
                        agent
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.population = handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Result<_, _>>()?;
            Ok(())
        })
    }

    fn rank(&mut self) {
        timed("rank", || {
            for agent in &mut self.population {
                agent.evaluate();
            }
            self.population
                .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        });
    }

    fn top_samples(&self) -> Vec<Sample> {
        self.population
            .iter()
            .take(self.config.sample_size)
            .map(|agent| Sample {
                network: agent.brain().network().clone(),
                fitness: agent.fitness(),
                score: agent.score(),
                steps: agent.total_steps(),
            })
            .collect()
    }

    fn summarize(
        &self,
        generation: usize,
        started: Instant,
        saved: Option<SavedCheckpoint>,
    ) -> GenerationReport {
        #[expect(clippy::cast_precision_loss)]
        let average_score = self.population.iter().map(|a| a.score() as f64).sum::<f64>()
            / self.population.len() as f64;
        let fitness = DescriptiveStats::new(self.population.iter().map(Agent::fitness))
            .expect("population is never empty");
        GenerationReport {
            generation,
            population: self.population.len(),
            top: self
                .population
                .iter()
                .take(TOP_AGENTS)
                .map(|agent| AgentSummary {
                    fitness: agent.fitness(),
                    score: agent.score(),
                    steps: agent.total_steps(),
                })
                .collect(),
            average_score,
            fitness,
            elapsed: started.elapsed(),
            saved,
        }
    }

    /// Replaces the population with children of `samples` plus elite copies.
    fn breed(&mut self, samples: Vec<Sample>) -> Result<(), TrainingError> {
        let parents = Arc::new(ParentPool::new(samples));

        let children = timed("crossover", || -> Result<Vec<NeuralNetwork>, TrainingError> {
            let handles = (0..self.config.population_size)
                .map(|_| {
                    let parents = Arc::clone(&parents);
                    self.workers
                        .submit(move || parents.breed(&mut rand::rng()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Result<_, _>>()?)
        })?;

        let mut brains = children
            .into_iter()
            .chain(parents.elites())
            .map(SnakeBrain::from_network)
            .collect::<Result<Vec<_>, _>>()?;

        timed("mutate", || {
            let mut rng = rand::rng();
            let mutated = if self.config.mutate_elites {
                brains.len()
            } else {
                self.config.population_size
            };
            for brain in &mut brains[..mutated] {
                brain.mutate(&self.mutation_table, &mut rng);
            }
        });

        self.population = brains
            .into_iter()
            .map(|brain| Agent::new(brain, self.environment))
            .collect();
        Ok(())
    }
}

fn timed<T, F>(phase: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let result = f();
    log::debug!("{phase} took {:.2?}", started.elapsed());
    result
}

fn log_report(report: &GenerationReport) {
    let stats = &report.fitness;
    log::info!(
        "generation {} report: {} agents, average score {:.2}",
        report.generation,
        report.population,
        report.average_score
    );
    log::info!(
        "  fitness min {:.3} max {:.3} mean {:.3} median {:.3}",
        stats.min,
        stats.max,
        stats.mean,
        stats.median
    );
    for (rank, agent) in report.top.iter().enumerate() {
        log::info!(
            "  #{rank}: fitness {:.3}, score {}, steps {}",
            agent.fitness,
            agent.score,
            agent.steps
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny(dir: &std::path::Path) -> TrainerConfig {
        TrainerConfig {
            max_generation: 3,
            population_size: 6,
            sample_size: 2,
            report_frequency: 1,
            save_frequency: 2,
            training_data_path: dir.to_owned(),
            task_name: "unit".to_owned(),
            worker_threads: 2,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_population_sizes_per_generation() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(tiny(dir.path())).unwrap();
        assert_eq!(trainer.population().len(), 6);

        let first = trainer.step().unwrap().unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(first.population, 6);
        assert!(first.saved.is_none());
        // children plus elites
        assert_eq!(trainer.population().len(), 8);

        let second = trainer.step().unwrap().unwrap();
        assert_eq!(second.population, 8);
        assert_eq!(second.saved.as_ref().map(|s| s.generation), Some(2));
    }

    #[test]
    fn test_report_is_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(tiny(dir.path())).unwrap();
        let report = trainer.step().unwrap().unwrap();
        assert_eq!(report.top.len(), TOP_AGENTS);
        assert!(report.top.is_sorted_by(|a, b| a.fitness >= b.fitness));
        assert_eq!(report.best().fitness, report.fitness.max);
    }

    #[test]
    fn test_elites_are_unmutated_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            mutate_elites: false,
            ..tiny(dir.path())
        };
        let mut trainer = Trainer::new(config).unwrap();
        trainer.evaluate().unwrap();
        trainer.rank();
        let samples = trainer.top_samples();
        let expected: Vec<_> = samples.iter().map(|s| s.network.weights().to_vec()).collect();

        trainer.breed(samples).unwrap();
        let elites = &trainer.population()[6..];
        assert_eq!(elites.len(), 2);
        for (agent, weights) in elites.iter().zip(&expected) {
            assert_eq!(agent.brain().network().weights(), weights.as_slice());
        }
    }

    #[test]
    fn test_step_after_finish_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            max_generation: 1,
            ..tiny(dir.path())
        };
        let mut trainer = Trainer::new(config).unwrap();
        let report = trainer.step().unwrap().unwrap();
        assert_eq!(report.saved.as_ref().map(|s| s.generation), Some(1));
        assert!(trainer.is_finished());
        assert!(trainer.step().unwrap().is_none());
    }

    mod resume {
        use super::*;

        fn trained(dir: &std::path::Path) -> TrainerConfig {
            let config = TrainerConfig {
                max_generation: 2,
                save_frequency: 1,
                ..tiny(dir)
            };
            let outcome = Trainer::new(config.clone())
                .unwrap()
                .run(|_| Ok::<_, TrainingError>(()))
                .unwrap();
            assert!(matches!(
                outcome,
                TrainingOutcome::Completed(TrainingSummary {
                    first_generation: 1,
                    last_generation: 2,
                    ..
                })
            ));
            config
        }

        #[test]
        fn test_continues_after_latest_checkpoint() {
            let dir = tempfile::tempdir().unwrap();
            let config = TrainerConfig {
                latest_save_generation: 1,
                max_generation: 3,
                ..trained(dir.path())
            };
            let mut trainer = Trainer::new(config).unwrap();
            assert_eq!(trainer.generation(), 2);
            assert_eq!(trainer.population().len(), 8);

            let mut generations = Vec::new();
            let outcome = trainer
                .run(|r| {
                    generations.push(r.generation);
                    Ok::<_, TrainingError>(())
                })
                .unwrap();
            assert_eq!(generations, [2, 3]);
            let TrainingOutcome::Completed(summary) = outcome else {
                panic!("training should run");
            };
            assert_eq!(summary.first_generation, 2);
            let last = summary.final_checkpoint.unwrap();
            assert_eq!(last.generation, 3);
            assert!(last.best_network_path.is_file());
        }

        #[test]
        fn test_already_complete() {
            let dir = tempfile::tempdir().unwrap();
            let config = TrainerConfig {
                latest_save_generation: 2,
                ..trained(dir.path())
            };
            let mut trainer = Trainer::new(config).unwrap();
            assert!(trainer.is_finished());
            assert!(matches!(
                trainer.run(|_| Ok::<_, TrainingError>(())).unwrap(),
                TrainingOutcome::AlreadyComplete { generation: 2 }
            ));
        }

        #[test]
        fn test_missing_recorded_generation_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let config = TrainerConfig {
                latest_save_generation: 1,
                max_generation: 5,
                ..tiny(dir.path())
            };
            std::fs::create_dir_all(config.task_dir()).unwrap();
            assert!(matches!(
                Trainer::new(config),
                Err(TrainingError::Checkpoint {
                    source: CheckpointError::MissingGeneration { generation: 1, .. }
                })
            ));
        }

        #[test]
        fn test_topology_change_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let config = TrainerConfig {
                latest_save_generation: 1,
                max_generation: 3,
                topology: vec![28, 6, 4],
                ..trained(dir.path())
            };
            assert!(matches!(
                Trainer::new(config),
                Err(TrainingError::Checkpoint {
                    source: CheckpointError::TopologyMismatch { .. }
                })
            ));
        }

        #[test]
        fn test_missing_task_dir_starts_fresh() {
            let dir = tempfile::tempdir().unwrap();
            let config = TrainerConfig {
                latest_save_generation: 4,
                ..tiny(dir.path())
            };
            let trainer = Trainer::new(config).unwrap();
            assert_eq!(trainer.generation(), 1);
            assert_eq!(trainer.population().len(), 6);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            sample_size: 7,
            ..tiny(dir.path())
        };
        assert!(matches!(
            Trainer::new(config),
            Err(TrainingError::Config {
                source: ConfigError::SampleSize { .. }
            })
        ));
    }

    #[test]
    fn test_failed_generation_stops_the_trainer() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(tiny(dir.path())).unwrap();
        trainer.workers.shutdown();

        assert!(matches!(trainer.step(), Err(TrainingError::PoolShutDown)));
        assert!(trainer.is_finished());
        assert!(trainer.step().unwrap().is_none());
    }

    #[test]
    fn test_callback_error_stops_the_run() {
        #[derive(Debug)]
        enum StopError {
            Training,
            Callback(usize),
        }
        impl From<TrainingError> for StopError {
            fn from(_: TrainingError) -> Self {
                Self::Training
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(tiny(dir.path())).unwrap();
        let mut seen = Vec::new();
        let result = trainer.run(|report| {
            seen.push(report.generation);
            if report.generation == 2 {
                return Err(StopError::Callback(report.generation));
            }
            Ok(())
        });
        assert!(matches!(result, Err(StopError::Callback(2))));
        assert_eq!(seen, [1, 2]);
    }

    #[test]
    fn test_pool_errors_map_to_training_errors() {
        assert!(matches!(
            TrainingError::from(PoolError::ShutDown),
            TrainingError::PoolShutDown
        ));
        assert!(matches!(
            TrainingError::from(PoolError::JobPanicked {
                message: "x".to_owned()
            }),
            TrainingError::WorkerPanicked { message } if message == "x"
        ));
    }
}
