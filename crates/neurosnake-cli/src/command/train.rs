use std::path::{Path, PathBuf};

use anyhow::Context;
use neurosnake_training::trainer::{GenerationReport, Trainer, TrainingOutcome};

use crate::settings::Settings;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Settings file, created with defaults if missing
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Overrides `training.maxGeneration`
    #[arg(long)]
    max_generation: Option<usize>,
    /// Overrides `training.workerThreads`
    #[arg(long)]
    threads: Option<usize>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        settings: settings_path,
        max_generation,
        threads,
    } = arg;

    let mut settings = Settings::load_or_create(settings_path)?;
    if let Some(max_generation) = *max_generation {
        settings.training.max_generation = max_generation;
    }
    if let Some(threads) = *threads {
        settings.training.worker_threads = threads;
    }

    let mut trainer = Trainer::new(settings.training.clone()).with_context(|| {
        format!(
            "Failed to start training task {}",
            settings.training.task_dir().display()
        )
    })?;
    eprintln!(
        "Training {} from generation {} to {} on {} workers",
        settings.training.task_name,
        trainer.generation(),
        settings.training.max_generation,
        trainer.worker_count()
    );

    let outcome = trainer
        .run(|report| record_report(&mut settings, settings_path, report))
        .context("Training failed")?;

    match outcome {
        TrainingOutcome::Completed(summary) => {
            eprintln!(
                "Trained generations {}..={} in {:.2?}",
                summary.first_generation, summary.last_generation, summary.elapsed
            );
            if let Some(checkpoint) = summary.final_checkpoint {
                eprintln!(
                    "Best network: {}",
                    checkpoint.best_network_path.display()
                );
            }
        }
        TrainingOutcome::AlreadyComplete { generation } => {
            eprintln!(
                "Task {} already reached generation {generation}; raise maxGeneration to continue",
                settings.training.task_name
            );
        }
    }
    Ok(())
}

/// Writes a saved checkpoint into the settings file.
///
/// Training cannot resume from a checkpoint the settings file does not
/// record, so a failed write stops the run.
fn record_report(
    settings: &mut Settings,
    settings_path: &Path,
    report: &GenerationReport,
) -> anyhow::Result<()> {
    let Some(saved) = &report.saved else {
        return Ok(());
    };
    eprintln!(
        "Saved generation {} to {}",
        saved.generation,
        saved.directory.display()
    );
    settings.record_checkpoint(saved);
    settings.save(settings_path).with_context(|| {
        format!(
            "Failed to record generation {} in {}",
            saved.generation,
            settings_path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use neurosnake_stats::descriptive::DescriptiveStats;
    use neurosnake_training::{checkpoint::SavedCheckpoint, trainer::AgentSummary};

    use super::*;

    fn report(saved: Option<SavedCheckpoint>) -> GenerationReport {
        GenerationReport {
            generation: 4,
            population: 1,
            top: vec![AgentSummary {
                fitness: 1.0,
                score: 0,
                steps: 3,
            }],
            average_score: 0.0,
            fitness: DescriptiveStats::new([1.0]).unwrap(),
            elapsed: Duration::ZERO,
            saved,
        }
    }

    fn checkpoint() -> SavedCheckpoint {
        SavedCheckpoint {
            generation: 4,
            directory: PathBuf::from("training/task/gen_0000004"),
            best_network_path: PathBuf::from("training/task/gen_0000004/nn_00000.json"),
            create: "2025-03-14 09:26:53".to_owned(),
        }
    }

    #[test]
    fn test_report_without_checkpoint_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        record_report(&mut settings, &path, &report(None)).unwrap();
        assert!(!path.exists());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_checkpoint_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        record_report(&mut settings, &path, &report(Some(checkpoint()))).unwrap();
        let saved = Settings::load_or_create(&path).unwrap();
        assert_eq!(saved.training.latest_save_generation, 4);
        assert_eq!(saved, settings);
    }

    #[test]
    fn test_unwritable_settings_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a file.
        let path = dir.path().to_owned();
        let mut settings = Settings::default();
        let err = record_report(&mut settings, &path, &report(Some(checkpoint()))).unwrap_err();
        assert!(err.to_string().contains("generation 4"), "{err:#}");
    }
}
