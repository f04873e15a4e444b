use std::path::PathBuf;

use anyhow::Context;
use neurosnake_brain::{network::NeuralNetwork, snake_brain::SnakeBrain};
use neurosnake_engine::{BoardSeed, EnvironmentConfig};
use neurosnake_stats::descriptive::DescriptiveStats;
use neurosnake_training::agent::Agent;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Network file to play with
    #[arg(long)]
    network: PathBuf,
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    #[arg(long, default_value_t = 10)]
    rows: usize,
    #[arg(long, default_value_t = 10)]
    cols: usize,
    #[arg(long, default_value_t = 150)]
    wander_threshold: usize,
    #[arg(long)]
    strict_wander: bool,
    /// Board seed of the first game (32 hex digits); later games derive from it
    #[arg(long)]
    seed: Option<BoardSeed>,
    /// Writes the game records as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameRecord {
    seed: BoardSeed,
    score: usize,
    steps: usize,
    death: String,
    fitness: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationRecord {
    network_file: PathBuf,
    rows: usize,
    cols: usize,
    games: Vec<GameRecord>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        network: network_path,
        games,
        rows,
        cols,
        wander_threshold,
        strict_wander,
        seed,
        output,
    } = arg;
    anyhow::ensure!(*games > 0, "--games must be at least 1");
    anyhow::ensure!(
        *rows >= 2 && *cols >= 2,
        "board must be at least 2x2, got {rows}x{cols}"
    );

    let network = NeuralNetwork::load(network_path)
        .with_context(|| format!("Failed to load network file: {}", network_path.display()))?;
    let brain = SnakeBrain::from_network(network).with_context(|| {
        format!(
            "Network {} cannot drive a snake",
            network_path.display()
        )
    })?;
    let config = EnvironmentConfig {
        rows: *rows,
        cols: *cols,
        wander_threshold: *wander_threshold,
        strict_wander: *strict_wander,
    };

    let first_seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut seeds = Pcg32::from_seed(first_seed.to_bytes());
    eprintln!(
        "Playing {games} games on a {rows}x{cols} board with {} (seed {first_seed})",
        network_path.display()
    );

    let records = (0..*games)
        .map(|game| {
            let seed = if game == 0 { first_seed } else { seeds.random() };
            let record = play(&brain, config, seed);
            eprintln!(
                "  Game #{game:3}: score {:3}, steps {:5}, {:13}, seed {seed}",
                record.score, record.steps, record.death
            );
            record
        })
        .collect::<Vec<_>>();

    #[expect(clippy::cast_precision_loss)]
    let score_stats = DescriptiveStats::new(records.iter().map(|r| r.score as f64))
        .context("no games were played")?;
    let fitness_stats = DescriptiveStats::new(records.iter().map(|r| r.fitness))
        .context("no games were played")?;
    print_stats("Score", &score_stats);
    print_stats("Fitness", &fitness_stats);

    if let Some(output) = output {
        let record = EvaluationRecord {
            network_file: network_path.clone(),
            rows: *rows,
            cols: *cols,
            games: records,
        };
        util::write_json_file("evaluation", output, &record)?;
        eprintln!("Wrote game records to {}", output.display());
    }
    Ok(())
}

fn play(brain: &SnakeBrain, config: EnvironmentConfig, seed: BoardSeed) -> GameRecord {
    let mut agent = Agent::with_seed(brain.clone(), config, seed);
    let death = agent
        .run()
        .map_or_else(|| "stopped".to_owned(), |reason| reason.to_string());
    let fitness = agent.evaluate();
    GameRecord {
        seed,
        score: agent.score(),
        steps: agent.total_steps(),
        death,
        fitness,
    }
}

fn print_stats(label: &str, stats: &DescriptiveStats) {
    eprintln!("{label}:");
    eprintln!("  Min:    {:.3}", stats.min);
    eprintln!("  Max:    {:.3}", stats.max);
    eprintln!("  Mean:   {:.3}", stats.mean);
    eprintln!("  Median: {:.3}", stats.median);
    eprintln!("  StdDev: {:.3}", stats.std_dev);
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;

    use super::*;

    #[test]
    fn test_play_is_reproducible_from_seed() {
        let mut brain = SnakeBrain::new(&[28, 8, 4]).unwrap();
        brain.randomize(&mut Pcg32::seed_from_u64(5));
        let config = EnvironmentConfig::default();
        let seed = BoardSeed::from_u64(77);

        let a = play(&brain, config, seed);
        let b = play(&brain, config, seed);
        assert_eq!((a.score, a.steps, &a.death), (b.score, b.steps, &b.death));
        assert_eq!(a.fitness, b.fitness);
        assert_ne!(a.death, "stopped");
    }
}
