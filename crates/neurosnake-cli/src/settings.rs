//! The on-disk settings file.
//!
//! ```json
//! {
//!   "training": { "maxGeneration": 100, "populationSize": 500, ... },
//!   "ai": { "networkFile": "training/happysnake/gen_0000100/nn_00000.json" },
//!   "latestSaveTimestamp": "2025-01-01 12:00:00"
//! }
//! ```
//!
//! The file doubles as the resume record of a training task: every checkpoint
//! updates `training.latestSaveGeneration` and `ai.networkFile`. The timestamp
//! is the checkpoint's local `create` time, in
//! [`CREATE_FORMAT`](neurosnake_training::checkpoint::CREATE_FORMAT).

use std::path::{Path, PathBuf};

use neurosnake_training::{checkpoint::SavedCheckpoint, config::TrainerConfig};
use serde::{Deserialize, Serialize};

use crate::util;

const FILE_KIND: &str = "settings";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub training: TrainerConfig,
    pub ai: AiSettings,
    pub latest_save_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    /// Best network of the newest checkpoint.
    pub network_file: Option<PathBuf>,
}

impl Settings {
    /// Reads `path`, or writes and returns the defaults if it does not exist.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            return util::read_json_file(FILE_KIND, path);
        }
        let settings = Self::default();
        settings.save(path)?;
        log::info!("created default settings file {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        util::write_json_file(FILE_KIND, path, self)
    }

    /// Points the resume record at `checkpoint`.
    pub fn record_checkpoint(&mut self, checkpoint: &SavedCheckpoint) {
        self.training.latest_save_generation = checkpoint.generation;
        self.ai.network_file = Some(checkpoint.best_network_path.clone());
        self.latest_save_timestamp = Some(checkpoint.create.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.is_file());
        assert_eq!(Settings::load_or_create(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "training": { "populationSize": 20, "sampleSize": 4 } }"#,
        )
        .unwrap();

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings.training.population_size, 20);
        assert_eq!(settings.training.sample_size, 4);
        assert_eq!(settings.training.topology, [28, 8, 4]);
        assert_eq!(settings.ai.network_file, None);
    }

    #[test]
    fn test_record_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.record_checkpoint(&SavedCheckpoint {
            generation: 40,
            directory: PathBuf::from("training/happysnake/gen_0000040"),
            best_network_path: PathBuf::from("training/happysnake/gen_0000040/nn_00000.json"),
            create: "2025-03-14 09:26:53".to_owned(),
        });
        settings.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["training"]["latestSaveGeneration"], 40);
        assert_eq!(
            raw["ai"]["networkFile"],
            "training/happysnake/gen_0000040/nn_00000.json"
        );
        assert_eq!(raw["latestSaveTimestamp"], "2025-03-14 09:26:53");
        assert_eq!(Settings::load_or_create(&path).unwrap(), settings);
    }
}
