use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::loader::SourceOptions;
use crate::data::projector::ProjectorKind;
use crate::error::ConfigError;

/// Tool configuration, loaded from TOML. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub options: SourceOptions,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            path: PathBuf::from("pitches.csv"),
            options: SourceOptions::default(),
        }
    }
}

/// Shuffle / batch / repeat settings for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub policy: ProjectorKind,
    pub batch_size: usize,
    /// Shuffle window; 0 or 1 keeps file order.
    pub shuffle_buffer: usize,
    /// Restart the source each time it is exhausted.
    pub repeat: bool,
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig::training()
    }
}

impl DatasetConfig {
    /// In file order, one pass.
    pub fn training() -> Self {
        DatasetConfig {
            policy: ProjectorKind::Training,
            batch_size: 100,
            shuffle_buffer: 0,
            repeat: false,
            seed: 42,
        }
    }

    /// Shuffled over a wide window and repeated forever.
    pub fn estimator_train() -> Self {
        DatasetConfig {
            policy: ProjectorKind::Estimator,
            shuffle_buffer: 25_000,
            repeat: true,
            ..DatasetConfig::training()
        }
    }

    /// Lightly shuffled, one pass.
    pub fn estimator_eval() -> Self {
        DatasetConfig {
            policy: ProjectorKind::Estimator,
            shuffle_buffer: 1_000,
            ..DatasetConfig::training()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::ErrorPolicy;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
            [input]
            path = "data/2017.csv"
            on_error = "skip"
            check_header = true

            [dataset]
            policy = "estimator"
            batch_size = 32
            shuffle_buffer = 500
            repeat = true
            seed = 7
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.input.path, PathBuf::from("data/2017.csv"));
        assert_eq!(config.input.options.on_error, ErrorPolicy::Skip);
        assert!(config.input.options.check_header);
        assert_eq!(config.dataset.policy, ProjectorKind::Estimator);
        assert_eq!(config.dataset.batch_size, 32);
        assert_eq!(config.dataset.shuffle_buffer, 500);
        assert!(config.dataset.repeat);
        assert_eq!(config.dataset.seed, 7);
    }

    #[test]
    fn test_missing_sections_default() {
        let config: Config = toml::from_str("[dataset]\nbatch_size = 10\n").unwrap();
        assert_eq!(config.input, InputConfig::default());
        assert_eq!(config.dataset.batch_size, 10);
        assert_eq!(config.dataset.policy, ProjectorKind::Training);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = DatasetConfig {
            batch_size: 0,
            ..DatasetConfig::training()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_presets() {
        let train = DatasetConfig::estimator_train();
        assert_eq!(train.shuffle_buffer, 25_000);
        assert!(train.repeat);
        let eval = DatasetConfig::estimator_eval();
        assert_eq!(eval.shuffle_buffer, 1_000);
        assert!(!eval.repeat);
        assert_eq!(eval.batch_size, 100);
    }
}
