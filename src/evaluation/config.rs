//! Evaluation run configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::EvaluationError;
use crate::estimator::InputNormalization;

/// File holding dataset-derived normalization constants, next to the model.
pub const NORMALIZATION_FILE: &str = "normalization.yaml";

/// Everything an evaluation run needs, already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Labeled dataset file.
    pub dataset_path: PathBuf,
    /// Beacon setting file the model was trained with.
    pub beacon_setting_path: PathBuf,
    /// Model file. For replayed runs this is the recorded prediction file.
    pub model_path: PathBuf,
    /// Directory receiving the result files.
    pub output_dir: PathBuf,
    /// Use the fixed input mean/std instead of the dataset-derived statistics.
    #[serde(default)]
    pub use_fixed_input_mean_std: bool,
}

impl EvaluationConfig {
    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// * [`EvaluationError::ConfigError`] - if the file cannot be read or parsed
    pub fn load_from_yaml(path: &Path) -> Result<Self, EvaluationError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EvaluationError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&contents).map_err(|e| {
            EvaluationError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Saves the configuration to a YAML file.
    pub fn save_to_yaml(&self, path: &Path) -> Result<(), EvaluationError> {
        let yaml_string =
            serde_yaml::to_string(self).map_err(|e| EvaluationError::ConfigError(e.to_string()))?;
        let mut file =
            fs::File::create(path).map_err(|e| EvaluationError::ConfigError(e.to_string()))?;
        file.write_all(yaml_string.as_bytes())
            .map_err(|e| EvaluationError::ConfigError(e.to_string()))?;
        Ok(())
    }

    /// Resolves the input normalization constants.
    ///
    /// Fixed constants are used when `use_fixed_input_mean_std` is set;
    /// otherwise [`NORMALIZATION_FILE`] is read from the model directory.
    pub fn normalization(&self) -> Result<InputNormalization, EvaluationError> {
        if self.use_fixed_input_mean_std {
            return Ok(InputNormalization::default());
        }
        let model_dir = self.model_path.parent().unwrap_or_else(|| Path::new(""));
        let path = model_dir.join(NORMALIZATION_FILE);
        InputNormalization::load_dataset_derived(&path)
            .map_err(|e| EvaluationError::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_yaml() {
        let config = EvaluationConfig::load_from_yaml(Path::new("samples/evaluation.yaml")).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("samples/dataset_test.txt"));
        assert_eq!(config.model_path, PathBuf::from("samples/predictions_test.txt"));
        assert_eq!(config.output_dir, PathBuf::from("output/sample_run"));
        assert!(config.use_fixed_input_mean_std);
        assert_eq!(config.normalization().unwrap(), InputNormalization::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evaluation.yaml");
        let config = EvaluationConfig {
            dataset_path: PathBuf::from("data/test.txt"),
            beacon_setting_path: PathBuf::from("data/beacons.txt"),
            model_path: PathBuf::from("models/model.pb"),
            output_dir: PathBuf::from("results"),
            use_fixed_input_mean_std: false,
        };
        config.save_to_yaml(&path).unwrap();
        let reloaded = EvaluationConfig::load_from_yaml(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_dataset_derived_normalization_next_to_model() {
        let config = EvaluationConfig {
            dataset_path: PathBuf::from("samples/dataset_test.txt"),
            beacon_setting_path: PathBuf::from("samples/beacon_setting.txt"),
            model_path: PathBuf::from("samples/predictions_test.txt"),
            output_dir: PathBuf::from("output"),
            use_fixed_input_mean_std: false,
        };
        let normalization = config.normalization().unwrap();
        assert!(matches!(
            normalization,
            InputNormalization::DatasetDerived(_)
        ));

        let missing = EvaluationConfig {
            model_path: PathBuf::from("no_such_dir/model.pb"),
            ..config
        };
        assert!(matches!(
            missing.normalization(),
            Err(EvaluationError::ConfigError(_))
        ));
    }
}
