//! Mean/std constants applied to network inputs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::EstimatorError;

/// Constants used when the model was trained with fixed input statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedNormalization {
    pub image_mean: f32,
    pub image_std: f32,
    pub beacon_mean: f64,
    pub beacon_std: f64,
}

impl Default for FixedNormalization {
    fn default() -> Self {
        FixedNormalization {
            image_mean: 128.0,
            image_std: 1.0,
            beacon_mean: 0.0,
            beacon_std: 1.0,
        }
    }
}

/// Statistics computed over the training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetNormalization {
    /// Per-channel image mean in B, G, R order.
    pub image_mean: [f32; 3],
    /// Mean signal of every beacon, in beacon-setting order.
    pub beacon_mean: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InputNormalization {
    Fixed(FixedNormalization),
    DatasetDerived(DatasetNormalization),
}

impl Default for InputNormalization {
    fn default() -> Self {
        InputNormalization::Fixed(FixedNormalization::default())
    }
}

impl InputNormalization {
    /// Reads dataset-derived statistics from a YAML file.
    ///
    /// ```yaml
    /// image_mean: [104.0, 117.0, 123.0]
    /// beacon_mean: [-72.5, -80.1]
    /// ```
    pub fn load_dataset_derived(path: &Path) -> Result<Self, EstimatorError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EstimatorError::IOError(format!("{}: {e}", path.display())))?;
        let stats: DatasetNormalization = serde_yaml::from_str(&contents)?;
        Ok(InputNormalization::DatasetDerived(stats))
    }

    /// Normalizes one 8-bit channel value. `channel` indexes B, G, R.
    pub fn apply_pixel(&self, channel: usize, value: u8) -> f32 {
        match self {
            InputNormalization::Fixed(fixed) => (value as f32 - fixed.image_mean) / fixed.image_std,
            InputNormalization::DatasetDerived(stats) => value as f32 - stats.image_mean[channel],
        }
    }

    /// Normalizes a beacon signal vector.
    ///
    /// # Errors
    ///
    /// * [`EstimatorError::InvalidParams`] - if dataset-derived means do not
    ///   match the number of beacons
    pub fn apply_beacon(&self, beacon: &[f64]) -> Result<Vec<f64>, EstimatorError> {
        match self {
            InputNormalization::Fixed(fixed) => Ok(beacon
                .iter()
                .map(|v| (v - fixed.beacon_mean) / fixed.beacon_std)
                .collect()),
            InputNormalization::DatasetDerived(stats) => {
                if stats.beacon_mean.len() != beacon.len() {
                    return Err(EstimatorError::InvalidParams(format!(
                        "beacon mean has {} entries, signal has {}",
                        stats.beacon_mean.len(),
                        beacon.len()
                    )));
                }
                Ok(beacon
                    .iter()
                    .zip(&stats.beacon_mean)
                    .map(|(v, mean)| v - mean)
                    .collect())
            }
        }
    }
}
