//! Serves predictions recorded by an external inference run.
//!
//! The prediction file uses the same layout as `localize-poses.txt`: three
//! header lines followed by `image X Y Z W P Q R` rows. A prediction is
//! matched to a sample by the image identifier exactly as written in both
//! files. When the prediction file holds bare file names instead, a sample
//! falls back to its file name, provided no other sample has already claimed
//! that prediction.

use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{EstimatorError, InputNormalization, PoseEstimator};
use crate::dataset::{parse_pose_values, LabeledSample, HEADER_LINES};
use crate::pose::Pose;

#[derive(Debug, Clone, Default)]
pub struct ReplayEstimator {
    predictions: HashMap<String, Pose>,
    /// Bare-name predictions served through the fallback, and the sample
    /// identifier that took each of them.
    claimed: HashMap<String, String>,
}

impl ReplayEstimator {
    pub fn new(predictions: HashMap<String, Pose>) -> Self {
        ReplayEstimator {
            predictions,
            claimed: HashMap::new(),
        }
    }

    /// Loads recorded predictions from a pose file.
    ///
    /// # Errors
    ///
    /// * [`EstimatorError::IOError`] - if the file cannot be read
    /// * [`EstimatorError::ParseError`] - if a row is malformed or an image
    ///   identifier appears twice
    pub fn load(path: &Path) -> Result<Self, EstimatorError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EstimatorError::IOError(format!("{}: {e}", path.display())))?;

        let mut predictions = HashMap::new();
        for (line_no, line) in contents.lines().enumerate().skip(HEADER_LINES) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 8 {
                return Err(EstimatorError::ParseError(format!(
                    "line {}: expected 8 fields (image, 7 pose values), got {}",
                    line_no + 1,
                    fields.len()
                )));
            }
            let row =
                parse_pose_values(&fields[1..], line_no + 1).map_err(EstimatorError::ParseError)?;
            if predictions
                .insert(fields[0].to_string(), Pose::from_row(&row))
                .is_some()
            {
                return Err(EstimatorError::ParseError(format!(
                    "line {}: duplicate prediction for {}",
                    line_no + 1,
                    fields[0]
                )));
            }
        }

        info!(
            "Loaded {} recorded predictions from {}",
            predictions.len(),
            path.display()
        );
        Ok(ReplayEstimator::new(predictions))
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl PoseEstimator for ReplayEstimator {
    fn estimate(
        &mut self,
        sample: &LabeledSample,
        _normalization: &InputNormalization,
    ) -> Result<Pose, EstimatorError> {
        if let Some(pose) = self.predictions.get(&sample.image) {
            return Ok(pose.clone());
        }

        let name = sample.file_name();
        let pose = self
            .predictions
            .get(&name)
            .cloned()
            .ok_or_else(|| EstimatorError::MissingPrediction(sample.image.clone()))?;
        match self.claimed.get(&name) {
            Some(owner) if owner != &sample.image => {
                Err(EstimatorError::AmbiguousPrediction(format!(
                    "{name} matches both {owner} and {}",
                    sample.image
                )))
            }
            Some(_) => Ok(pose),
            None => {
                debug!("Matched {} by file name {name}", sample.image);
                self.claimed.insert(name, sample.image.clone());
                Ok(pose)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use approx::assert_relative_eq;
    use std::io::Write;

    const POSE_HEADER: &str = "Localization Data V1\nImageFile, Camera Position [X Y Z W P Q R]\n";
    const DATASET_HEADER: &str =
        "Visual Landmark Dataset V1\nImageFile, Beacons, Camera Position [X Y Z W P Q R]\n";

    fn write_file(dir: &Path, name: &str, header: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{header}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        path
    }

    #[test]
    fn test_replay_matches_dataset() {
        let dataset = Dataset::load(Path::new("samples/dataset_test.txt")).unwrap();
        let mut estimator = ReplayEstimator::load(Path::new("samples/predictions_test.txt")).unwrap();
        assert_eq!(estimator.len(), 3);

        let norm = InputNormalization::default();
        let predicted = estimator.estimate(&dataset.samples()[0], &norm).unwrap();
        assert_relative_eq!(predicted.position.x, 1.0);
        // kept raw, not normalized
        assert_relative_eq!(predicted.orientation.w, 0.7071);
    }

    #[test]
    fn test_replay_missing_prediction() {
        let dataset = Dataset::load(Path::new("samples/dataset_test.txt")).unwrap();
        let mut estimator = ReplayEstimator::default();
        assert!(estimator.is_empty());
        let result = estimator.estimate(&dataset.samples()[1], &InputNormalization::default());
        assert!(matches!(result, Err(EstimatorError::MissingPrediction(name)) if name == "seq1/frame00002.png"));
    }

    #[test]
    fn test_replay_rejects_malformed_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{POSE_HEADER}").unwrap();
        writeln!(file, "a.png 1 2 3").unwrap();
        let result = ReplayEstimator::load(file.path());
        assert!(matches!(result, Err(EstimatorError::ParseError(_))));
    }

    #[test]
    fn test_replay_same_name_in_two_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = write_file(
            dir.path(),
            "dataset.txt",
            DATASET_HEADER,
            &[
                "seq1/frame00001.png b0:-70 0 0 0 1 0 0 0",
                "seq2/frame00001.png b0:-70 5 0 0 1 0 0 0",
            ],
        );
        let predictions_path = write_file(
            dir.path(),
            "predictions.txt",
            POSE_HEADER,
            &[
                "seq1/frame00001.png 0 0 0 1 0 0 0",
                "seq2/frame00001.png 5 0 0 1 0 0 0",
            ],
        );

        let dataset = Dataset::load(&dataset_path).unwrap();
        let mut estimator = ReplayEstimator::load(&predictions_path).unwrap();
        assert_eq!(estimator.len(), 2);

        let norm = InputNormalization::default();
        for sample in dataset.iter() {
            let predicted = estimator.estimate(sample, &norm).unwrap();
            assert_relative_eq!(predicted.position.x, sample.ground_truth.position.x);
        }
    }

    #[test]
    fn test_replay_rejects_duplicate_identifier() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{POSE_HEADER}").unwrap();
        writeln!(file, "seq1/a.png 0 0 0 1 0 0 0").unwrap();
        writeln!(file, "seq1/a.png 1 0 0 1 0 0 0").unwrap();
        let result = ReplayEstimator::load(file.path());
        assert!(matches!(result, Err(EstimatorError::ParseError(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_replay_bare_name_shared_by_two_samples() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = write_file(
            dir.path(),
            "dataset.txt",
            DATASET_HEADER,
            &[
                "seq1/frame00001.png b0:-70 0 0 0 1 0 0 0",
                "seq2/frame00001.png b0:-70 5 0 0 1 0 0 0",
            ],
        );
        let predictions_path = write_file(
            dir.path(),
            "predictions.txt",
            POSE_HEADER,
            &["frame00001.png 0 0 0 1 0 0 0"],
        );

        let dataset = Dataset::load(&dataset_path).unwrap();
        let mut estimator = ReplayEstimator::load(&predictions_path).unwrap();
        let norm = InputNormalization::default();

        assert!(estimator.estimate(&dataset.samples()[0], &norm).is_ok());
        // same sample again is fine
        assert!(estimator.estimate(&dataset.samples()[0], &norm).is_ok());
        let result = estimator.estimate(&dataset.samples()[1], &norm);
        assert!(matches!(result, Err(EstimatorError::AmbiguousPrediction(_))));
    }
}
