//! The `evaluation` module drives a full evaluation run.
//!
//! A run is strictly sequential: every sample of the [`Dataset`] is sent to
//! the [`PoseEstimator`] in file order, its error is computed with
//! [`compute_pose_error`] and fed to a [`ResultAggregator`]. Once every sample
//! is processed the aggregator is finalized and the [`ReportExporter`] writes
//! the output artifacts.

use log::info;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::dataset::{Dataset, DatasetError};
use crate::estimator::{EstimatorError, InputNormalization, PoseEstimator, ReplayEstimator};
use crate::metrics::{
    compute_pose_error, AggregateReport, ErrorRecord, MetricsError, ResultAggregator,
};
use crate::pose::{Pose, PoseError};
use crate::report::{OutputPaths, ReportError, ReportExporter};

pub mod config;

pub use config::EvaluationConfig;

#[derive(thiserror::Error, Debug)]
pub enum EvaluationError {
    #[error("Dataset contains no samples")]
    EmptyDataset,
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("Dataset error: {0}")]
    DatasetError(String),
    #[error("Estimator error: {0}")]
    EstimatorError(String),
    #[error("Pose error: {0}")]
    PoseError(String),
    #[error("Report error: {0}")]
    ReportError(String),
}

impl From<DatasetError> for EvaluationError {
    fn from(err: DatasetError) -> Self {
        EvaluationError::DatasetError(err.to_string())
    }
}

impl From<EstimatorError> for EvaluationError {
    fn from(err: EstimatorError) -> Self {
        EvaluationError::EstimatorError(err.to_string())
    }
}

impl From<PoseError> for EvaluationError {
    fn from(err: PoseError) -> Self {
        EvaluationError::PoseError(err.to_string())
    }
}

impl From<MetricsError> for EvaluationError {
    fn from(err: MetricsError) -> Self {
        match err {
            MetricsError::NoSamples => EvaluationError::EmptyDataset,
        }
    }
}

impl From<ReportError> for EvaluationError {
    fn from(err: ReportError) -> Self {
        EvaluationError::ReportError(err.to_string())
    }
}

/// A dataset sample together with its prediction and error.
#[derive(Debug, Clone)]
pub struct EvaluatedSample {
    /// Image file name, without directories.
    pub image: String,
    pub beacon: String,
    pub ground_truth: Pose,
    /// Raw estimator output.
    pub predicted: Pose,
    pub error: ErrorRecord,
    /// Wall-clock time spent in the estimator.
    pub elapsed: Duration,
}

/// Per-sample results and their summary.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub samples: Vec<EvaluatedSample>,
    pub report: AggregateReport,
}

/// Runs an estimator over a dataset.
pub struct Evaluator<E: PoseEstimator> {
    estimator: E,
    normalization: InputNormalization,
}

impl<E: PoseEstimator> Evaluator<E> {
    pub fn new(estimator: E, normalization: InputNormalization) -> Self {
        Evaluator {
            estimator,
            normalization,
        }
    }

    /// Evaluates every sample in dataset order.
    ///
    /// # Errors
    ///
    /// Any estimator or pose error aborts the run. An empty dataset yields
    /// [`EvaluationError::EmptyDataset`].
    pub fn run(&mut self, dataset: &Dataset) -> Result<EvaluationOutcome, EvaluationError> {
        let mut aggregator = ResultAggregator::new();
        let mut samples = Vec::with_capacity(dataset.len());

        for (idx, sample) in dataset.iter().enumerate() {
            let start = Instant::now();
            let predicted = self.estimator.estimate(sample, &self.normalization)?;
            let elapsed = start.elapsed();

            let error = compute_pose_error(&sample.ground_truth, &predicted)?;
            info!(
                "Index={}, Pos Error(m)={}, Rot Error(degrees)={}",
                idx, error.position_error, error.rotation_error_degrees
            );

            aggregator.accumulate(error);
            aggregator.record_latency(elapsed);
            samples.push(EvaluatedSample {
                image: sample.file_name(),
                beacon: sample.beacon.clone(),
                ground_truth: sample.ground_truth.clone(),
                predicted,
                error,
                elapsed,
            });
        }

        let report = aggregator.finalize()?;
        info!(
            "Mean error {} m and {} degrees",
            report.position.mean, report.rotation.mean
        );
        info!(
            "Median error {} m and {} degrees",
            report.position.median, report.rotation.median
        );

        Ok(EvaluationOutcome { samples, report })
    }

    pub fn normalization(&self) -> &InputNormalization {
        &self.normalization
    }
}

/// Runs a whole evaluation from a configuration: loads the dataset and the
/// recorded predictions, evaluates, and writes every report.
///
/// # Returns
///
/// * `Result<(EvaluationOutcome, OutputPaths), EvaluationError>` - Results and the written files
pub fn evaluate(
    config: &EvaluationConfig,
) -> Result<(EvaluationOutcome, OutputPaths), EvaluationError> {
    info!("Dataset: {}", config.dataset_path.display());
    info!("Beacon setting: {}", config.beacon_setting_path.display());
    info!("Model: {}", config.model_path.display());
    info!("Result directory: {}", config.output_dir.display());

    let normalization = config.normalization()?;
    let dataset = Dataset::load(&config.dataset_path)?;
    let estimator = ReplayEstimator::load(&config.model_path)?;

    let mut evaluator = Evaluator::new(estimator, normalization);
    let outcome = evaluator.run(&dataset)?;

    let exporter = ReportExporter::new(Path::new(&config.output_dir))?;
    let paths = exporter.write_all(&outcome.samples, &outcome.report)?;

    Ok((outcome, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabeledSample;
    use approx::assert_relative_eq;
    use nalgebra::{Quaternion, Vector3};
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct FixedEstimator {
        pose: Pose,
        calls: usize,
    }

    impl PoseEstimator for FixedEstimator {
        fn estimate(
            &mut self,
            _sample: &LabeledSample,
            _normalization: &InputNormalization,
        ) -> Result<Pose, EstimatorError> {
            self.calls += 1;
            Ok(self.pose.clone())
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::load(Path::new("samples/dataset_test.txt")).unwrap()
    }

    #[test]
    fn test_run_with_replayed_predictions() {
        let estimator = ReplayEstimator::load(Path::new("samples/predictions_test.txt")).unwrap();
        let mut evaluator = Evaluator::new(estimator, InputNormalization::default());
        let outcome = evaluator.run(&sample_dataset()).unwrap();

        assert_eq!(outcome.samples.len(), 3);
        let first = &outcome.samples[0];
        assert_eq!(first.image, "frame00001.png");
        assert_relative_eq!(first.error.position_error, 1.0);
        assert_relative_eq!(first.error.rotation_error_degrees, 90.0, epsilon = 1e-6);

        // opposite hemisphere, same rotation
        let second = &outcome.samples[1];
        assert_relative_eq!(second.error.position_error, 0.015, epsilon = 1e-9);
        assert_relative_eq!(second.error.rotation_error_degrees, 0.0, epsilon = 1e-4);

        let report = &outcome.report;
        assert_eq!(report.sample_count, 3);
        assert_eq!(report.histogram.counts[1], 1);
        assert_eq!(report.histogram.counts[100], 1);
        assert_eq!(report.histogram.exceeding(), 1);
        assert!(report.timing.is_some());
    }

    #[test]
    fn test_run_calls_estimator_in_order() {
        let pose = Pose::new(Vector3::zeros(), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let mut evaluator = Evaluator::new(
            FixedEstimator { pose, calls: 0 },
            InputNormalization::default(),
        );
        let outcome = evaluator.run(&sample_dataset()).unwrap();
        assert_eq!(evaluator.estimator.calls, 3);
        let images: Vec<&str> = outcome.samples.iter().map(|s| s.image.as_str()).collect();
        assert_eq!(images, ["frame00001.png", "frame00002.png", "frame00003.png"]);
        assert_relative_eq!(outcome.samples[2].error.position_error, 12.0);
    }

    #[test]
    fn test_run_empty_dataset() {
        let mut evaluator = Evaluator::new(ReplayEstimator::default(), InputNormalization::default());
        let result = evaluator.run(&Dataset::new(vec![]));
        assert!(matches!(result, Err(EvaluationError::EmptyDataset)));
    }

    #[test]
    fn test_run_missing_prediction_is_fatal() {
        let mut evaluator = Evaluator::new(
            ReplayEstimator::new(HashMap::new()),
            InputNormalization::default(),
        );
        let result = evaluator.run(&sample_dataset());
        assert!(matches!(result, Err(EvaluationError::EstimatorError(_))));
    }

    #[test]
    fn test_run_same_frame_name_in_two_sequences() {
        let at = |x: f64| Pose::new(Vector3::new(x, 0.0, 0.0), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let labeled = |image: &str, x: f64| LabeledSample {
            image: image.to_string(),
            image_path: PathBuf::from(image),
            beacon: "b0:-70".to_string(),
            ground_truth: at(x),
        };
        let dataset = Dataset::new(vec![
            labeled("seq1/frame00001.png", 0.0),
            labeled("seq2/frame00001.png", 5.0),
        ]);
        let predictions = HashMap::from([
            ("seq1/frame00001.png".to_string(), at(0.0)),
            ("seq2/frame00001.png".to_string(), at(5.0)),
        ]);

        let mut evaluator =
            Evaluator::new(ReplayEstimator::new(predictions), InputNormalization::default());
        let outcome = evaluator.run(&dataset).unwrap();
        assert_relative_eq!(outcome.samples[0].error.position_error, 0.0);
        assert_relative_eq!(outcome.samples[1].error.position_error, 0.0);
        assert_relative_eq!(outcome.report.position.max, 0.0);
    }

    #[test]
    fn test_run_degenerate_prediction_is_fatal() {
        let pose = Pose::new(Vector3::zeros(), Quaternion::new(0.0, 0.0, 0.0, 0.0));
        let mut evaluator = Evaluator::new(
            FixedEstimator { pose, calls: 0 },
            InputNormalization::default(),
        );
        let result = evaluator.run(&sample_dataset());
        assert!(matches!(result, Err(EvaluationError::PoseError(_))));
    }

    #[test]
    fn test_evaluate_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvaluationConfig {
            dataset_path: PathBuf::from("samples/dataset_test.txt"),
            beacon_setting_path: PathBuf::from("samples/beacon_setting.txt"),
            model_path: PathBuf::from("samples/predictions_test.txt"),
            output_dir: dir.path().join("results"),
            use_fixed_input_mean_std: true,
        };
        let (outcome, paths) = evaluate(&config).unwrap();
        assert_eq!(outcome.report.sample_count, 3);
        for path in paths.all() {
            assert!(path.exists(), "{} was not written", path.display());
        }
    }
}
