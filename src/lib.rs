//! PoseNet Evaluation Library
//!
//! Evaluates an image+beacon pose regression network against a labeled
//! dataset. The library provides:
//! - Pose representation and quaternion canonicalization
//! - Position and geodesic rotation error metrics
//! - Aggregation into statistics, percentiles and an error histogram
//! - Export of localization results and summary reports
//!
//! The network itself is reached through the [`estimator::PoseEstimator`]
//! trait; [`estimator::ReplayEstimator`] serves predictions recorded by an
//! external inference run.

pub mod dataset;
pub mod estimator;
pub mod evaluation;
pub mod metrics;
pub mod pose;
pub mod report;

// Re-export commonly used types
pub use dataset::{Dataset, DatasetError, LabeledSample};

pub use estimator::{EstimatorError, InputNormalization, PoseEstimator, ReplayEstimator};

pub use evaluation::{
    evaluate, EvaluatedSample, EvaluationConfig, EvaluationError, EvaluationOutcome, Evaluator,
};

pub use metrics::{
    compute_pose_error, AggregateReport, ErrorHistogram, ErrorRecord, ErrorStatistics,
    ResultAggregator,
};

pub use pose::{normalize_quaternion, Pose, PoseError};

pub use report::{OutputPaths, ReportError, ReportExporter};
