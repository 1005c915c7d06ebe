//! Error metrics for pose regression.
//!
//! This module turns a ground-truth/predicted [`Pose`] pair into an
//! [`ErrorRecord`] (position error in meters, geodesic rotation error in
//! degrees) and provides the summary statistics used by the aggregator and the
//! reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pose::{Pose, PoseError};

pub mod aggregator;
pub mod histogram;

pub use aggregator::{AggregateReport, ResultAggregator, TimingStatistics};
pub use histogram::ErrorHistogram;

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("No samples were accumulated")]
    NoSamples,
}

/// Per-sample localization error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Euclidean distance between the positions, in meters.
    pub position_error: f64,
    /// Geodesic angle between the orientations, in degrees, within `[0, 180]`.
    pub rotation_error_degrees: f64,
}

/// Computes the position and rotation error between two poses.
///
/// Both quaternions are renormalized before the comparison since network
/// outputs are rarely unit length. The absolute value of the dot product is
/// used, so `q` and `-q` compare as identical rotations, and it is clamped to
/// `[-1, 1]` to keep `acos` in its domain.
///
/// # Arguments
///
/// * `ground_truth` - Labeled pose
/// * `predicted` - Pose returned by the estimator
///
/// # Returns
///
/// * `Result<ErrorRecord, PoseError>` - Position error in meters and rotation error in degrees
///
/// # Errors
///
/// * [`PoseError::InvalidPose`] - if either quaternion has a zero or non-finite norm
pub fn compute_pose_error(ground_truth: &Pose, predicted: &Pose) -> Result<ErrorRecord, PoseError> {
    let gt_norm = ground_truth.orientation.norm();
    let pred_norm = predicted.orientation.norm();
    if gt_norm == 0.0 || !gt_norm.is_finite() {
        return Err(PoseError::InvalidPose(format!(
            "ground-truth quaternion has norm {gt_norm}"
        )));
    }
    if pred_norm == 0.0 || !pred_norm.is_finite() {
        return Err(PoseError::InvalidPose(format!(
            "predicted quaternion has norm {pred_norm}"
        )));
    }

    let q1 = ground_truth.orientation.coords / gt_norm;
    let q2 = predicted.orientation.coords / pred_norm;
    let d = q1.dot(&q2).abs().clamp(-1.0, 1.0);
    let rotation_error_degrees = 2.0 * d.acos().to_degrees();

    let position_error = (ground_truth.position - predicted.position).norm();

    Ok(ErrorRecord {
        position_error,
        rotation_error_degrees,
    })
}

/// Summary statistics of one error dimension.
#[derive(Clone, Serialize, Deserialize)]
pub struct ErrorStatistics {
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub max: f64,
    pub percentile_80: f64,
    pub percentile_90: f64,
    pub percentile_95: f64,
}

impl fmt::Debug for ErrorStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error Statistics [ mean: {}, stddev: {}, median: {}, max: {}, p80: {}, p90: {}, p95: {} ]",
            self.mean,
            self.stddev,
            self.median,
            self.max,
            self.percentile_80,
            self.percentile_90,
            self.percentile_95
        )
    }
}

impl ErrorStatistics {
    /// Computes the statistics of `values`, or `None` when it is empty.
    ///
    /// The standard deviation is the population one and percentiles use linear
    /// interpolation between the closest ranks.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let (mean, stddev) = mean_and_stddev(values);
        let sorted = sorted_copy(values);
        let max = sorted[sorted.len() - 1];

        Some(ErrorStatistics {
            mean,
            stddev,
            median: percentile(&sorted, 50.0),
            max,
            percentile_80: percentile(&sorted, 80.0),
            percentile_90: percentile(&sorted, 90.0),
            percentile_95: percentile(&sorted, 95.0),
        })
    }
}

/// Mean and population standard deviation. `values` must not be empty.
pub(crate) fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Linear-interpolation percentile of an already sorted, non-empty slice.
///
/// # Arguments
///
/// * `sorted` - Values in ascending order
/// * `pct` - Percentile in `[0, 100]`
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;
    let lower = sorted[lower_idx];
    let upper = sorted[upper_idx];
    let fraction = rank - lower_idx as f64;
    (lower + (upper - lower) * fraction).min(upper)
}
