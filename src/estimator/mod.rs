//! The `estimator` module is the seam between the evaluator and the network
//! that actually regresses poses.
//!
//! The evaluator only needs something implementing [`PoseEstimator`]: given a
//! labeled sample and the input normalization constants, return a predicted
//! [`Pose`]. The evaluator measures the wall-clock time of every call.
//!
//! Provided here:
//! - [`ReplayEstimator`], which serves predictions recorded by an external
//!   inference run.
//! - [`InputNormalization`], the mean/std constants applied to network inputs.
//! - [`preprocess::prepare_image`], the image pipeline a network-backed
//!   estimator feeds its model with.

use crate::dataset::LabeledSample;
use crate::pose::{Pose, PoseError};

pub mod normalization;
pub mod preprocess;
pub mod replay;

pub use normalization::{DatasetNormalization, FixedNormalization, InputNormalization};
pub use preprocess::{prepare_image, ImageTensor};
pub use replay::ReplayEstimator;

#[derive(thiserror::Error, Debug)]
pub enum EstimatorError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to parse: {0}")]
    ParseError(String),
    #[error("No prediction for image {0}")]
    MissingPrediction(String),
    #[error("Ambiguous prediction: {0}")]
    AmbiguousPrediction(String),
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl From<std::io::Error> for EstimatorError {
    fn from(err: std::io::Error) -> Self {
        EstimatorError::IOError(err.to_string())
    }
}

impl From<image::ImageError> for EstimatorError {
    fn from(err: image::ImageError) -> Self {
        EstimatorError::ImageError(err.to_string())
    }
}

impl From<serde_yaml::Error> for EstimatorError {
    fn from(err: serde_yaml::Error) -> Self {
        EstimatorError::ParseError(err.to_string())
    }
}

impl From<PoseError> for EstimatorError {
    fn from(err: PoseError) -> Self {
        EstimatorError::InvalidParams(err.to_string())
    }
}

/// Produces a predicted pose for a labeled sample.
///
/// Implementations wrap whatever inference runtime serves the model. They
/// receive the normalization constants explicitly so that the same estimator
/// can be driven with fixed or dataset-derived statistics. A network-backed
/// implementation builds its inputs with [`prepare_image`] and
/// [`InputNormalization::apply_beacon`].
pub trait PoseEstimator {
    /// Predicts the pose of one sample.
    ///
    /// # Arguments
    ///
    /// * `sample` - The labeled sample; only its image and beacon fields should be used
    /// * `normalization` - Input mean/std constants
    ///
    /// # Returns
    ///
    /// * `Ok(Pose)` - Raw predicted pose; the quaternion need not be unit length
    /// * `Err(EstimatorError)` - If inference failed
    fn estimate(
        &mut self,
        sample: &LabeledSample,
        normalization: &InputNormalization,
    ) -> Result<Pose, EstimatorError>;
}
